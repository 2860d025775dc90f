//! Paths command handler.
//!
//! Displays resolved locations and effective settings in `key = value`
//! format, for diagnosing configuration issues.

use anyhow::Result;
use mcpman_core::{config_json_path, servers_dir};

use crate::bootstrap::CliContext;

/// Execute the paths command.
pub fn execute(ctx: &CliContext) -> Result<()> {
    let root = ctx.cache_root();
    let settings = ctx.settings();

    println!("cache_root = {}", root.display());
    println!("servers_dir = {}", servers_dir(root).display());
    println!("config_json = {}", config_json_path(root).display());
    println!(
        "registry_capacity = {}",
        settings.effective_registry_capacity()
    );
    println!(
        "session_timeout_secs = {}",
        settings.effective_session_timeout().as_secs()
    );
    match settings.admission_wait() {
        Some(wait) => println!("admission = wait {}ms", wait.as_millis()),
        None => println!("admission = fail-fast"),
    }
    Ok(())
}

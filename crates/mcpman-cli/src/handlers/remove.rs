//! Remove command handler.

use anyhow::Result;
use mcpman_mcp::RegistryError;

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Execute the remove command.
///
/// Deletes the record and its cached executable, then drops the server from
/// the registry of this process.
pub async fn execute(ctx: &CliContext, name: &str) -> Result<()> {
    ctx.wait_for_load().await;

    let record = ctx
        .installer()
        .uninstall(name)
        .await
        .map_err(CliError::from)?;

    match ctx.mcp().registry().remove(name).await {
        Ok(_) | Err(RegistryError::NotFound(_)) => {}
        Err(e) => tracing::debug!(server_name = %name, error = %e, "Registry entry not removed"),
    }

    println!("Removed '{}'.", record.name);
    Ok(())
}

//! List command handler.
//!
//! Displays every server in the registry in a formatted table.

use anyhow::Result;

use crate::bootstrap::CliContext;
use crate::presentation::{format_optional, print_separator, truncate_string};

/// Execute the list command.
pub async fn execute(ctx: &CliContext) -> Result<()> {
    let summary = ctx.wait_for_load().await.unwrap_or_default();
    let servers = ctx.mcp().servers().await;

    if servers.is_empty() {
        println!("No servers installed.");
        println!("Use 'mcpman install <path>' to add your first server.");
        return Ok(());
    }

    println!("Found {} server(s):\n", servers.len());
    println!(
        "{:<20} {:<6} {:<10} {:<10} Path",
        "Name", "Type", "Version", "Status"
    );
    print_separator(90);

    for server in &servers {
        let record = &server.record;
        let version = (!record.version.is_empty()).then_some(&record.version);
        println!(
            "{:<20} {:<6} {:<10} {:<10} {}",
            truncate_string(&record.name, 19),
            record.server_type,
            truncate_string(&format_optional(version, "--"), 9),
            server.status,
            record.path
        );
    }

    if summary.skipped > 0 {
        println!(
            "\n{} persisted server(s) were not loaded (duplicate name or registry full).",
            summary.skipped
        );
    }

    Ok(())
}

//! Capability command handlers: `tools`, `prompts` and `resources`.
//!
//! Each command runs one session against the named server and prints what
//! it declares.

use anyhow::Result;
use mcpman_mcp::{Capabilities, QueryKind};

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::presentation::{format_optional, print_separator, truncate_string};

/// Execute a capability query against an installed server.
pub async fn execute(ctx: &CliContext, kind: QueryKind, name: &str, json: bool) -> Result<()> {
    // Lookups before the loader finishes would report "not installed"
    ctx.wait_for_load().await;

    let record = ctx
        .mcp()
        .registry()
        .lookup(name)
        .await
        .map(|tracked| tracked.record)
        .ok_or_else(|| CliError::from(mcpman_mcp::OrchestratorError::NotFound(name.to_string())))?;

    let capabilities = ctx
        .mcp()
        .get_capabilities(&record, kind)
        .await
        .map_err(CliError::from)?;

    if json {
        let value = match &capabilities {
            Capabilities::Tools(items) => serde_json::to_string_pretty(items)?,
            Capabilities::Prompts(items) => serde_json::to_string_pretty(items)?,
            Capabilities::Resources(items) => serde_json::to_string_pretty(items)?,
        };
        println!("{value}");
        return Ok(());
    }

    if capabilities.is_empty() {
        println!("'{name}' exposes no {kind}.");
        return Ok(());
    }

    println!("'{name}' exposes {} {kind}:\n", capabilities.len());
    print_table(&capabilities);
    Ok(())
}

fn print_table(capabilities: &Capabilities) {
    match capabilities {
        Capabilities::Tools(tools) => {
            println!("{:<30} Description", "Name");
            print_separator(90);
            for tool in tools {
                println!(
                    "{:<30} {}",
                    truncate_string(&tool.name, 29),
                    truncate_string(&format_optional(tool.description.as_ref(), "--"), 59)
                );
            }
        }
        Capabilities::Prompts(prompts) => {
            println!("{:<30} {:<24} Description", "Name", "Arguments");
            print_separator(90);
            for prompt in prompts {
                let args: Vec<String> = prompt
                    .arguments
                    .iter()
                    .map(|arg| {
                        if arg.required {
                            arg.name.clone()
                        } else {
                            format!("[{}]", arg.name)
                        }
                    })
                    .collect();
                println!(
                    "{:<30} {:<24} {}",
                    truncate_string(&prompt.name, 29),
                    truncate_string(&args.join(", "), 23),
                    truncate_string(&format_optional(prompt.description.as_ref(), "--"), 35)
                );
            }
        }
        Capabilities::Resources(resources) => {
            println!("{:<40} {:<24} MIME type", "URI", "Name");
            print_separator(90);
            for resource in resources {
                println!(
                    "{:<40} {:<24} {}",
                    truncate_string(&resource.uri, 39),
                    truncate_string(&resource.name, 23),
                    format_optional(resource.mime_type.as_ref(), "--")
                );
            }
        }
    }
}

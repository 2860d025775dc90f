//! Main CLI parser and top-level argument handling.

use clap::Parser;

use crate::commands::Commands;

/// Command-line interface for managing local MCP tool servers.
#[derive(Parser)]
#[command(name = "mcpman")]
#[command(about = "Install local MCP servers and inspect their tools, prompts and resources")]
#[command(version)]
pub struct Cli {
    /// Override the cache directory for this invocation
    #[arg(long = "cache-dir", global = true)]
    pub cache_dir: Option<String>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

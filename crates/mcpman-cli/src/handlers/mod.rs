//! Command handlers.
//!
//! Handlers follow one pattern:
//! - Signature: `pub async fn execute(ctx: &CliContext, ...) -> Result<()>`
//! - Thin wrappers that validate CLI input, call the store, installer or
//!   `McpService`, and format output for the terminal
//! - Library errors are converted to `CliError` so `main` can pick the exit code

pub mod capabilities;
pub mod install;
pub mod list;
pub mod paths;
pub mod remove;

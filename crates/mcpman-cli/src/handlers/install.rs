//! Install command handler.

use anyhow::Result;

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Execute the install command.
///
/// Every source is attempted; failures are reported and the command fails
/// after the last one.
pub async fn execute(ctx: &CliContext, sources: &[String]) -> Result<()> {
    let mut last_error = None;
    let mut installed = 0usize;

    for source in sources {
        match ctx.installer().install(source).await {
            Ok(record) => {
                installed += 1;
                println!("Installed '{}' -> {}", record.name, record.path);
            }
            Err(e) => {
                eprintln!("Failed to install {source}: {e}");
                last_error = Some(CliError::from(e));
            }
        }
    }

    if sources.len() > 1 {
        println!("{installed} of {} server(s) installed.", sources.len());
    }

    match last_error {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}

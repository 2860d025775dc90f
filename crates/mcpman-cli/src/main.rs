//! CLI entry point.
//!
//! Parses arguments, sets up logging, composes the context through
//! `bootstrap`, and routes each command to its handler. Errors become a
//! message on stderr and a sysexits-style exit code.

use std::process::ExitCode;

use clap::{CommandFactory, Parser};

use mcpman_cli::{Cli, CliConfig, CliError, Commands, bootstrap, handlers, logging};
use mcpman_mcp::QueryKind;

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables before settings are read
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    logging::init(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            let code = err.downcast_ref::<CliError>().map_or(1, CliError::exit_code);
            ExitCode::from(code)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let Some(command) = cli.command else {
        // No command provided - show help
        Cli::command().print_help()?;
        return Ok(());
    };

    let config = CliConfig::from_env()?.with_cache_dir(cli.cache_dir);
    let ctx = bootstrap(config)?;

    match command {
        Commands::Install { sources } => {
            handlers::install::execute(&ctx, &sources).await?;
        }
        Commands::List => {
            handlers::list::execute(&ctx).await?;
        }
        Commands::Remove { name } => {
            handlers::remove::execute(&ctx, &name).await?;
        }
        Commands::Tools { name, json } => {
            handlers::capabilities::execute(&ctx, QueryKind::Tools, &name, json).await?;
        }
        Commands::Prompts { name, json } => {
            handlers::capabilities::execute(&ctx, QueryKind::Prompts, &name, json).await?;
        }
        Commands::Resources { name, json } => {
            handlers::capabilities::execute(&ctx, QueryKind::Resources, &name, json).await?;
        }
        Commands::Paths => {
            handlers::paths::execute(&ctx)?;
        }
    }

    Ok(())
}

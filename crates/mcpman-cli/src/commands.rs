//! Subcommand definitions.

use clap::Subcommand;

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install one or more local server executables
    #[command(
        after_help = "EXAMPLES:\n    mcpman install ./fetch\n    mcpman install /opt/servers/git file:///opt/servers/time"
    )]
    Install {
        /// Paths (absolute, relative or file://) of executables to install
        #[arg(required = true)]
        sources: Vec<String>,
    },

    /// List installed servers and their status
    #[command(name = "ls", alias = "list")]
    List,

    /// Uninstall a server
    #[command(name = "rm", alias = "remove")]
    Remove {
        /// Name of the server to remove
        name: String,
    },

    /// List the tools a server exposes
    Tools {
        /// Name of the installed server
        name: String,
        /// Print raw descriptors as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the prompts a server exposes
    Prompts {
        /// Name of the installed server
        name: String,
        /// Print raw descriptors as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the resources a server exposes
    Resources {
        /// Name of the installed server
        name: String,
        /// Print raw descriptors as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show resolved paths and effective settings
    Paths,
}

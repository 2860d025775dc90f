//! CLI-specific error types and mappings.
//!
//! Library errors are mapped to `CliError`, which carries a sysexits-style
//! exit code and a user-facing message.

use mcpman_core::{PathError, SettingsError, StoreError};
use mcpman_mcp::{OrchestratorError, error_chain};
use mcpman_store::InstallError;
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Argument could not be used.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// Server or file does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Source cannot be installed.
    #[error("{0}")]
    Install(String),

    /// Server failed to start, handshake or answer.
    #[error("{0}")]
    Server(String),

    /// Session deadline expired.
    #[error("{0}")]
    Timeout(String),

    /// Store could not be read or written.
    #[error("Store error: {0}")]
    Store(String),

    /// IO error (permission denied, disk full, etc.).
    #[error("IO error: {0}")]
    Io(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CliError {
    /// Map error to an exit code.
    ///
    /// Exit codes follow Unix conventions:
    /// - 2: Misuse of shell command (invalid arguments)
    /// - 64-78: Specific error categories (see sysexits.h)
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Arguments(_) => 2,
            Self::Install(_) => 65,  // EX_DATAERR
            Self::NotFound(_) => 66, // EX_NOINPUT
            Self::Server(_) => 69,   // EX_UNAVAILABLE
            Self::Store(_) => 73,    // EX_CANTCREAT
            Self::Io(_) => 74,       // EX_IOERR
            Self::Timeout(_) => 75,  // EX_TEMPFAIL
            Self::Config(_) => 78,   // EX_CONFIG
        }
    }
}

impl From<OrchestratorError> for CliError {
    fn from(err: OrchestratorError) -> Self {
        match err {
            OrchestratorError::NotFound(name) => Self::NotFound(format!(
                "Server '{name}' is not installed. Run 'mcpman ls' to see installed servers."
            )),
            OrchestratorError::TimedOut { .. } => Self::Timeout(error_chain(&err)),
            OrchestratorError::ConnectFailed { .. }
            | OrchestratorError::HandshakeFailed { .. }
            | OrchestratorError::QueryFailed { .. } => Self::Server(error_chain(&err)),
        }
    }
}

impl From<InstallError> for CliError {
    fn from(err: InstallError) -> Self {
        match err {
            InstallError::UnsupportedSource(_) | InstallError::InvalidName(_) => {
                Self::Arguments(err.to_string())
            }
            InstallError::NotFound(_) => Self::NotFound(err.to_string()),
            InstallError::NotExecutable(_) | InstallError::AlreadyInstalled(_) => {
                Self::Install(err.to_string())
            }
            InstallError::Path(path_err) => path_err.into(),
            InstallError::Store(store_err) => store_err.into(),
            InstallError::Io { .. } => Self::Io(error_chain(&err)),
        }
    }
}

impl From<StoreError> for CliError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(name) => Self::NotFound(format!("Server '{name}' is not installed")),
            other => Self::Store(other.to_string()),
        }
    }
}

impl From<SettingsError> for CliError {
    fn from(err: SettingsError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<PathError> for CliError {
    fn from(err: PathError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

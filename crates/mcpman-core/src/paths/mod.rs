//! Path utilities for the mcpman cache.
//!
//! ```text
//! <cache root>/
//!   mcp_servers/   installed executables
//!   config.json    persisted server records
//! ```
//!
//! # Design
//!
//! - Returns `PathBuf` and `PathError` for clear error handling
//! - No interactive/terminal I/O
//! - OS-specific logic is kept private in `platform`

mod ensure;
mod error;
mod platform;

use std::path::{Path, PathBuf};

pub use ensure::ensure_directory;
pub use error::PathError;
pub use platform::{cache_root, normalize_user_path};

/// Name of the directory holding installed executables.
pub const SERVERS_DIR_NAME: &str = "mcp_servers";

/// Name of the persisted configuration document.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Directory holding installed server executables.
pub fn servers_dir(root: &Path) -> PathBuf {
    root.join(SERVERS_DIR_NAME)
}

/// Location of `config.json`.
pub fn config_json_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE_NAME)
}

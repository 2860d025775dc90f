//! Local server installation.
//!
//! Installing copies an executable into `<cache>/mcp_servers/` and appends a
//! record for it to the store. Only local sources are accepted.

use std::ffi::{OsStr, OsString};
use std::fs::Metadata;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use mcpman_core::{
    LaunchSpec, PathError, ServerRecord, ServerStore, ServerType, StoreError, ensure_directory,
    normalize_user_path,
};
use thiserror::Error;

/// Version recorded for locally installed servers.
pub const LOCAL_INSTALL_VERSION: &str = "1.0.0";

/// Errors from installing or uninstalling a server.
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("Unsupported source '{0}': only local paths and file:// URLs can be installed")]
    UnsupportedSource(String),

    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Not an executable file: {}", .0.display())]
    NotExecutable(PathBuf),

    #[error("Cannot derive a server name from {}", .0.display())]
    InvalidName(PathBuf),

    #[error("Server '{0}' is already installed")]
    AlreadyInstalled(String),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Installs local executables into the cache and records them.
pub struct Installer {
    store: Arc<dyn ServerStore>,
    servers_dir: PathBuf,
}

impl Installer {
    pub fn new(store: Arc<dyn ServerStore>, servers_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            servers_dir: servers_dir.into(),
        }
    }

    pub fn servers_dir(&self) -> &Path {
        &self.servers_dir
    }

    /// Install the executable at `source`.
    ///
    /// `source` is an absolute or relative path, or a `file://` URL.
    pub async fn install(&self, source: &str) -> Result<ServerRecord, InstallError> {
        let source_path = resolve_source(source)?;

        let metadata = match tokio::fs::metadata(&source_path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(InstallError::NotFound(source_path));
            }
            Err(source) => {
                return Err(InstallError::Io {
                    path: source_path,
                    source,
                });
            }
        };

        if !metadata.is_file() || !is_executable(&source_path, &metadata) {
            return Err(InstallError::NotExecutable(source_path));
        }

        let (Some(file_name), Some(name)) = (
            source_path.file_name(),
            source_path.file_stem().and_then(|s| s.to_str()),
        ) else {
            return Err(InstallError::InvalidName(source_path));
        };
        if name.trim().is_empty() {
            return Err(InstallError::InvalidName(source_path));
        }

        match self.store.get_by_name(name).await {
            Ok(_) => return Err(InstallError::AlreadyInstalled(name.to_string())),
            Err(StoreError::NotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }

        ensure_directory(&self.servers_dir)?;
        let destination = self.servers_dir.join(file_name);
        // Stage under a unique name so a racing install never touches our copy
        let staging = staging_path(&self.servers_dir, file_name);
        if let Err(e) = copy_executable(&source_path, &staging).await {
            remove_quietly(&staging).await;
            return Err(e);
        }

        let destination_str = destination.to_string_lossy().into_owned();
        let record = ServerRecord::new_stdio(name, destination_str.clone())
            .with_type(ServerType::Sse)
            .with_version(LOCAL_INSTALL_VERSION)
            .with_launch(LaunchSpec::new(destination_str));

        let record = match self.store.add(record).await {
            Ok(record) => record,
            Err(e) => {
                remove_quietly(&staging).await;
                return Err(match e {
                    StoreError::Conflict(name) => InstallError::AlreadyInstalled(name),
                    other => other.into(),
                });
            }
        };

        if let Err(source) = tokio::fs::rename(&staging, &destination).await {
            remove_quietly(&staging).await;
            if let Err(e) = self.store.remove(&record.name).await {
                tracing::warn!(server_name = %record.name, error = %e, "Failed to roll back record");
            }
            return Err(InstallError::Io {
                path: destination,
                source,
            });
        }

        tracing::info!(
            server_name = %record.name,
            path = %record.path,
            "Installed server"
        );
        Ok(record)
    }

    /// Remove a server from the store, deleting its cached executable.
    ///
    /// Executables outside the servers directory are left alone.
    pub async fn uninstall(&self, name: &str) -> Result<ServerRecord, InstallError> {
        let record = self.store.remove(name).await?;

        let cached = Path::new(&record.path);
        if cached.starts_with(&self.servers_dir) {
            match tokio::fs::remove_file(cached).await {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    tracing::debug!(path = %cached.display(), "Cached executable already gone");
                }
                Err(source) => {
                    return Err(InstallError::Io {
                        path: cached.to_path_buf(),
                        source,
                    });
                }
            }
        }

        tracing::info!(server_name = %record.name, "Uninstalled server");
        Ok(record)
    }
}

/// Turn a user-provided source into an absolute local path.
fn resolve_source(source: &str) -> Result<PathBuf, InstallError> {
    let trimmed = source.trim();

    if let Some(rest) = trimmed.strip_prefix("file://") {
        return Ok(normalize_user_path(rest)?);
    }
    if trimmed.contains("://") {
        return Err(InstallError::UnsupportedSource(trimmed.to_string()));
    }

    Ok(normalize_user_path(trimmed)?)
}

#[cfg(windows)]
fn is_executable(path: &Path, _metadata: &Metadata) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("exe"))
}

#[cfg(not(windows))]
fn is_executable(path: &Path, metadata: &Metadata) -> bool {
    match path.extension().and_then(|ext| ext.to_str()) {
        None | Some("out" | "bin") => true,
        Some(_) => has_exec_bit(metadata),
    }
}

#[cfg(unix)]
fn has_exec_bit(metadata: &Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(all(not(unix), not(windows)))]
const fn has_exec_bit(_metadata: &Metadata) -> bool {
    false
}

/// Hidden per-attempt name next to the final destination.
fn staging_path(dir: &Path, file_name: &OsStr) -> PathBuf {
    static ATTEMPT: AtomicU64 = AtomicU64::new(0);
    let attempt = ATTEMPT.fetch_add(1, Ordering::Relaxed);

    let mut name = OsString::from(".");
    name.push(file_name);
    name.push(format!(".{}-{attempt}.partial", std::process::id()));
    dir.join(name)
}

async fn remove_quietly(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        tracing::warn!(path = %path.display(), error = %e, "Failed to remove staged executable");
    }
}

/// Copy `from` to `to`, making the copy executable by its owner.
async fn copy_executable(from: &Path, to: &Path) -> Result<(), InstallError> {
    tokio::fs::copy(from, to)
        .await
        .map_err(|source| InstallError::Io {
            path: to.to_path_buf(),
            source,
        })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let io_err = |source| InstallError::Io {
            path: to.to_path_buf(),
            source,
        };
        let mut permissions = tokio::fs::metadata(to).await.map_err(io_err)?.permissions();
        permissions.set_mode(permissions.mode() | 0o700);
        tokio::fs::set_permissions(to, permissions)
            .await
            .map_err(io_err)?;
    }

    Ok(())
}

//! CLI bootstrap - the composition root.
//!
//! This is the only place where concrete implementations are wired
//! together: settings and paths, the JSON store, the installer, the
//! registry-backed `McpService`, and the background loader.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use mcpman_core::{Settings, cache_root, ensure_directory, servers_dir};
use mcpman_mcp::{LoadSummary, McpService};
use mcpman_store::{Installer, JsonServerStore};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::error::CliError;

/// Bootstrap configuration for the CLI.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub settings: Settings,
}

impl CliConfig {
    /// Read settings from the environment.
    pub fn from_env() -> Result<Self, CliError> {
        Ok(Self {
            settings: Settings::from_env()?,
        })
    }

    /// Override the cache directory.
    #[must_use]
    pub fn with_cache_dir(mut self, cache_dir: Option<String>) -> Self {
        if cache_dir.is_some() {
            self.settings.cache_dir = cache_dir;
        }
        self
    }
}

/// Fully composed application context for CLI commands.
pub struct CliContext {
    settings: Settings,
    cache_root: PathBuf,
    store: Arc<JsonServerStore>,
    installer: Installer,
    mcp: Arc<McpService>,
    loader: Mutex<Option<JoinHandle<LoadSummary>>>,
}

impl CliContext {
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    pub const fn store(&self) -> &Arc<JsonServerStore> {
        &self.store
    }

    pub const fn installer(&self) -> &Installer {
        &self.installer
    }

    pub const fn mcp(&self) -> &Arc<McpService> {
        &self.mcp
    }

    /// Wait for the background loader to finish.
    ///
    /// Returns the summary the first time; later calls return `None`.
    pub async fn wait_for_load(&self) -> Option<LoadSummary> {
        let handle = self.loader.lock().await.take()?;
        match handle.await {
            Ok(summary) => Some(summary),
            Err(e) => {
                tracing::warn!(error = %e, "Server loader task failed");
                None
            }
        }
    }
}

/// Bootstrap the CLI application.
///
/// Must be called from within a tokio runtime: the loader is started here
/// and runs while the command is being dispatched.
pub fn bootstrap(config: CliConfig) -> Result<CliContext, CliError> {
    let settings = config.settings;
    let cache_root = cache_root(&settings)?;
    ensure_directory(&cache_root)?;

    let store = Arc::new(JsonServerStore::in_cache(&cache_root));
    let installer = Installer::new(store.clone(), servers_dir(&cache_root));
    let mcp = Arc::new(McpService::from_settings(&settings));
    let loader = mcp.load_and_run(store.clone());

    tracing::debug!(cache_root = %cache_root.display(), "CLI context ready");

    Ok(CliContext {
        settings,
        cache_root,
        store,
        installer,
        mcp,
        loader: Mutex::new(Some(loader)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcpman_core::ServerStore;
    use mcpman_core::ServerRecord;

    fn config_for(dir: &Path) -> CliConfig {
        CliConfig::default().with_cache_dir(Some(dir.to_string_lossy().into_owned()))
    }

    #[tokio::test]
    async fn test_bootstrap_creates_cache_and_loads() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("cache");

        let ctx = bootstrap(config_for(&root)).unwrap();
        assert_eq!(ctx.cache_root(), root);
        assert!(root.is_dir());

        let summary = ctx.wait_for_load().await.unwrap();
        assert_eq!(summary, LoadSummary::default());
        assert!(ctx.wait_for_load().await.is_none());
    }

    #[tokio::test]
    async fn test_loader_admits_persisted_records() {
        let dir = tempfile::tempdir().unwrap();
        JsonServerStore::in_cache(dir.path())
            .add(ServerRecord::new_stdio("fetch", "/opt/fetch"))
            .await
            .unwrap();

        let ctx = bootstrap(config_for(dir.path())).unwrap();
        assert_eq!(ctx.wait_for_load().await.unwrap().admitted, 1);
        assert!(ctx.mcp().registry().lookup("fetch").await.is_some());
    }

    #[test]
    fn test_cache_dir_override_keeps_env_value_when_absent() {
        let config = CliConfig {
            settings: Settings {
                cache_dir: Some("/from/env".to_string()),
                ..Settings::default()
            },
        };
        assert_eq!(
            config.with_cache_dir(None).settings.cache_dir.as_deref(),
            Some("/from/env")
        );
    }
}

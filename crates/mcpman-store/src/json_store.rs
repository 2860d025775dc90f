//! `config.json` implementation of the server store.
//!
//! The whole document is read on every call and rewritten on every change.
//! Writes go to `<file>.tmp` first and are renamed over the original.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use mcpman_core::{ServerConfigFile, ServerRecord, ServerStore, StoreError, config_json_path};
use tokio::sync::Mutex;

/// Server store backed by a JSON document.
#[derive(Debug)]
pub struct JsonServerStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process
    lock: Mutex<()>,
}

impl JsonServerStore {
    /// Store at an explicit file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Store at `<root>/config.json`.
    pub fn in_cache(root: &Path) -> Self {
        Self::new(config_json_path(root))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<ServerConfigFile, StoreError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "Creating empty server config");
                let empty = ServerConfigFile::default();
                self.save(&empty).await?;
                return Ok(empty);
            }
            Err(e) => return Err(self.io_error(&e)),
        };

        if content.trim().is_empty() {
            return Ok(ServerConfigFile::default());
        }

        serde_json::from_str(&content).map_err(|e| {
            StoreError::Serialization(format!("{}: {e}", self.path.display()))
        })
    }

    async fn save(&self, document: &ServerConfigFile) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(&e))?;
        }

        let json = serde_json::to_string_pretty(document)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let mut temp_name = self.path.as_os_str().to_owned();
        temp_name.push(".tmp");
        let temp_path = PathBuf::from(temp_name);

        tokio::fs::write(&temp_path, json)
            .await
            .map_err(|e| self.io_error(&e))?;
        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| self.io_error(&e))?;
        Ok(())
    }

    fn io_error(&self, err: &io::Error) -> StoreError {
        StoreError::Io(format!("{}: {err}", self.path.display()))
    }
}

#[async_trait]
impl ServerStore for JsonServerStore {
    async fn read_all(&self) -> Result<Vec<ServerRecord>, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.mcp_servers)
    }

    async fn get_by_name(&self, name: &str) -> Result<ServerRecord, StoreError> {
        let _guard = self.lock.lock().await;
        self.load()
            .await?
            .mcp_servers
            .into_iter()
            .find(|r| r.name == name)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    async fn add(&self, record: ServerRecord) -> Result<ServerRecord, StoreError> {
        let _guard = self.lock.lock().await;
        let mut document = self.load().await?;

        if document.mcp_servers.iter().any(|r| r.name == record.name) {
            return Err(StoreError::Conflict(record.name));
        }

        document.mcp_servers.push(record.clone());
        self.save(&document).await?;

        tracing::debug!(server_name = %record.name, "Saved server record");
        Ok(record)
    }

    async fn remove(&self, name: &str) -> Result<ServerRecord, StoreError> {
        let _guard = self.lock.lock().await;
        let mut document = self.load().await?;

        let index = document
            .mcp_servers
            .iter()
            .position(|r| r.name == name)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;
        let removed = document.mcp_servers.remove(index);
        self.save(&document).await?;

        tracing::debug!(server_name = %name, "Removed server record");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcpman_core::{ServerType, servers_dir};
    use std::sync::Arc;

    fn record(name: &str) -> ServerRecord {
        ServerRecord::new_stdio(name, format!("/cache/mcp_servers/{name}"))
            .with_type(ServerType::Sse)
            .with_version("1.0.0")
    }

    #[tokio::test]
    async fn test_missing_file_is_created_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonServerStore::in_cache(dir.path());

        assert!(store.read_all().await.unwrap().is_empty());
        let content = std::fs::read_to_string(store.path()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed["mcp_servers"], serde_json::json!([]));
        assert!(!servers_dir(dir.path()).exists());
    }

    #[tokio::test]
    async fn test_add_then_read_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonServerStore::in_cache(dir.path());

        store.add(record("fetch")).await.unwrap();
        store.add(record("git")).await.unwrap();

        let names: Vec<String> = store
            .read_all()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, ["fetch", "git"]);
        assert_eq!(store.get_by_name("git").await.unwrap(), record("git"));
    }

    #[tokio::test]
    async fn test_duplicate_name_conflicts() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonServerStore::in_cache(dir.path());

        store.add(record("fetch")).await.unwrap();
        let err = store.add(record("fetch")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(name) if name == "fetch"));
        assert_eq!(store.read_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonServerStore::in_cache(dir.path());
        store.add(record("fetch")).await.unwrap();

        let removed = store.remove("fetch").await.unwrap();
        assert_eq!(removed.name, "fetch");
        assert!(store.read_all().await.unwrap().is_empty());
        assert!(matches!(
            store.remove("fetch").await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_malformed_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = JsonServerStore::new(&path);
        assert!(matches!(
            store.read_all().await,
            Err(StoreError::Serialization(_))
        ));
    }

    #[tokio::test]
    async fn test_reads_existing_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"mcp_servers":[{"name":"fetch","path":"/c/fetch","type":"sse","version":"1.0.0"}]}"#,
        )
        .unwrap();

        let records = JsonServerStore::new(&path).read_all().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].program(), "/c/fetch");
    }

    #[tokio::test]
    async fn test_concurrent_adds_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JsonServerStore::in_cache(dir.path()));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.add(record(&format!("s{i}"))).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.read_all().await.unwrap().len(), 8);
    }
}

//! Bounded in-memory registry of tracked servers.
//!
//! The registry is the single owner of [`TrackedServer`] entries. Readers get
//! snapshot clones; all mutation goes through the methods here, under one
//! async `RwLock`.

use std::time::Duration;

use chrono::Utc;
use mcpman_core::{ServerRecord, ServerStatus, Settings, TrackedServer};
use thiserror::Error;
use tokio::sync::{Notify, RwLock};
use tokio::time::Instant;

/// Errors from registry operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Registry is full (capacity {capacity})")]
    Full { capacity: usize },

    #[error("Server '{0}' is already registered")]
    DuplicateName(String),

    #[error("Server '{0}' not found in registry")]
    NotFound(String),
}

/// What `admit` does when the registry is full.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AdmissionPolicy {
    /// Fail immediately with [`RegistryError::Full`].
    #[default]
    FailFast,
    /// Wait up to the given duration for a slot to be released by
    /// [`Registry::remove`], then fail with [`RegistryError::Full`].
    Wait(Duration),
}

/// Capacity-bounded registry of servers and their live status.
#[derive(Debug)]
pub struct Registry {
    capacity: usize,
    policy: AdmissionPolicy,
    entries: RwLock<Vec<TrackedServer>>,
    slot_freed: Notify,
}

impl Registry {
    /// Create an empty registry with the fail-fast policy.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            policy: AdmissionPolicy::FailFast,
            entries: RwLock::new(Vec::with_capacity(capacity)),
            slot_freed: Notify::new(),
        }
    }

    /// Set the admission policy.
    #[must_use]
    pub const fn with_policy(mut self, policy: AdmissionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Create a registry sized and configured from settings.
    pub fn from_settings(settings: &Settings) -> Self {
        let policy = settings
            .admission_wait()
            .map_or(AdmissionPolicy::FailFast, AdmissionPolicy::Wait);
        Self::new(settings.effective_registry_capacity()).with_policy(policy)
    }

    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    pub const fn policy(&self) -> AdmissionPolicy {
        self.policy
    }

    /// Admit a record with status `Loaded`.
    ///
    /// A duplicate name is rejected before capacity is considered, and the
    /// existing entry is left untouched.
    pub async fn admit(&self, record: ServerRecord) -> Result<(), RegistryError> {
        let deadline = match self.policy {
            AdmissionPolicy::FailFast => None,
            AdmissionPolicy::Wait(wait) => Some(Instant::now() + wait),
        };

        loop {
            // Register interest before checking so a concurrent remove is not missed
            let notified = self.slot_freed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut entries = self.entries.write().await;
                if entries.iter().any(|e| e.name() == record.name) {
                    return Err(RegistryError::DuplicateName(record.name));
                }
                if entries.len() < self.capacity {
                    tracing::debug!(server_name = %record.name, "Admitted server");
                    entries.push(TrackedServer::loaded(record));
                    return Ok(());
                }
            }

            let Some(deadline) = deadline else {
                return Err(RegistryError::Full {
                    capacity: self.capacity,
                });
            };

            tracing::debug!(server_name = %record.name, "Registry full, waiting for a slot");
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return Err(RegistryError::Full {
                    capacity: self.capacity,
                });
            }
        }
    }

    /// Snapshot of one entry.
    pub async fn lookup(&self, name: &str) -> Option<TrackedServer> {
        self.entries
            .read()
            .await
            .iter()
            .find(|e| e.name() == name)
            .cloned()
    }

    /// Set the status of an entry.
    ///
    /// Moving to `Starting` clears the previous session's error.
    pub async fn update_status(
        &self,
        name: &str,
        status: ServerStatus,
    ) -> Result<(), RegistryError> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .iter_mut()
            .find(|e| e.name() == name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;

        if status == ServerStatus::Starting {
            entry.last_error = None;
        }
        entry.status = status;
        entry.status_changed_at = Utc::now();
        Ok(())
    }

    /// Mark an entry `Failed` and record the error message.
    pub async fn record_failure(
        &self,
        name: &str,
        message: impl Into<String>,
    ) -> Result<(), RegistryError> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .iter_mut()
            .find(|e| e.name() == name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;

        entry.status = ServerStatus::Failed;
        entry.status_changed_at = Utc::now();
        entry.last_error = Some(message.into());
        Ok(())
    }

    /// All entries in insertion order.
    pub async fn list(&self) -> Vec<TrackedServer> {
        self.entries.read().await.clone()
    }

    /// Remove an entry, freeing its slot.
    pub async fn remove(&self, name: &str) -> Result<TrackedServer, RegistryError> {
        let removed = {
            let mut entries = self.entries.write().await;
            let index = entries
                .iter()
                .position(|e| e.name() == name)
                .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;
            entries.remove(index)
        };

        self.slot_freed.notify_waiters();
        Ok(removed)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn record(name: &str) -> ServerRecord {
        ServerRecord::new_stdio(name, format!("/opt/servers/{name}"))
    }

    async fn names(registry: &Registry) -> Vec<String> {
        registry
            .list()
            .await
            .into_iter()
            .map(|t| t.record.name)
            .collect()
    }

    #[tokio::test]
    async fn test_capacity_two_rejects_third() {
        let registry = Registry::new(2);
        registry.admit(record("a")).await.unwrap();
        registry.admit(record("b")).await.unwrap();

        let err = registry.admit(record("c")).await.unwrap_err();
        assert_eq!(err, RegistryError::Full { capacity: 2 });
        assert_eq!(registry.len().await, 2);
        assert_eq!(names(&registry).await, ["a", "b"]);
    }

    #[tokio::test]
    async fn test_fill_to_capacity_keeps_insertion_order() {
        let registry = Registry::new(20);
        let expected: Vec<String> = (0..20).map(|i| format!("server-{i:02}")).collect();
        for name in &expected {
            registry.admit(record(name)).await.unwrap();
        }
        assert_eq!(names(&registry).await, expected);
        assert!(registry.admit(record("overflow")).await.is_err());
        assert_eq!(registry.len().await, 20);
    }

    #[tokio::test]
    async fn test_duplicate_leaves_entry_untouched() {
        let registry = Registry::new(4);
        registry.admit(record("a")).await.unwrap();
        registry
            .update_status("a", ServerStatus::Running)
            .await
            .unwrap();

        let dup = record("a").with_version("9.9.9");
        let err = registry.admit(dup).await.unwrap_err();
        assert_eq!(err, RegistryError::DuplicateName("a".to_string()));

        let entry = registry.lookup("a").await.unwrap();
        assert_eq!(entry.status, ServerStatus::Running);
        assert!(entry.record.version.is_empty());
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_duplicate_checked_before_capacity() {
        let registry = Registry::new(1);
        registry.admit(record("a")).await.unwrap();
        let err = registry.admit(record("a")).await.unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateName(_)));
    }

    #[tokio::test]
    async fn test_lookup_snapshot() {
        let registry = Registry::new(2);
        assert!(registry.lookup("a").await.is_none());

        registry.admit(record("a")).await.unwrap();
        let mut snapshot = registry.lookup("a").await.unwrap();
        assert_eq!(snapshot.status, ServerStatus::Loaded);

        // Mutating the snapshot does not touch the registry
        snapshot.status = ServerStatus::Failed;
        assert_eq!(
            registry.lookup("a").await.unwrap().status,
            ServerStatus::Loaded
        );
    }

    #[tokio::test]
    async fn test_update_status_unknown_name() {
        let registry = Registry::new(2);
        let err = registry
            .update_status("ghost", ServerStatus::Running)
            .await
            .unwrap_err();
        assert_eq!(err, RegistryError::NotFound("ghost".to_string()));
    }

    #[tokio::test]
    async fn test_failure_recorded_and_cleared_on_restart() {
        let registry = Registry::new(2);
        registry.admit(record("a")).await.unwrap();
        registry.record_failure("a", "spawn failed").await.unwrap();

        let entry = registry.lookup("a").await.unwrap();
        assert_eq!(entry.status, ServerStatus::Failed);
        assert_eq!(entry.last_error.as_deref(), Some("spawn failed"));

        registry
            .update_status("a", ServerStatus::Starting)
            .await
            .unwrap();
        assert!(registry.lookup("a").await.unwrap().last_error.is_none());
    }

    #[tokio::test]
    async fn test_remove_frees_slot() {
        let registry = Registry::new(1);
        registry.admit(record("a")).await.unwrap();
        let removed = registry.remove("a").await.unwrap();
        assert_eq!(removed.record.name, "a");
        assert!(registry.is_empty().await);
        registry.admit(record("b")).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_policy_times_out() {
        let registry =
            Registry::new(1).with_policy(AdmissionPolicy::Wait(Duration::from_millis(100)));
        registry.admit(record("a")).await.unwrap();

        let err = registry.admit(record("b")).await.unwrap_err();
        assert_eq!(err, RegistryError::Full { capacity: 1 });
    }

    #[tokio::test]
    async fn test_wait_policy_admits_after_remove() {
        let registry = Arc::new(
            Registry::new(1).with_policy(AdmissionPolicy::Wait(Duration::from_secs(5))),
        );
        registry.admit(record("a")).await.unwrap();

        let waiter = {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.admit(record("b")).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        registry.remove("a").await.unwrap();

        waiter.await.unwrap().unwrap();
        assert_eq!(names(&registry).await, ["b"]);
    }

    #[test]
    fn test_from_settings() {
        let settings = Settings {
            registry_capacity: Some(3),
            admission_wait_ms: Some(50),
            ..Settings::default()
        };
        let registry = Registry::from_settings(&settings);
        assert_eq!(registry.capacity(), 3);
        assert_eq!(
            registry.policy(),
            AdmissionPolicy::Wait(Duration::from_millis(50))
        );
        assert_eq!(
            Registry::from_settings(&Settings::default()).policy(),
            AdmissionPolicy::FailFast
        );
    }
}

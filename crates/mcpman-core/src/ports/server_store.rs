//! Persisted server store trait and error types.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::ServerRecord;

/// Errors from a server store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No record with the given name.
    #[error("Server not found: {0}")]
    NotFound(String),

    /// A record with the same name already exists.
    #[error("Server already exists: {0}")]
    Conflict(String),

    /// The stored document could not be parsed or written.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Storage backend error (filesystem, etc.).
    #[error("Storage error: {0}")]
    Io(String),
}

/// Store of persisted server records.
///
/// # Design Rules
///
/// - Constraint: unique `name` across all records
/// - `read_all` returns records in stored order
/// - Records are replaced whole; there is no partial update
///
/// # Example
///
/// ```ignore
/// let record = store.add(ServerRecord::new_stdio("fetch", "/opt/fetch")).await?;
/// let all = store.read_all().await?;
/// ```
#[async_trait]
pub trait ServerStore: Send + Sync {
    /// Read every persisted record.
    ///
    /// # Errors
    ///
    /// - `Serialization` if the document is malformed
    /// - `Io` for storage errors
    async fn read_all(&self) -> Result<Vec<ServerRecord>, StoreError>;

    /// Get a record by its unique name.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no record has this name
    async fn get_by_name(&self, name: &str) -> Result<ServerRecord, StoreError>;

    /// Append a new record.
    ///
    /// # Errors
    ///
    /// - `Conflict` if a record with the same name exists
    async fn add(&self, record: ServerRecord) -> Result<ServerRecord, StoreError>;

    /// Remove a record by name, returning it.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no record has this name
    async fn remove(&self, name: &str) -> Result<ServerRecord, StoreError>;
}

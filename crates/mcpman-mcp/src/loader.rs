//! One-shot population of the registry from the persisted store.

use std::sync::Arc;

use mcpman_core::ServerStore;
use tokio::task::JoinHandle;

use crate::registry::Registry;

/// Outcome of a load pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Records admitted to the registry.
    pub admitted: usize,
    /// Records rejected by the registry (duplicate name, registry full).
    pub skipped: usize,
}

/// Reads every persisted record once and admits it to the registry.
pub struct Loader {
    store: Arc<dyn ServerStore>,
    registry: Arc<Registry>,
}

impl Loader {
    pub fn new(store: Arc<dyn ServerStore>, registry: Arc<Registry>) -> Self {
        Self { store, registry }
    }

    /// Admit every persisted record.
    ///
    /// One bad record never stops the rest. A store that cannot be read is
    /// logged and yields an empty summary.
    pub async fn load(&self) -> LoadSummary {
        let records = match self.store.read_all().await {
            Ok(records) => records,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read server store");
                return LoadSummary::default();
            }
        };

        let mut summary = LoadSummary::default();
        for record in records {
            let name = record.name.clone();
            match self.registry.admit(record).await {
                Ok(()) => summary.admitted += 1,
                Err(e) => {
                    summary.skipped += 1;
                    tracing::warn!(
                        server_name = %name,
                        error = %e,
                        "Skipping server during load"
                    );
                }
            }
        }

        tracing::info!(
            admitted = summary.admitted,
            skipped = summary.skipped,
            "Server registry loaded"
        );
        summary
    }

    /// Run [`load`](Self::load) as an independent task.
    pub fn spawn(self) -> JoinHandle<LoadSummary> {
        tokio::spawn(async move { self.load().await })
    }
}

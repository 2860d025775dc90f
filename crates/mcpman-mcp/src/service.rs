//! Orchestrator façade.
//!
//! `McpService` composes the registry, the loader and session drivers. Every
//! capability call runs its own session; nothing is reused between calls.

use std::sync::Arc;
use std::time::Duration;

use mcpman_core::{
    DEFAULT_SESSION_TIMEOUT_SECS, PromptDescriptor, ResourceDescriptor, ServerRecord,
    ServerStore, Settings, ToolDescriptor, TrackedServer,
};
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::loader::{LoadSummary, Loader};
use crate::protocol::{
    ListPage, ListPromptsResult, ListResourcesResult, ListToolsResult, QueryKind,
};
use crate::registry::Registry;
use crate::session::{Capabilities, SessionDriver, SessionError};
use crate::transport::{Connector, StdioConnector};

/// Errors surfaced by the orchestrator.
///
/// Session failures keep the [`SessionError`] as their source.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Could not connect to server '{server}'")]
    ConnectFailed {
        server: String,
        #[source]
        source: SessionError,
    },

    #[error("Handshake with server '{server}' failed")]
    HandshakeFailed {
        server: String,
        #[source]
        source: SessionError,
    },

    #[error("Listing {kind} from server '{server}' failed")]
    QueryFailed {
        server: String,
        kind: QueryKind,
        #[source]
        source: SessionError,
    },

    #[error("Session with server '{server}' timed out")]
    TimedOut {
        server: String,
        #[source]
        source: SessionError,
    },

    #[error("Server '{0}' is not registered")]
    NotFound(String),
}

impl From<SessionError> for OrchestratorError {
    fn from(err: SessionError) -> Self {
        let server = err.server().to_string();
        match err {
            SessionError::Transport { .. } => Self::ConnectFailed {
                server,
                source: err,
            },
            SessionError::Handshake { .. } => Self::HandshakeFailed {
                server,
                source: err,
            },
            SessionError::Query { kind, .. } => Self::QueryFailed {
                server,
                kind,
                source: err,
            },
            SessionError::Timeout { .. } => Self::TimedOut {
                server,
                source: err,
            },
        }
    }
}

/// Public entry point for loading servers and querying their capabilities.
pub struct McpService {
    registry: Arc<Registry>,
    connector: Arc<dyn Connector>,
    session_timeout: Duration,
}

impl McpService {
    /// Create a service over an existing registry and connector.
    pub fn new(registry: Arc<Registry>, connector: Arc<dyn Connector>) -> Self {
        Self {
            registry,
            connector,
            session_timeout: Duration::from_secs(DEFAULT_SESSION_TIMEOUT_SECS),
        }
    }

    /// Create a service with a fresh registry and the stdio connector.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            Arc::new(Registry::from_settings(settings)),
            Arc::new(StdioConnector::new()),
        )
        .with_session_timeout(settings.effective_session_timeout())
    }

    /// Set the per-session deadline.
    #[must_use]
    pub const fn with_session_timeout(mut self, timeout: Duration) -> Self {
        self.session_timeout = timeout;
        self
    }

    pub const fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub const fn session_timeout(&self) -> Duration {
        self.session_timeout
    }

    /// Start loading persisted servers into the registry in the background.
    ///
    /// Callers may query immediately; servers not yet admitted are reported
    /// as not found.
    pub fn load_and_run(&self, store: Arc<dyn ServerStore>) -> JoinHandle<LoadSummary> {
        Loader::new(store, Arc::clone(&self.registry)).spawn()
    }

    /// Snapshot of every tracked server.
    pub async fn servers(&self) -> Vec<TrackedServer> {
        self.registry.list().await
    }

    pub async fn get_tools(
        &self,
        record: &ServerRecord,
    ) -> Result<Vec<ToolDescriptor>, OrchestratorError> {
        self.query::<ListToolsResult>(record).await
    }

    pub async fn get_prompts(
        &self,
        record: &ServerRecord,
    ) -> Result<Vec<PromptDescriptor>, OrchestratorError> {
        self.query::<ListPromptsResult>(record).await
    }

    pub async fn get_resources(
        &self,
        record: &ServerRecord,
    ) -> Result<Vec<ResourceDescriptor>, OrchestratorError> {
        self.query::<ListResourcesResult>(record).await
    }

    /// Run one session for `kind` against `record`.
    pub async fn get_capabilities(
        &self,
        record: &ServerRecord,
        kind: QueryKind,
    ) -> Result<Capabilities, OrchestratorError> {
        self.driver(record).run(kind).await.map_err(Into::into)
    }

    pub async fn get_tools_by_name(
        &self,
        name: &str,
    ) -> Result<Vec<ToolDescriptor>, OrchestratorError> {
        let record = self.resolve(name).await?;
        self.get_tools(&record).await
    }

    pub async fn get_prompts_by_name(
        &self,
        name: &str,
    ) -> Result<Vec<PromptDescriptor>, OrchestratorError> {
        let record = self.resolve(name).await?;
        self.get_prompts(&record).await
    }

    pub async fn get_resources_by_name(
        &self,
        name: &str,
    ) -> Result<Vec<ResourceDescriptor>, OrchestratorError> {
        let record = self.resolve(name).await?;
        self.get_resources(&record).await
    }

    async fn resolve(&self, name: &str) -> Result<ServerRecord, OrchestratorError> {
        self.registry
            .lookup(name)
            .await
            .map(|tracked| tracked.record)
            .ok_or_else(|| OrchestratorError::NotFound(name.to_string()))
    }

    async fn query<P: ListPage>(
        &self,
        record: &ServerRecord,
    ) -> Result<Vec<P::Item>, OrchestratorError> {
        tracing::debug!(server_name = %record.name, kind = %P::KIND, "Starting session");
        self.driver(record)
            .run_query::<P>()
            .await
            .map_err(Into::into)
    }

    fn driver(&self, record: &ServerRecord) -> SessionDriver {
        SessionDriver::new(
            record.clone(),
            Arc::clone(&self.connector),
            Arc::clone(&self.registry),
            self.session_timeout,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientError;
    use crate::transport::TransportError;
    use std::error::Error as _;

    #[test]
    fn test_session_errors_map_to_orchestrator_errors() {
        let transport = SessionError::Transport {
            server: "a".to_string(),
            source: TransportError::Closed,
        };
        let mapped = OrchestratorError::from(transport);
        assert!(matches!(&mapped, OrchestratorError::ConnectFailed { server, .. } if server == "a"));
        assert!(mapped.source().is_some());

        let query = SessionError::Query {
            server: "b".to_string(),
            kind: QueryKind::Resources,
            source: ClientError::ConnectionClosed,
        };
        assert!(matches!(
            OrchestratorError::from(query),
            OrchestratorError::QueryFailed {
                kind: QueryKind::Resources,
                ..
            }
        ));

        let handshake = SessionError::Handshake {
            server: "c".to_string(),
            source: ClientError::UnsupportedVersion("1.0".to_string()),
        };
        assert!(matches!(
            OrchestratorError::from(handshake),
            OrchestratorError::HandshakeFailed { .. }
        ));
    }

    #[test]
    fn test_error_chain_names_server_once() {
        let handshake = OrchestratorError::from(SessionError::Handshake {
            server: "fetch".to_string(),
            source: ClientError::ConnectionClosed,
        });
        let message = crate::session::error_chain(&handshake);
        assert_eq!(
            message,
            "Handshake with server 'fetch' failed: initialize step failed: Server closed the connection"
        );

        let query = OrchestratorError::from(SessionError::Query {
            server: "docs".to_string(),
            kind: QueryKind::Prompts,
            source: ClientError::ConnectionClosed,
        });
        let message = crate::session::error_chain(&query);
        assert_eq!(message.matches("docs").count(), 1, "{message}");
        assert!(message.contains("prompts/list request failed"), "{message}");
    }

    #[tokio::test]
    async fn test_by_name_on_empty_registry_is_not_found() {
        let service = McpService::from_settings(&Settings::default());
        let err = service.get_tools_by_name("fetch").await.unwrap_err();
        assert!(matches!(err, OrchestratorError::NotFound(name) if name == "fetch"));
    }

    #[test]
    fn test_from_settings_applies_timeout() {
        let settings = Settings {
            session_timeout_secs: Some(7),
            registry_capacity: Some(4),
            ..Settings::default()
        };
        let service = McpService::from_settings(&settings);
        assert_eq!(service.session_timeout(), Duration::from_secs(7));
        assert_eq!(service.registry().capacity(), 4);
    }
}

//! Session protocol driver.
//!
//! One session is one bounded conversation with a server: connect,
//! handshake, a single capability query, close. The whole sequence runs
//! under one deadline and the transport is closed on every path.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use mcpman_core::{
    PromptDescriptor, ResourceDescriptor, ServerRecord, ServerStatus, ToolDescriptor,
};
use thiserror::Error;
use tokio::time::error::Elapsed;

use crate::client::{ClientError, McpClient};
use crate::protocol::{
    ListPage, ListPromptsResult, ListResourcesResult, ListToolsResult, QueryKind,
};
use crate::registry::Registry;
use crate::transport::{Connector, TransportError};

/// Default bound on transport teardown.
pub const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// State of a single session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Idle,
    Connecting,
    Handshaking,
    Ready,
    Querying,
    Closed,
    Failed,
}

impl SessionState {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Failed)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Handshaking => "handshaking",
            Self::Ready => "ready",
            Self::Querying => "querying",
            Self::Closed => "closed",
            Self::Failed => "failed",
        };
        f.pad(name)
    }
}

/// Result of one capability query.
#[derive(Debug, Clone, PartialEq)]
pub enum Capabilities {
    Tools(Vec<ToolDescriptor>),
    Prompts(Vec<PromptDescriptor>),
    Resources(Vec<ResourceDescriptor>),
}

impl Capabilities {
    pub const fn kind(&self) -> QueryKind {
        match self {
            Self::Tools(_) => QueryKind::Tools,
            Self::Prompts(_) => QueryKind::Prompts,
            Self::Resources(_) => QueryKind::Resources,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Tools(items) => items.len(),
            Self::Prompts(items) => items.len(),
            Self::Resources(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Session-level failures. Each carries the server name and keeps its cause.
///
/// Messages describe the failed step only; callers add the server name.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("connect step failed")]
    Transport {
        server: String,
        #[source]
        source: TransportError,
    },

    #[error("initialize step failed")]
    Handshake {
        server: String,
        #[source]
        source: ClientError,
    },

    #[error("{} request failed", kind.method())]
    Query {
        server: String,
        kind: QueryKind,
        #[source]
        source: ClientError,
    },

    #[error("deadline of {timeout:?} expired while {step}")]
    Timeout {
        server: String,
        step: SessionState,
        timeout: Duration,
        #[source]
        source: Elapsed,
    },
}

impl SessionError {
    /// Name of the server the session was talking to.
    pub fn server(&self) -> &str {
        match self {
            Self::Transport { server, .. }
            | Self::Handshake { server, .. }
            | Self::Query { server, .. }
            | Self::Timeout { server, .. } => server,
        }
    }
}

/// Render an error and its sources as `outer: inner: root`.
pub fn error_chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Drives one session against one server record.
///
/// Registry status follows the session: `Starting` on connect, `Running`
/// once the handshake completes, then `Stopped` or `Failed`. Records that
/// are not in the registry are still served.
pub struct SessionDriver {
    record: ServerRecord,
    connector: Arc<dyn Connector>,
    registry: Arc<Registry>,
    deadline: Duration,
    close_timeout: Duration,
    state: SessionState,
}

impl SessionDriver {
    pub fn new(
        record: ServerRecord,
        connector: Arc<dyn Connector>,
        registry: Arc<Registry>,
        deadline: Duration,
    ) -> Self {
        Self {
            record,
            connector,
            registry,
            deadline,
            close_timeout: DEFAULT_CLOSE_TIMEOUT,
            state: SessionState::Idle,
        }
    }

    /// Bound the transport close step.
    #[must_use]
    pub const fn with_close_timeout(mut self, close_timeout: Duration) -> Self {
        self.close_timeout = close_timeout;
        self
    }

    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Run a session issuing the query for `kind`.
    pub async fn run(self, kind: QueryKind) -> Result<Capabilities, SessionError> {
        match kind {
            QueryKind::Tools => self
                .run_query::<ListToolsResult>()
                .await
                .map(Capabilities::Tools),
            QueryKind::Prompts => self
                .run_query::<ListPromptsResult>()
                .await
                .map(Capabilities::Prompts),
            QueryKind::Resources => self
                .run_query::<ListResourcesResult>()
                .await
                .map(Capabilities::Resources),
        }
    }

    /// Run a session issuing the query for page type `P`.
    pub async fn run_query<P: ListPage>(mut self) -> Result<Vec<P::Item>, SessionError> {
        let mut client = None;

        let deadline = self.deadline;
        let result = tokio::time::timeout(deadline, self.drive::<P>(&mut client)).await;
        let outcome = match result {
            Ok(result) => result,
            Err(elapsed) => Err(SessionError::Timeout {
                server: self.record.name.clone(),
                step: self.state,
                timeout: deadline,
                source: elapsed,
            }),
        };

        if let Err(err) = &outcome {
            self.transition(SessionState::Failed);
            tracing::warn!(
                server_name = %self.record.name,
                error = %error_chain(err),
                "Session failed"
            );
            if let Err(e) = self
                .registry
                .record_failure(&self.record.name, error_chain(err))
                .await
            {
                tracing::debug!(server_name = %self.record.name, error = %e, "Status not recorded");
            }
        }

        if let Some(mut client) = client {
            self.close(&mut client).await;
        }

        if outcome.is_ok() {
            self.transition(SessionState::Closed);
            self.publish(ServerStatus::Stopped).await;
        }

        outcome
    }

    async fn drive<P: ListPage>(
        &mut self,
        slot: &mut Option<McpClient>,
    ) -> Result<Vec<P::Item>, SessionError> {
        self.transition(SessionState::Connecting);
        self.publish(ServerStatus::Starting).await;

        let transport = self.connector.connect(&self.record).await.map_err(|source| {
            SessionError::Transport {
                server: self.record.name.clone(),
                source,
            }
        })?;
        let client = slot.insert(McpClient::new(self.record.name.clone(), transport));

        self.transition(SessionState::Handshaking);
        client
            .initialize()
            .await
            .map_err(|source| SessionError::Handshake {
                server: self.record.name.clone(),
                source,
            })?;

        self.transition(SessionState::Ready);
        self.publish(ServerStatus::Running).await;

        self.transition(SessionState::Querying);
        let items = client
            .list::<P>()
            .await
            .map_err(|source| SessionError::Query {
                server: self.record.name.clone(),
                kind: P::KIND,
                source,
            })?;

        self.transition(SessionState::Ready);
        Ok(items)
    }

    async fn close(&self, client: &mut McpClient) {
        match tokio::time::timeout(self.close_timeout, client.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(server_name = %self.record.name, error = %e, "Error closing transport");
            }
            Err(_) => {
                // Dropping the client kills the child
                tracing::warn!(
                    server_name = %self.record.name,
                    timeout = ?self.close_timeout,
                    "Timed out closing transport"
                );
            }
        }
    }

    fn transition(&mut self, next: SessionState) {
        tracing::debug!(
            server_name = %self.record.name,
            from = %self.state,
            to = %next,
            "Session state transition"
        );
        self.state = next;
    }

    async fn publish(&self, status: ServerStatus) {
        if let Err(e) = self
            .registry
            .update_status(&self.record.name, status)
            .await
        {
            tracing::debug!(
                server_name = %self.record.name,
                %status,
                error = %e,
                "Skipping status update"
            );
        }
    }
}

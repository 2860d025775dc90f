//! MCP JSON-RPC client over a [`Transport`].
//!
//! The client is strictly sequential: one request in flight at a time, which
//! is all a single-query session needs. Lines that are not JSON, server
//! notifications, and responses to other ids are skipped while waiting.

use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use thiserror::Error;

use crate::protocol::{
    CLIENT_NAME, CLIENT_VERSION, InitializeResult, JsonRpcMessage, JsonRpcNotification,
    JsonRpcRequest, ListPage, PROTOCOL_VERSION, SUPPORTED_PROTOCOL_VERSIONS,
};
use crate::transport::{Transport, TransportError};

/// Messages skipped while waiting for one response before giving up.
const MAX_SKIPPED_MESSAGES: usize = 1000;

/// Pages followed for one `*/list` query.
const MAX_PAGES: usize = 64;

/// Errors that can occur during MCP client operations.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("MCP protocol error: {0}")]
    Protocol(String),

    #[error("MCP server returned error: code={code}, message={message}")]
    Server { code: i64, message: String },

    #[error("Server closed the connection")]
    ConnectionClosed,

    #[error("Unsupported protocol version: {0}")]
    UnsupportedVersion(String),

    #[error("Session not initialized")]
    NotInitialized,
}

/// Client for one MCP server connection.
pub struct McpClient {
    server_name: String,
    transport: Box<dyn Transport>,
    next_id: u64,
    initialized: Option<InitializeResult>,
}

impl McpClient {
    /// Wrap an open transport. No messages are exchanged until [`initialize`](Self::initialize).
    pub fn new(server_name: impl Into<String>, transport: Box<dyn Transport>) -> Self {
        Self {
            server_name: server_name.into(),
            transport,
            next_id: 1,
            initialized: None,
        }
    }

    /// Perform the `initialize` handshake and send `notifications/initialized`.
    pub async fn initialize(&mut self) -> Result<&InitializeResult, ClientError> {
        let params = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": {
                "name": CLIENT_NAME,
                "version": CLIENT_VERSION
            }
        });

        let result: InitializeResult = self.request("initialize", Some(params)).await?;

        if !SUPPORTED_PROTOCOL_VERSIONS.contains(&result.protocol_version.as_str()) {
            return Err(ClientError::UnsupportedVersion(result.protocol_version));
        }

        tracing::debug!(
            server_name = %self.server_name,
            protocol_version = %result.protocol_version,
            peer = ?result.server_info.as_ref().map(|info| info.name.as_str()),
            "MCP session initialized"
        );

        self.notify("notifications/initialized", None).await?;

        Ok(self.initialized.insert(result))
    }

    /// Run a `*/list` query to completion, following `nextCursor`.
    ///
    /// Returns an empty list when the server did not declare the capability.
    pub async fn list<P: ListPage>(&mut self) -> Result<Vec<P::Item>, ClientError> {
        let capabilities = &self
            .initialized
            .as_ref()
            .ok_or(ClientError::NotInitialized)?
            .capabilities;

        if !capabilities.supports(P::KIND) {
            tracing::debug!(
                server_name = %self.server_name,
                kind = %P::KIND,
                "Server does not declare capability, returning empty list"
            );
            return Ok(Vec::new());
        }

        let mut items = Vec::new();
        let mut cursor: Option<String> = None;

        for _ in 0..MAX_PAGES {
            let params = cursor.take().map(|c| json!({ "cursor": c }));
            let page: P = self.request(P::KIND.method(), params).await?;
            let (mut page_items, next) = page.into_parts();
            items.append(&mut page_items);

            match next {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => return Ok(items),
            }
        }

        Err(ClientError::Protocol(format!(
            "{} did not finish after {MAX_PAGES} pages",
            P::KIND.method()
        )))
    }

    /// Close the underlying transport.
    pub async fn close(&mut self) -> Result<(), TransportError> {
        self.transport.close().await
    }

    /// Send a request and wait for its response.
    async fn request<T: DeserializeOwned>(
        &mut self,
        method: &str,
        params: Option<Value>,
    ) -> Result<T, ClientError> {
        let id = self.next_id;
        self.next_id += 1;

        let request = JsonRpcRequest::new(id, method, params);
        self.transport.send(&serde_json::to_string(&request)?).await?;

        let response = self.read_response(id).await?;

        if let Some(err) = response.error {
            return Err(ClientError::Server {
                code: err.code,
                message: err.message,
            });
        }

        let result = response
            .result
            .ok_or_else(|| ClientError::Protocol(format!("Missing result in {method} response")))?;

        serde_json::from_value(result).map_err(Into::into)
    }

    async fn read_response(&mut self, id: u64) -> Result<JsonRpcMessage, ClientError> {
        for _ in 0..MAX_SKIPPED_MESSAGES {
            let Some(line) = self.transport.receive().await? else {
                return Err(ClientError::ConnectionClosed);
            };

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            match serde_json::from_str::<JsonRpcMessage>(trimmed) {
                Ok(message) if message.is_response_to(id) => return Ok(message),
                Ok(message) => {
                    tracing::trace!(
                        server_name = %self.server_name,
                        method = ?message.method,
                        "Skipping unrelated message"
                    );
                }
                Err(_) => {
                    tracing::debug!(
                        server_name = %self.server_name,
                        line = trimmed,
                        "Skipping non-JSON-RPC output"
                    );
                }
            }
        }

        Err(ClientError::Protocol(format!(
            "No response for request {id} after {MAX_SKIPPED_MESSAGES} messages"
        )))
    }

    /// Send a notification (no response expected).
    async fn notify(&mut self, method: &str, params: Option<Value>) -> Result<(), ClientError> {
        let notification = JsonRpcNotification::new(method, params);
        self.transport
            .send(&serde_json::to_string(&notification)?)
            .await?;
        Ok(())
    }
}

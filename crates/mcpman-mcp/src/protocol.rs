//! MCP JSON-RPC 2.0 message types.
//!
//! Messages are framed as one JSON document per line.
//! Reference: <https://spec.modelcontextprotocol.io/>

use std::fmt;

use mcpman_core::{PromptDescriptor, ResourceDescriptor, ToolDescriptor};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Protocol version sent in `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Versions a peer may answer with.
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &["2024-11-05", "2025-03-26", "2025-06-18"];

/// Client name sent in `initialize`.
pub const CLIENT_NAME: &str = "mcpman";

/// Client version sent in `initialize`.
pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// JSON-RPC 2.0 request.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    pub fn new(id: u64, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method: method.into(),
            params,
        }
    }
}

/// JSON-RPC 2.0 notification (no id, no response).
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcNotification {
    pub jsonrpc: &'static str,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcNotification {
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            method: method.into(),
            params,
        }
    }
}

/// Any message read from the peer.
///
/// Responses carry `id` and one of `result`/`error`. Messages with a
/// `method` are requests or notifications initiated by the server.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcMessage {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcMessage {
    /// Whether this is the response to request `id`.
    pub fn is_response_to(&self, id: u64) -> bool {
        self.method.is_none() && self.id.as_ref().and_then(Value::as_u64) == Some(id)
    }
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

/// Server capabilities from the `initialize` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerCapabilities {
    #[serde(default)]
    pub tools: Option<Value>,
    #[serde(default)]
    pub prompts: Option<Value>,
    #[serde(default)]
    pub resources: Option<Value>,
}

impl ServerCapabilities {
    /// Whether the server declared support for `kind`.
    pub const fn supports(&self, kind: QueryKind) -> bool {
        match kind {
            QueryKind::Tools => self.tools.is_some(),
            QueryKind::Prompts => self.prompts.is_some(),
            QueryKind::Resources => self.resources.is_some(),
        }
    }
}

/// Server information from `initialize`.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
}

/// MCP initialize result.
#[derive(Debug, Clone, Deserialize)]
pub struct InitializeResult {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    #[serde(default)]
    pub capabilities: ServerCapabilities,
    #[serde(default, rename = "serverInfo")]
    pub server_info: Option<ServerInfo>,
}

/// Capability query issued by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    Tools,
    Prompts,
    Resources,
}

impl QueryKind {
    /// JSON-RPC method name.
    pub const fn method(self) -> &'static str {
        match self {
            Self::Tools => "tools/list",
            Self::Prompts => "prompts/list",
            Self::Resources => "resources/list",
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tools => f.pad("tools"),
            Self::Prompts => f.pad("prompts"),
            Self::Resources => f.pad("resources"),
        }
    }
}

/// One page of a `*/list` result.
pub trait ListPage: DeserializeOwned + Send {
    /// Descriptor type carried by the page.
    type Item: Send;

    /// Which query produces this page.
    const KIND: QueryKind;

    /// Split into items and the cursor for the next page.
    fn into_parts(self) -> (Vec<Self::Item>, Option<String>);
}

/// `tools/list` result.
#[derive(Debug, Deserialize)]
pub struct ListToolsResult {
    #[serde(default)]
    pub tools: Vec<ToolDescriptor>,
    #[serde(default, rename = "nextCursor")]
    pub next_cursor: Option<String>,
}

impl ListPage for ListToolsResult {
    type Item = ToolDescriptor;
    const KIND: QueryKind = QueryKind::Tools;

    fn into_parts(self) -> (Vec<ToolDescriptor>, Option<String>) {
        (self.tools, self.next_cursor)
    }
}

/// `prompts/list` result.
#[derive(Debug, Deserialize)]
pub struct ListPromptsResult {
    #[serde(default)]
    pub prompts: Vec<PromptDescriptor>,
    #[serde(default, rename = "nextCursor")]
    pub next_cursor: Option<String>,
}

impl ListPage for ListPromptsResult {
    type Item = PromptDescriptor;
    const KIND: QueryKind = QueryKind::Prompts;

    fn into_parts(self) -> (Vec<PromptDescriptor>, Option<String>) {
        (self.prompts, self.next_cursor)
    }
}

/// `resources/list` result.
#[derive(Debug, Deserialize)]
pub struct ListResourcesResult {
    #[serde(default)]
    pub resources: Vec<ResourceDescriptor>,
    #[serde(default, rename = "nextCursor")]
    pub next_cursor: Option<String>,
}

impl ListPage for ListResourcesResult {
    type Item = ResourceDescriptor;
    const KIND: QueryKind = QueryKind::Resources;

    fn into_parts(self) -> (Vec<ResourceDescriptor>, Option<String>) {
        (self.resources, self.next_cursor)
    }
}

#![doc = include_str!(concat!(env!("OUT_DIR"), "/README_GENERATED.md"))]
#![deny(unused_crate_dependencies)]

pub mod client;
pub mod loader;
pub(crate) mod path;
pub mod protocol;
pub mod registry;
pub mod service;
pub mod session;
pub mod transport;

// Re-export domain types from core for convenience
pub use mcpman_core::{
    PromptDescriptor, ResourceDescriptor, ServerRecord, ServerStatus, ServerType,
    ToolDescriptor, TrackedServer,
};

// Re-export this crate's public types
pub use client::{ClientError, McpClient};
pub use loader::{LoadSummary, Loader};
pub use protocol::QueryKind;
pub use registry::{AdmissionPolicy, Registry, RegistryError};
pub use service::{McpService, OrchestratorError};
pub use session::{Capabilities, SessionDriver, SessionError, SessionState, error_chain};
pub use transport::{Connector, StdioConnector, StdioTransport, Transport, TransportError};

#[cfg(test)]
use tempfile as _;

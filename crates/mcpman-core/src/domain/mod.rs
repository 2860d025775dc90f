//! Tool-server domain types.
//!
//! These types describe tool servers independent of any infrastructure
//! concerns (file formats, process management, protocol framing).
//!
//! # Design
//!
//! - `ServerRecord` - Immutable identity of an installed server
//! - `LaunchSpec` - Command, arguments and environment overrides
//! - `ServerType` - How a session is opened (stdio or SSE)
//! - `ServerStatus` - Lifecycle state tracked by the registry
//! - `TrackedServer` - A record plus its live status
//! - `ToolDescriptor` / `PromptDescriptor` / `ResourceDescriptor` - Capabilities
//!   reported by a server, forwarded as returned

mod capability;
mod server;

pub use capability::{PromptArgument, PromptDescriptor, ResourceDescriptor, ToolDescriptor};
pub use server::{
    LaunchSpec, ServerConfigFile, ServerRecord, ServerStatus, ServerType, TrackedServer,
};

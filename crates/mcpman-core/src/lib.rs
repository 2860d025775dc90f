#![doc = include_str!(concat!(env!("OUT_DIR"), "/README_GENERATED.md"))]
#![deny(unused_crate_dependencies)]

pub mod domain;
pub mod paths;
pub mod ports;
pub mod settings;

// Re-export commonly used types for convenience
pub use domain::{
    LaunchSpec, PromptArgument, PromptDescriptor, ResourceDescriptor, ServerConfigFile,
    ServerRecord, ServerStatus, ServerType, ToolDescriptor, TrackedServer,
};
pub use paths::{
    PathError, cache_root, config_json_path, ensure_directory, normalize_user_path, servers_dir,
};
pub use ports::{ServerStore, StoreError};
pub use settings::{
    DEFAULT_REGISTRY_CAPACITY, DEFAULT_SESSION_TIMEOUT_SECS, Settings, SettingsError,
    validate_settings,
};

#[cfg(test)]
use tempfile as _;

//! Port definitions (trait abstractions) for external systems.
//!
//! # Design Rules
//!
//! - No file format or path details in any signature
//! - Traits are minimal and CRUD-focused

mod server_store;

pub use server_store::{ServerStore, StoreError};

#![doc = include_str!(concat!(env!("OUT_DIR"), "/README_GENERATED.md"))]
#![deny(unused_crate_dependencies)]

pub mod install;
pub mod json_store;

pub use install::{InstallError, Installer};
pub use json_store::JsonServerStore;

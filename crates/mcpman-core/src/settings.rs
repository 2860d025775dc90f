//! Settings domain types and validation.
//!
//! Settings come from the environment (`MCPMAN_*` variables). All fields are
//! optional; the `effective_*` accessors apply defaults.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default maximum number of servers held by the registry.
pub const DEFAULT_REGISTRY_CAPACITY: usize = 20;

/// Default overall deadline for one session (connect + handshake + query).
pub const DEFAULT_SESSION_TIMEOUT_SECS: u64 = 30;

/// Environment variable overriding the cache root.
pub const ENV_CACHE_DIR: &str = "MCPMAN_CACHE_DIR";
/// Environment variable overriding the registry capacity.
pub const ENV_REGISTRY_CAPACITY: &str = "MCPMAN_REGISTRY_CAPACITY";
/// Environment variable overriding the session timeout, in seconds.
pub const ENV_SESSION_TIMEOUT_SECS: &str = "MCPMAN_SESSION_TIMEOUT_SECS";
/// Environment variable enabling bounded admission waits, in milliseconds.
pub const ENV_ADMISSION_WAIT_MS: &str = "MCPMAN_ADMISSION_WAIT_MS";

const MAX_REGISTRY_CAPACITY: usize = 1024;
const MAX_SESSION_TIMEOUT_SECS: u64 = 600;

/// Errors from loading or validating settings.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    /// A variable is set but does not parse.
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    /// A value parsed but is outside its allowed range.
    #[error("{0}")]
    OutOfRange(String),
}

/// Application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Root of the mcpman cache (installed executables and `config.json`).
    pub cache_dir: Option<String>,

    /// Maximum number of tracked servers (1-1024).
    pub registry_capacity: Option<usize>,

    /// Deadline for one session in seconds (1-600).
    pub session_timeout_secs: Option<u64>,

    /// How long `admit` may wait for a free slot. `None` fails fast.
    pub admission_wait_ms: Option<u64>,
}

impl Settings {
    /// Load settings from the process environment.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let settings = Self {
            cache_dir: lookup(ENV_CACHE_DIR).filter(|v| !v.trim().is_empty()),
            registry_capacity: parse_var(&lookup, ENV_REGISTRY_CAPACITY)?,
            session_timeout_secs: parse_var(&lookup, ENV_SESSION_TIMEOUT_SECS)?,
            admission_wait_ms: parse_var(&lookup, ENV_ADMISSION_WAIT_MS)?,
        };
        validate_settings(&settings)?;
        Ok(settings)
    }

    /// Registry capacity with default fallback.
    pub fn effective_registry_capacity(&self) -> usize {
        self.registry_capacity.unwrap_or(DEFAULT_REGISTRY_CAPACITY)
    }

    /// Session deadline with default fallback.
    pub fn effective_session_timeout(&self) -> Duration {
        Duration::from_secs(
            self.session_timeout_secs
                .unwrap_or(DEFAULT_SESSION_TIMEOUT_SECS),
        )
    }

    /// Bounded admission wait, if configured.
    pub fn admission_wait(&self) -> Option<Duration> {
        self.admission_wait_ms.map(Duration::from_millis)
    }
}

fn parse_var<F, T>(lookup: &F, key: &'static str) -> Result<Option<T>, SettingsError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| SettingsError::InvalidValue { key, value: raw }),
    }
}

/// Validate settings ranges.
pub fn validate_settings(settings: &Settings) -> Result<(), SettingsError> {
    if let Some(capacity) = settings.registry_capacity {
        if capacity == 0 || capacity > MAX_REGISTRY_CAPACITY {
            return Err(SettingsError::OutOfRange(format!(
                "registry_capacity must be between 1 and {MAX_REGISTRY_CAPACITY}, got {capacity}"
            )));
        }
    }

    if let Some(secs) = settings.session_timeout_secs {
        if secs == 0 || secs > MAX_SESSION_TIMEOUT_SECS {
            return Err(SettingsError::OutOfRange(format!(
                "session_timeout_secs must be between 1 and {MAX_SESSION_TIMEOUT_SECS}, got {secs}"
            )));
        }
    }

    Ok(())
}

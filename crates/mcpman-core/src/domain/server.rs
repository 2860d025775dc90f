//! Server record and lifecycle types.
//!
//! The JSON shape of `ServerRecord` is the persisted format of `config.json`.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// Type of tool-server connection.
///
/// Written as `"stdio"` / `"sse"`. Older documents store the numeric codes
/// `0` / `1`, which are accepted on read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerType {
    /// mcpman spawns the process and talks over its stdin/stdout
    #[default]
    Stdio,
    /// Server-sent events transport
    Sse,
}

impl<'de> Deserialize<'de> for ServerType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Debug, Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Code(u64),
            Name(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Code(0) => Ok(Self::Stdio),
            Repr::Code(1) => Ok(Self::Sse),
            Repr::Name(name) if name.eq_ignore_ascii_case("stdio") => Ok(Self::Stdio),
            Repr::Name(name) if name.eq_ignore_ascii_case("sse") => Ok(Self::Sse),
            other => Err(D::Error::custom(format!("unknown server type {other:?}"))),
        }
    }
}

/// Read a field whose `null` means "empty".
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl fmt::Display for ServerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdio => f.pad("stdio"),
            Self::Sse => f.pad("sse"),
        }
    }
}

/// Lifecycle state of a tracked server.
///
/// `Loaded` is assigned on admission. A session drives a server through
/// `Starting` and `Running`, ending in `Stopped` or `Failed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
    /// Admitted to the registry, no session yet
    #[default]
    Loaded,
    /// A session is connecting
    Starting,
    /// Handshake completed
    Running,
    /// Last session closed cleanly
    Stopped,
    Paused,
    Restarting,
    Updating,
    /// Last session failed
    Failed,
}

impl ServerStatus {
    /// Whether this state ends a session attempt.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Stopped | Self::Failed)
    }
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Loaded => "loaded",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Stopped => "stopped",
            Self::Paused => "paused",
            Self::Restarting => "restarting",
            Self::Updating => "updating",
            Self::Failed => "failed",
        };
        f.pad(name)
    }
}

/// How to launch a server process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchSpec {
    /// Program to execute. Empty for records that only carry a `path`.
    #[serde(default)]
    pub command: String,

    /// Arguments, in order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub args: Vec<String>,

    /// Environment variable overrides. Keys are unique.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub env: BTreeMap<String, String>,
}

impl LaunchSpec {
    /// Create a launch spec for a command with no arguments.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
        }
    }

    /// Append an argument.
    #[must_use]
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Set an environment variable, replacing any previous value for the key.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

/// An installed tool server.
///
/// Records are immutable once installed; runtime state lives in
/// [`TrackedServer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerRecord {
    /// Unique, user-facing name.
    pub name: String,

    /// Location of the executable.
    pub path: String,

    /// Connection type.
    #[serde(rename = "type", default)]
    pub server_type: ServerType,

    /// Free-form version string.
    #[serde(default)]
    pub version: String,

    /// Launch configuration.
    #[serde(flatten)]
    pub launch: LaunchSpec,
}

impl ServerRecord {
    /// Create a stdio server whose command is its path.
    pub fn new_stdio(name: impl Into<String>, path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            name: name.into(),
            launch: LaunchSpec::new(path.clone()),
            path,
            server_type: ServerType::Stdio,
            version: String::new(),
        }
    }

    /// Set the connection type.
    #[must_use]
    pub const fn with_type(mut self, server_type: ServerType) -> Self {
        self.server_type = server_type;
        self
    }

    /// Set the version string.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Replace the launch configuration.
    #[must_use]
    pub fn with_launch(mut self, launch: LaunchSpec) -> Self {
        self.launch = launch;
        self
    }

    /// The program to execute: the launch command if set, else `path`.
    pub fn program(&self) -> &str {
        if self.launch.command.trim().is_empty() {
            &self.path
        } else {
            &self.launch.command
        }
    }
}

/// Document stored in `config.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfigFile {
    #[serde(default, deserialize_with = "null_as_default")]
    pub mcp_servers: Vec<ServerRecord>,
}

/// A server record with its live registry state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedServer {
    /// The immutable record.
    pub record: ServerRecord,

    /// Current lifecycle state.
    pub status: ServerStatus,

    /// When the record entered the registry.
    pub admitted_at: DateTime<Utc>,

    /// Last status change (equals `admitted_at` until the first change).
    pub status_changed_at: DateTime<Utc>,

    /// Error message of the last failed session, cleared on the next start.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl TrackedServer {
    /// Wrap a record in the `Loaded` state.
    pub fn loaded(record: ServerRecord) -> Self {
        let now = Utc::now();
        Self {
            record,
            status: ServerStatus::Loaded,
            admitted_at: now,
            status_changed_at: now,
            last_error: None,
        }
    }

    /// Name of the wrapped record.
    pub fn name(&self) -> &str {
        &self.record.name
    }
}

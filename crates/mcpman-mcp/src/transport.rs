//! Line-oriented transports to tool servers.
//!
//! A [`Transport`] moves newline-delimited JSON between the client and one
//! server. A [`Connector`] opens a transport for a [`ServerRecord`]; the
//! production connector spawns the server as a child process and speaks over
//! its stdin/stdout.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use mcpman_core::ServerRecord;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use crate::path::{build_effective_path, validate_exe_path};

/// Grace period for a child to exit after its stdin is closed.
const DEFAULT_EXIT_GRACE: Duration = Duration::from_secs(2);

/// Errors raised by transports and connectors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The record does not name anything that can be launched.
    #[error("Invalid executable: {0}")]
    InvalidExecutable(String),

    /// The process could not be spawned.
    #[error("Failed to spawn '{program}': {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// A standard stream was not captured.
    #[error("Server {0} not available")]
    StreamUnavailable(&'static str),

    /// Reading or writing the stream failed.
    #[error("Transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The transport was already closed.
    #[error("Transport is closed")]
    Closed,
}

/// Bidirectional line transport.
#[async_trait]
pub trait Transport: Send {
    /// Write one message followed by a newline.
    async fn send(&mut self, message: &str) -> Result<(), TransportError>;

    /// Read the next line, without its terminator. `Ok(None)` on end of stream.
    async fn receive(&mut self) -> Result<Option<String>, TransportError>;

    /// Release the transport. Must be idempotent.
    async fn close(&mut self) -> Result<(), TransportError>;
}

/// Opens transports for server records.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, record: &ServerRecord) -> Result<Box<dyn Transport>, TransportError>;
}

/// Transport over a child process's standard streams.
pub struct StdioTransport {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: BufReader<ChildStdout>,
    exit_grace: Duration,
    closed: bool,
}

impl StdioTransport {
    /// OS process id, while the child has not been reaped.
    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }
}

#[async_trait]
impl Transport for StdioTransport {
    async fn send(&mut self, message: &str) -> Result<(), TransportError> {
        let stdin = self.stdin.as_mut().ok_or(TransportError::Closed)?;
        stdin.write_all(message.as_bytes()).await?;
        stdin.write_all(b"\n").await?;
        stdin.flush().await?;
        Ok(())
    }

    async fn receive(&mut self) -> Result<Option<String>, TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }

        // Raw bytes: a banner in a legacy encoding must not end the session
        let mut buf = Vec::new();
        let read = self.stdout.read_until(b'\n', &mut buf).await?;
        if read == 0 {
            return Ok(None);
        }

        let line = String::from_utf8_lossy(&buf);
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        // Dropping stdin signals EOF; well-behaved servers exit on their own
        drop(self.stdin.take());

        match tokio::time::timeout(self.exit_grace, self.child.wait()).await {
            Ok(Ok(status)) => {
                tracing::debug!(?status, "Server process exited");
                Ok(())
            }
            Ok(Err(e)) => Err(TransportError::Io(e)),
            Err(_) => {
                tracing::debug!("Server process did not exit, killing");
                self.child.kill().await?;
                Ok(())
            }
        }
    }
}

/// Connector that launches servers as local child processes.
///
/// Every record with a local executable is launched this way, including
/// records typed `sse` by the installer: remote transports are not supported.
#[derive(Debug, Clone)]
pub struct StdioConnector {
    exit_grace: Duration,
}

impl StdioConnector {
    pub const fn new() -> Self {
        Self {
            exit_grace: DEFAULT_EXIT_GRACE,
        }
    }

    /// Spawn the record's program and return the typed transport.
    pub fn spawn(&self, record: &ServerRecord) -> Result<StdioTransport, TransportError> {
        let program = record.program();
        if program.trim().is_empty() {
            return Err(TransportError::InvalidExecutable(format!(
                "server '{}' has neither a command nor a path",
                record.name
            )));
        }
        validate_exe_path(program).map_err(TransportError::InvalidExecutable)?;

        let mut command = Command::new(program);
        command
            .args(&record.launch.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .env("PATH", build_effective_path(program))
            .kill_on_drop(true);

        // User-provided overrides win, including PATH
        command.envs(&record.launch.env);

        let mut child = command.spawn().map_err(|source| TransportError::SpawnFailed {
            program: program.to_string(),
            source,
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or(TransportError::StreamUnavailable("stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or(TransportError::StreamUnavailable("stdout"))?;

        tracing::debug!(
            server_name = %record.name,
            program = %program,
            pid = ?child.id(),
            "Spawned server process"
        );

        Ok(StdioTransport {
            child,
            stdin: Some(stdin),
            stdout: BufReader::new(stdout),
            exit_grace: self.exit_grace,
            closed: false,
        })
    }
}

impl Default for StdioConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connector for StdioConnector {
    async fn connect(&self, record: &ServerRecord) -> Result<Box<dyn Transport>, TransportError> {
        Ok(Box::new(self.spawn(record)?))
    }
}

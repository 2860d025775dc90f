//! Scripted in-memory MCP peer for session tests.
//!
//! `FakeConnector` hands out transports that answer each request from a
//! per-method table of results. It can refuse to connect, stall forever on a
//! chosen method, and report whether the transport was closed.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mcpman_mcp::{
    Connector, Registry, ServerRecord, ServerStatus, ServerType, Transport, TransportError,
};
use serde_json::{Value, json};

// ── Fixtures ───────────────────────────────────────────────────────

/// The installer's record shape for a locally installed server.
pub fn installed_record(name: &str) -> ServerRecord {
    ServerRecord::new_stdio(name, format!("/cache/mcpman/mcp_servers/{name}"))
        .with_type(ServerType::Sse)
        .with_version("1.0.0")
}

pub fn initialize_result(capabilities: Value) -> Value {
    json!({
        "protocolVersion": "2024-11-05",
        "capabilities": capabilities,
        "serverInfo": { "name": "fake", "version": "0.0.1" }
    })
}

pub fn two_tools() -> Value {
    json!({
        "tools": [
            {
                "name": "fetch",
                "description": "Fetch a URL",
                "inputSchema": { "type": "object", "properties": { "url": { "type": "string" } } }
            },
            { "name": "fetch_json", "description": "Fetch and parse JSON" }
        ]
    })
}

// ── Fake connector ─────────────────────────────────────────────────

/// Registry statuses seen when `tools/list` arrived.
pub type StatusProbe = Arc<Mutex<Vec<Option<ServerStatus>>>>;

#[derive(Clone, Default)]
pub struct FakeConnector {
    results: HashMap<String, Value>,
    hang_on: Option<String>,
    fail_connect: bool,
    closed: Arc<AtomicBool>,
    connects: Arc<AtomicUsize>,
    probe: Option<(Arc<Registry>, StatusProbe)>,
}

impl FakeConnector {
    /// A peer declaring tools, prompts and resources, all empty.
    pub fn new() -> Self {
        Self::default()
            .with_result(
                "initialize",
                initialize_result(json!({ "tools": {}, "prompts": {}, "resources": {} })),
            )
            .with_result("tools/list", json!({ "tools": [] }))
            .with_result("prompts/list", json!({ "prompts": [] }))
            .with_result("resources/list", json!({ "resources": [] }))
    }

    pub fn with_result(mut self, method: &str, result: Value) -> Self {
        self.results.insert(method.to_string(), result);
        self
    }

    pub fn without(mut self, method: &str) -> Self {
        self.results.remove(method);
        self
    }

    /// Never answer `method`.
    pub fn hanging_on(mut self, method: &str) -> Self {
        self.hang_on = Some(method.to_string());
        self
    }

    /// Fail every connect attempt.
    pub fn failing(mut self) -> Self {
        self.fail_connect = true;
        self
    }

    /// Record the registry status whenever `tools/list` is received.
    pub fn with_probe(mut self, registry: Arc<Registry>) -> (Self, StatusProbe) {
        let probe = StatusProbe::default();
        self.probe = Some((registry, Arc::clone(&probe)));
        (self, probe)
    }

    pub fn closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(&self, record: &ServerRecord) -> Result<Box<dyn Transport>, TransportError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.fail_connect {
            return Err(TransportError::SpawnFailed {
                program: record.program().to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            });
        }

        Ok(Box::new(FakeTransport {
            server_name: record.name.clone(),
            script: self.clone(),
            queue: VecDeque::new(),
            stalled: false,
        }))
    }
}

struct FakeTransport {
    server_name: String,
    script: FakeConnector,
    queue: VecDeque<String>,
    stalled: bool,
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&mut self, message: &str) -> Result<(), TransportError> {
        if self.script.closed() {
            return Err(TransportError::Closed);
        }

        let request: Value = serde_json::from_str(message)
            .map_err(|e| TransportError::Io(std::io::Error::other(e)))?;
        let Some(id) = request.get("id").cloned() else {
            // Notification
            return Ok(());
        };
        let method = request["method"].as_str().unwrap_or_default().to_string();

        if self.script.hang_on.as_deref() == Some(method.as_str()) {
            self.stalled = true;
            return Ok(());
        }

        if method == "tools/list" {
            if let Some((registry, seen)) = &self.script.probe {
                let status = registry.lookup(&self.server_name).await.map(|t| t.status);
                seen.lock().unwrap().push(status);
            }
        }

        let response = match self.script.results.get(&method) {
            Some(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
            None => json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": { "code": -32601, "message": format!("Method not found: {method}") }
            }),
        };
        self.queue.push_back(response.to_string());
        Ok(())
    }

    async fn receive(&mut self) -> Result<Option<String>, TransportError> {
        if self.stalled {
            return std::future::pending().await;
        }
        Ok(self.queue.pop_front())
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.script.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

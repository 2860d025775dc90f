//! End-to-end tests driving the `mcpman` binary against a temporary cache.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::process::{Command, Output};

const STUB_SERVER: &str = r#"#!/bin/sh
while IFS= read -r line; do
  case "$line" in
    *'"method":"initialize"'*)
      echo '{"jsonrpc":"2.0","id":1,"result":{"protocolVersion":"2024-11-05","capabilities":{"tools":{}},"serverInfo":{"name":"stub"}}}'
      ;;
    *'"method":"tools/list"'*)
      echo '{"jsonrpc":"2.0","id":2,"result":{"tools":[{"name":"fetch","description":"Fetch a URL"}]}}'
      ;;
  esac
done
"#;

fn mcpman(cache: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_mcpman"))
        .arg("--cache-dir")
        .arg(cache)
        .args(args)
        .env_remove("MCPMAN_CACHE_DIR")
        .env_remove("MCPMAN_REGISTRY_CAPACITY")
        .env_remove("MCPMAN_SESSION_TIMEOUT_SECS")
        .env_remove("MCPMAN_ADMISSION_WAIT_MS")
        .env("RUST_LOG", "off")
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn write_stub(dir: &Path, name: &str) -> String {
    let path = dir.join(name);
    std::fs::write(&path, STUB_SERVER).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn test_empty_cache_lists_nothing() {
    let cache = tempfile::tempdir().unwrap();

    let output = mcpman(cache.path(), &["ls"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("No servers installed."));
}

#[test]
fn test_paths_reports_cache_layout() {
    let cache = tempfile::tempdir().unwrap();

    let output = mcpman(cache.path(), &["paths"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("registry_capacity = 20"));
    assert!(text.contains("mcp_servers"));
}

#[test]
fn test_unknown_server_exits_not_found() {
    let cache = tempfile::tempdir().unwrap();

    let output = mcpman(cache.path(), &["tools", "ghost"]);
    assert_eq!(output.status.code(), Some(66));
    assert!(String::from_utf8_lossy(&output.stderr).contains("ghost"));
}

#[test]
fn test_install_query_and_remove() {
    let cache = tempfile::tempdir().unwrap();
    let sources = tempfile::tempdir().unwrap();
    let source = write_stub(sources.path(), "fetch");

    let output = mcpman(cache.path(), &["install", &source]);
    assert!(output.status.success(), "{output:?}");
    assert!(cache.path().join("mcp_servers").join("fetch").is_file());

    let output = mcpman(cache.path(), &["ls"]);
    let text = stdout(&output);
    assert!(text.contains("fetch"));
    assert!(text.contains("loaded"));

    let output = mcpman(cache.path(), &["tools", "fetch", "--json"]);
    assert!(output.status.success(), "{output:?}");
    let tools: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(tools[0]["name"], "fetch");

    let output = mcpman(cache.path(), &["install", &source]);
    assert_eq!(output.status.code(), Some(65));

    let output = mcpman(cache.path(), &["rm", "fetch"]);
    assert!(output.status.success());
    assert!(!cache.path().join("mcp_servers").join("fetch").exists());

    let output = mcpman(cache.path(), &["rm", "fetch"]);
    assert_eq!(output.status.code(), Some(66));
}

#[test]
fn test_remote_source_is_a_usage_error() {
    let cache = tempfile::tempdir().unwrap();

    let output = mcpman(cache.path(), &["install", "https://example.com/fetch"]);
    assert_eq!(output.status.code(), Some(2));
}

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tether Authors

use super::*;
use tempfile::TempDir;
use tokio::time::{timeout, Duration};

#[test]
fn read_request_parses_hook_payload() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("permission-request-xyz.json");
    std::fs::write(
        &path,
        r#"{"requestId":"xyz","toolName":"Bash","toolInput":"rm -rf /tmp/test"}"#,
    )
    .unwrap();

    let request = read_request(&path).unwrap();
    assert_eq!(request.request_id, RequestId::new("xyz"));
    assert_eq!(request.tool_name, "Bash");
    assert_eq!(request.tool_input, serde_json::json!("rm -rf /tmp/test"));
    assert_eq!(request.tool_command, None);
    assert_eq!(request.file_path, path);
}

#[test]
fn read_request_ignores_unrelated_files() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("notes.json");
    std::fs::write(&path, r#"{"requestId":"x","toolName":"Bash"}"#).unwrap();
    assert!(read_request(&path).is_none());
}

#[test]
fn read_request_previews_transcript_command() {
    let dir = TempDir::new().unwrap();
    let transcript = dir.path().join("t.jsonl");
    std::fs::write(
        &transcript,
        concat!(
            r#"{"type":"assistant","message":{"content":[{"type":"tool_use","name":"Bash","input":{"command":"cargo build"}}]}}"#,
            "\n",
        ),
    )
    .unwrap();

    let path = dir.path().join("permission-request-p1.json");
    std::fs::write(
        &path,
        format!(
            r#"{{"requestId":"p1","toolName":"Bash","toolInput":{{}},"transcriptPath":"{}"}}"#,
            transcript.display()
        ),
    )
    .unwrap();

    let request = read_request(&path).unwrap();
    assert_eq!(request.tool_command.as_deref(), Some("cargo build"));
}

#[test]
fn read_request_with_unreadable_transcript_has_no_preview() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("permission-request-p2.json");
    std::fs::write(
        &path,
        r#"{"requestId":"p2","toolName":"Bash","toolInput":{},"transcriptPath":"/nonexistent/t.jsonl"}"#,
    )
    .unwrap();

    let request = read_request(&path).unwrap();
    assert_eq!(request.tool_command, None);
}

#[test]
fn respond_writes_literal_action() {
    let dir = TempDir::new().unwrap();
    let state = dir.path().join("cfg");
    respond_to_permission(&state, &RequestId::new("xyz"), PermissionAction::Approve).unwrap();
    let content = std::fs::read_to_string(state.join("permission-response-xyz")).unwrap();
    assert_eq!(content, "approve");

    respond_to_permission(&state, &RequestId::new("n"), PermissionAction::Deny).unwrap();
    let content = std::fs::read_to_string(state.join("permission-response-n")).unwrap();
    assert_eq!(content, "deny");
}

#[tokio::test]
async fn watcher_surfaces_each_request_once() {
    let dir = TempDir::new().unwrap();
    let (tx, mut rx) = mpsc::channel(8);
    let _watcher = watch_permission_requests(dir.path(), tx).unwrap();

    let path = dir.path().join("permission-request-w1.json");
    std::fs::write(
        &path,
        r#"{"requestId":"w1","toolName":"Write","toolInput":{"file_path":"/tmp/x"}}"#,
    )
    .unwrap();

    let request = timeout(Duration::from_secs(2), rx.recv())
        .await
        .ok()
        .flatten()
        .expect("request surfaced");
    assert_eq!(request.request_id, RequestId::new("w1"));
    assert_eq!(request.tool_name, "Write");

    // Touch the same file again: already-seen ids stay silent.
    let raw = std::fs::read_to_string(&path).unwrap();
    std::fs::write(&path, raw).unwrap();
    assert!(
        timeout(Duration::from_millis(300), rx.recv()).await.is_err(),
        "duplicate events for one request must be suppressed"
    );
}

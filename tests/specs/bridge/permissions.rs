//! Permission round-trip: hook request file in, approve/deny file out,
//! keystroke into the pane.

use crate::prelude::*;
use std::time::Duration;
use tokio::sync::mpsc;

#[tokio::test]
#[serial_test::serial]
async fn request_file_becomes_buttons_and_approve_becomes_a_file() {
    let b = bridge();

    let (tx, mut rx) = mpsc::channel(4);
    let _watcher =
        tether_adapters::watch_permission_requests(b.store.dir(), tx).expect("watcher starts");

    std::fs::write(
        b.store.dir().join("permission-request-xyz.json"),
        r#"{"requestId":"xyz","toolName":"Bash","toolInput":"rm -rf /tmp/test"}"#,
    )
    .unwrap();

    let request = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .ok()
        .flatten()
        .expect("request surfaced");
    assert_eq!(request.request_id.as_str(), "xyz");
    assert_eq!(request.tool_name, "Bash");
    assert!(request.tool_command.is_none());

    b.store.set_chat_id(CHAT);
    b.coordinator.handle_permission(request).await;
    let keyboards = b.chat.sent_keyboards();
    assert_eq!(keyboards.len(), 1);

    b.user_taps("perm:xyz:approve").await;
    let response = b.store.dir().join("permission-response-xyz");
    assert_eq!(std::fs::read_to_string(response).unwrap(), "approve");
    assert!(
        b.mux.sent_keys("%1").contains(&"1".to_string()),
        "the approve keystroke must also land in the pane"
    );
}

#[tokio::test]
#[serial_test::serial]
async fn deny_writes_the_literal_deny() {
    let b = bridge();
    b.user_taps("perm:abc:deny").await;
    assert_eq!(
        std::fs::read_to_string(b.store.dir().join("permission-response-abc")).unwrap(),
        "deny"
    );
    assert!(b.mux.sent_keys("%1").contains(&"Escape".to_string()));
}

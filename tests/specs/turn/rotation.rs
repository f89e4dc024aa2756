//! Session rotation: compaction and `/clear` move the conversation to a new
//! transcript; the bridge follows.

use crate::prelude::*;
use std::time::Duration;
use tether_core::SessionId;

#[tokio::test]
#[serial_test::serial]
async fn newest_file_wins_even_when_metadata_only() {
    let b = bridge();
    b.agent_says(&b.transcript(), "content in the old file");
    let fresh = b.rotate_to("fresh");

    let (session_id, path) = b
        .index
        .latest_session_file_for_cwd(&b.cwd)
        .expect("resolved");
    assert_eq!(session_id, SessionId::new("fresh"));
    assert_eq!(path, fresh);
}

#[tokio::test]
#[serial_test::serial]
async fn the_watch_follows_a_rotation_with_a_zero_baseline() {
    let b = bridge();
    b.user_says("please /clear").await;

    tokio::time::sleep(Duration::from_millis(50)).await;
    let fresh = b.rotate_to("fresh");

    // Give the rotation poll a few intervals, then write to the new file
    // only; its content must flow through despite never being injected at.
    tokio::time::sleep(Duration::from_millis(400)).await;
    b.agent_says(&fresh, "hello from the new session");
    b.agent_finishes(&fresh);

    b.wait_until("rotated text relayed", || {
        b.chat
            .sent_texts()
            .contains(&"hello from the new session".to_string())
    })
    .await;
    b.wait_until("turn closed", || !b.manager.is_active()).await;

    // The attached marker now names the new session.
    assert_eq!(
        b.store.attached().map(|a| a.session_id),
        Some(SessionId::new("fresh"))
    );
}

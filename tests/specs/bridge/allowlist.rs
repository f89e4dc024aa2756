//! Allowlist: a configured chat id admits only itself, before any handler.

use crate::prelude::*;
use std::time::Duration;
use tether_core::ChatId;

#[tokio::test]
#[serial_test::serial]
async fn foreign_chats_produce_zero_outbound_messages() {
    let b = bridge_with_allowlist(Some(ChatId(42)));

    b.user_says("hello?").await;
    b.user_runs("status", "").await;
    b.user_runs("sessions", "").await;
    b.user_taps("attach:s1").await;

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(b.chat.outbound_count(), 0, "got {:?}", b.chat.calls());
    assert!(b.mux.calls().is_empty(), "got {:?}", b.mux.calls());
}

#[tokio::test]
#[serial_test::serial]
async fn the_configured_chat_passes() {
    let b = bridge_with_allowlist(Some(CHAT));
    b.user_runs("status", "").await;
    assert!(b.chat.outbound_count() > 0);
}

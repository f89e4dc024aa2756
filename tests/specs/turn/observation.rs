//! Turn observation: what lands in the chat from transcript appends.

use crate::prelude::*;

#[tokio::test]
#[serial_test::serial]
async fn text_block_after_baseline_reaches_the_chat() {
    let b = bridge();
    b.user_says("build it").await;

    b.agent_says(&b.transcript(), "Build succeeded.");
    b.wait_until("text relayed", || {
        b.chat.sent_texts().contains(&"Build succeeded.".to_string())
    })
    .await;

    // The turn is still open until a result record lands.
    assert!(b.manager.is_active());
    b.agent_finishes(&b.transcript());
    b.wait_until("turn closed", || !b.manager.is_active()).await;
}

#[tokio::test]
#[serial_test::serial]
async fn content_written_before_injection_is_never_relayed() {
    let b = bridge();
    b.agent_says(&b.transcript(), "Old message.");

    b.user_says("next task").await;
    b.agent_finishes(&b.transcript());
    b.wait_until("turn closed", || !b.manager.is_active()).await;

    assert!(
        !b.chat.sent_texts().contains(&"Old message.".to_string()),
        "pre-baseline content leaked: {:?}",
        b.chat.sent_texts()
    );
}

#[tokio::test]
#[serial_test::serial]
async fn duplicate_flushes_of_one_block_are_relayed_once() {
    let b = bridge();
    b.user_says("go").await;

    b.agent_says(&b.transcript(), "Same block.");
    b.agent_says(&b.transcript(), "Same block.");
    b.agent_finishes(&b.transcript());
    b.wait_until("turn closed", || !b.manager.is_active()).await;

    let count = b
        .chat
        .sent_texts()
        .iter()
        .filter(|t| *t == "Same block.")
        .count();
    assert_eq!(count, 1, "got {:?}", b.chat.sent_texts());
}

#[tokio::test]
#[serial_test::serial]
async fn distinct_blocks_arrive_in_append_order() {
    let b = bridge();
    b.user_says("go").await;

    b.agent_says(&b.transcript(), "block A");
    b.agent_says(&b.transcript(), "block B");
    b.agent_finishes(&b.transcript());
    b.wait_until("turn closed", || !b.manager.is_active()).await;

    let texts = b.chat.sent_texts();
    let a = texts.iter().position(|t| t == "block A").expect("block A");
    let b_pos = texts.iter().position(|t| t == "block B").expect("block B");
    assert!(a < b_pos, "out of order: {texts:?}");
}

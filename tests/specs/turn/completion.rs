//! Turn termination: exactly one completion per armed turn.

use crate::prelude::*;

#[tokio::test]
#[serial_test::serial]
async fn a_new_message_supersedes_the_running_turn() {
    let b = bridge();
    b.user_says("first").await;
    assert!(b.manager.is_active());

    b.user_says("second").await;

    // The first turn was interrupted: Escape went to the pane, and both
    // messages were typed in order.
    assert!(b.mux.sent_keys("%1").contains(&"Escape".to_string()));
    assert_eq!(b.mux.sent_text("%1"), vec!["first", "second"]);
    assert!(b.manager.is_active(), "the second turn is now running");

    b.agent_finishes(&b.transcript());
    b.wait_until("turn closed", || !b.manager.is_active()).await;
}

#[tokio::test]
#[serial_test::serial]
async fn silent_turns_close_with_a_done_notice() {
    let b = bridge();
    b.user_says("quick one").await;

    b.agent_finishes(&b.transcript());
    b.wait_until("done notice", || {
        b.chat.sent_texts().iter().any(|t| t.starts_with("✅"))
    })
    .await;
    assert!(!b.manager.is_active());
}

#[tokio::test]
#[serial_test::serial]
async fn chatty_turns_skip_the_done_notice() {
    let b = bridge();
    b.user_says("talk to me").await;

    b.agent_says(&b.transcript(), "Here you go.");
    b.agent_finishes(&b.transcript());
    b.wait_until("turn closed", || !b.manager.is_active()).await;

    assert!(
        !b.chat.sent_texts().iter().any(|t| t.starts_with("✅")),
        "done notice should be suppressed after text: {:?}",
        b.chat.sent_texts()
    );
}

//! Session listing and the picker flow.

use crate::prelude::*;
use std::time::Duration;
use tether_core::paths::encode_cwd;
use tether_core::SessionId;

#[tokio::test]
#[serial_test::serial]
async fn one_entry_per_project_newest_first() {
    let b = bridge();

    // A second project with two transcripts; only the newest counts.
    let other_cwd = std::path::PathBuf::from("/tmp/spec-other");
    let other_dir = b.projects.path().join(encode_cwd(&other_cwd));
    std::fs::create_dir_all(&other_dir).unwrap();
    std::fs::write(other_dir.join("stale.jsonl"), "").unwrap();
    let newest = other_dir.join("current.jsonl");
    std::fs::write(&newest, "").unwrap();
    let later = std::time::SystemTime::now() + Duration::from_secs(60);
    std::fs::File::options()
        .append(true)
        .open(&newest)
        .unwrap()
        .set_modified(later)
        .unwrap();

    let sessions = b.index.list_sessions(10);
    assert_eq!(sessions.len(), 2, "one entry per project: {sessions:?}");
    assert_eq!(sessions[0].session_id, SessionId::new("current"));
    assert!(sessions
        .iter()
        .all(|s| s.session_id != SessionId::new("stale")));
}

#[tokio::test]
#[serial_test::serial]
async fn picker_tap_attaches_when_the_agent_is_running() {
    let b = bridge();
    b.store.clear_attached();

    b.user_runs("sessions", "").await;
    let keyboards = b.chat.sent_keyboards();
    assert_eq!(keyboards.len(), 1);
    let data = &keyboards[0].rows[0][0].data;
    assert_eq!(data, "attach:s1");

    b.user_taps("attach:s1").await;
    assert_eq!(
        b.store.attached().map(|a| a.session_id),
        Some(SessionId::new("s1"))
    );
}

#[tokio::test]
#[serial_test::serial]
async fn picker_tap_without_agent_offers_launching() {
    let b = bridge();
    // A second agent pane keeps the sole-candidate rule from kicking in for
    // cwds no pane matches.
    b.mux
        .add_pane("%2", 101, "claude", std::path::Path::new("/tmp/unrelated"));

    // A project with a transcript but no pane anywhere near it.
    let lonely_cwd = std::path::PathBuf::from("/tmp/spec-lonely");
    let lonely_dir = b.projects.path().join(encode_cwd(&lonely_cwd));
    std::fs::create_dir_all(&lonely_dir).unwrap();
    let newest = lonely_dir.join("s9.jsonl");
    std::fs::write(&newest, "").unwrap();
    let later = std::time::SystemTime::now() + Duration::from_secs(60);
    std::fs::File::options()
        .append(true)
        .open(&newest)
        .unwrap()
        .set_modified(later)
        .unwrap();

    b.user_runs("sessions", "").await;
    b.user_taps("attach:s9").await;

    let keyboards = b.chat.sent_keyboards();
    let launch_offer = keyboards.last().expect("launch keyboard");
    let data: Vec<_> = launch_offer
        .rows
        .iter()
        .flatten()
        .map(|btn| btn.data.clone())
        .collect();
    assert!(data.contains(&"launch:s9:run".to_string()), "got {data:?}");
    assert!(data.contains(&"launch:s9:skip".to_string()));
}

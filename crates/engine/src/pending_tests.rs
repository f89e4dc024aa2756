// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tether Authors

use super::*;
use std::path::PathBuf;

fn image(n: u8) -> PendingImage {
    PendingImage {
        media_type: "image/png".to_string(),
        data: format!("data{n}"),
    }
}

#[test]
fn image_batches_are_single_use() {
    let pending = PendingTables::new();
    let key = pending.stash_images(vec![image(1), image(2)]);

    assert_eq!(pending.newest_image_batch(), Some((key.clone(), 2)));
    let batch = pending.take_images(&key).unwrap();
    assert_eq!(batch.len(), 2);
    assert!(pending.take_images(&key).is_none());
    assert!(pending.newest_image_batch().is_none());
}

#[test]
fn colliding_stash_keys_are_bumped() {
    let pending = PendingTables::new();
    let a = pending.stash_images(vec![image(1)]);
    let b = pending.stash_images(vec![image(2)]);
    assert_ne!(a, b);
}

#[test]
fn sessions_are_remembered_for_the_picker() {
    let pending = PendingTables::new();
    let session = PendingSession {
        cwd: PathBuf::from("/p"),
        project_name: "p".to_string(),
    };
    pending.remember_session(SessionId::new("s1"), session.clone());
    assert_eq!(pending.session(&SessionId::new("s1")), Some(session));
    assert!(pending.session(&SessionId::new("s2")).is_none());
}

#[test]
fn input_mode_is_take_once() {
    let pending = PendingTables::new();
    assert_eq!(pending.take_input(), InputMode::None);
    pending.set_input(InputMode::AwaitTimerFrequency);
    assert_eq!(pending.take_input(), InputMode::AwaitTimerFrequency);
    assert_eq!(pending.take_input(), InputMode::None);
}

#[test]
fn launched_pane_is_remembered() {
    let pending = PendingTables::new();
    assert!(pending.launched_pane().is_none());
    pending.set_launched_pane(PaneId::new("%5"));
    assert_eq!(pending.launched_pane(), Some(PaneId::new("%5")));
}

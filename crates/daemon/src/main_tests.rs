// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tether Authors

use super::*;
use tempfile::TempDir;

#[test]
fn small_logs_are_left_alone() {
    let dir = TempDir::new().unwrap();
    let log = dir.path().join("daemon.log");
    std::fs::write(&log, "short").unwrap();
    rotate_log_if_needed(&log);
    assert!(log.exists());
    assert!(!dir.path().join("daemon.log.1").exists());
}

#[test]
fn oversized_logs_are_shifted() {
    let dir = TempDir::new().unwrap();
    let log = dir.path().join("daemon.log");
    std::fs::write(&log, vec![b'x'; (MAX_LOG_SIZE + 1) as usize]).unwrap();
    std::fs::write(dir.path().join("daemon.log.1"), "older").unwrap();

    rotate_log_if_needed(&log);

    assert!(!log.exists());
    assert_eq!(
        std::fs::read(dir.path().join("daemon.log.1")).unwrap().len(),
        (MAX_LOG_SIZE + 1) as usize
    );
    assert_eq!(
        std::fs::read_to_string(dir.path().join("daemon.log.2")).unwrap(),
        "older"
    );
}

#[test]
fn missing_log_is_a_no_op() {
    let dir = TempDir::new().unwrap();
    rotate_log_if_needed(&dir.path().join("daemon.log"));
}

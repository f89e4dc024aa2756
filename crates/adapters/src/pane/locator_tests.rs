// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tether Authors

use super::*;
use crate::pane::{FakeMuxAdapter, MuxCall};
use std::path::PathBuf;
use yare::parameterized;

fn pane(id: &str, pid: u32, command: &str, cwd: &str) -> Pane {
    Pane {
        pane_id: PaneId::new(id),
        shell_pid: pid,
        command: command.to_string(),
        cwd: PathBuf::from(cwd),
    }
}

#[parameterized(
    literal = { "claude", true },
    path = { "/usr/local/bin/claude", true },
    version_title = { "1.0.44", true },
    spaced_version = { "✳ 2.1.7", true },
    shell = { "zsh", false },
    two_fields = { "1.0", false },
    four_fields = { "1.0.0.1", false },
    non_numeric = { "a.b.c", false },
)]
fn agent_command_recognition(command: &str, expected: bool) {
    assert_eq!(is_agent_command(command), expected);
}

#[test]
fn no_panes_means_no_mux() {
    let outcome = pick_pane(&[], &HashMap::new(), Path::new("/p"));
    assert_eq!(outcome, FindOutcome::NotFound(NotFoundReason::NoMux));
}

#[test]
fn shell_only_panes_mean_no_agent() {
    let panes = [pane("%0", 1, "zsh", "/p"), pane("%1", 2, "vim", "/p")];
    let outcome = pick_pane(&panes, &HashMap::new(), Path::new("/p"));
    assert_eq!(outcome, FindOutcome::NotFound(NotFoundReason::NoAgentPane));
}

#[test]
fn exact_cwd_match_wins() {
    let panes = [
        pane("%0", 1, "claude", "/other"),
        pane("%1", 2, "claude", "/p"),
    ];
    let outcome = pick_pane(&panes, &HashMap::new(), Path::new("/p"));
    assert_eq!(outcome, FindOutcome::Found(PaneId::new("%1")));
}

#[test]
fn strict_parent_match_wins_when_no_exact() {
    let panes = [
        pane("%0", 1, "claude", "/other"),
        pane("%1", 2, "claude", "/p"),
    ];
    let outcome = pick_pane(&panes, &HashMap::new(), Path::new("/p/sub/dir"));
    assert_eq!(outcome, FindOutcome::Found(PaneId::new("%1")));
}

#[test]
fn parent_match_is_component_wise_not_prefix() {
    // `/p/subdir` is not a parent of `/p/sub`; with two candidates and no
    // start times the lookup stays ambiguous instead of guessing.
    let panes = [
        pane("%0", 1, "claude", "/p/subdir"),
        pane("%1", 2, "claude", "/x"),
    ];
    let outcome = pick_pane(&panes, &HashMap::new(), Path::new("/p/sub"));
    assert_eq!(outcome, FindOutcome::NotFound(NotFoundReason::Ambiguous));
}

#[test]
fn freshest_child_start_breaks_exact_ties() {
    let panes = [
        pane("%0", 10, "claude", "/p"),
        pane("%1", 20, "claude", "/p"),
    ];
    let mut starts = HashMap::new();
    starts.insert(PaneId::new("%0"), 1_000);
    starts.insert(PaneId::new("%1"), 2_000);
    let outcome = pick_pane(&panes, &starts, Path::new("/p"));
    assert_eq!(outcome, FindOutcome::Found(PaneId::new("%1")));
}

#[test]
fn missing_start_time_sorts_oldest() {
    let panes = [
        pane("%0", 10, "claude", "/p"),
        pane("%1", 20, "claude", "/p"),
    ];
    let mut starts = HashMap::new();
    starts.insert(PaneId::new("%0"), 5);
    let outcome = pick_pane(&panes, &starts, Path::new("/p"));
    assert_eq!(outcome, FindOutcome::Found(PaneId::new("%0")));
}

#[test]
fn no_start_information_is_ambiguous() {
    let panes = [
        pane("%0", 10, "claude", "/p"),
        pane("%1", 20, "claude", "/p"),
    ];
    let outcome = pick_pane(&panes, &HashMap::new(), Path::new("/p"));
    assert_eq!(outcome, FindOutcome::NotFound(NotFoundReason::Ambiguous));
}

#[test]
fn sole_candidate_wins_without_cwd_match() {
    let panes = [pane("%0", 1, "claude", "/elsewhere"), pane("%1", 2, "zsh", "/p")];
    let outcome = pick_pane(&panes, &HashMap::new(), Path::new("/p"));
    assert_eq!(outcome, FindOutcome::Found(PaneId::new("%0")));
}

#[test]
fn launch_command_carries_skip_flag() {
    assert_eq!(launch_command(false), "claude -c");
    assert_eq!(
        launch_command(true),
        "claude -c --dangerously-skip-permissions"
    );
}

#[tokio::test]
#[serial_test::serial]
async fn launch_types_then_submits_separately() {
    let mux = FakeMuxAdapter::new();
    let dir = tempfile::TempDir::new().unwrap();
    std::env::set_var("TETHER_KEY_DELAY_MS", "1");
    let pane = launch(&mux, dir.path(), "my proj", false).await.unwrap();

    let calls = mux.calls();
    assert!(matches!(
        &calls[0],
        MuxCall::NewWindow { name, .. } if name == "my-proj"
    ));
    assert!(matches!(
        &calls[1],
        MuxCall::SendText { text, .. } if text == "claude -c"
    ));
    assert!(matches!(
        &calls[2],
        MuxCall::SendKey { key, .. } if key == "Enter"
    ));
    let listed = mux.list_panes().await;
    assert!(listed.iter().any(|p| p.pane_id == pane));
}

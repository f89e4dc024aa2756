//! Pane resolution is a deterministic function of pane contents.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tether_adapters::locator::{pick_pane, FindOutcome};
use tether_adapters::Pane;
use tether_core::PaneId;

fn pane(id: &str, pid: u32, command: &str, cwd: &str) -> Pane {
    Pane {
        pane_id: PaneId::new(id),
        shell_pid: pid,
        command: command.to_string(),
        cwd: PathBuf::from(cwd),
    }
}

#[test]
fn resolution_is_stable_across_repeated_calls() {
    let panes = [
        pane("%0", 10, "claude", "/work/api"),
        pane("%1", 11, "claude", "/work/api"),
        pane("%2", 12, "zsh", "/work/api"),
        pane("%3", 13, "1.0.44", "/work"),
    ];
    let mut starts = HashMap::new();
    starts.insert(PaneId::new("%0"), 1_000u64);
    starts.insert(PaneId::new("%1"), 2_000u64);

    let first = pick_pane(&panes, &starts, Path::new("/work/api"));
    for _ in 0..50 {
        assert_eq!(first, pick_pane(&panes, &starts, Path::new("/work/api")));
    }
    assert_eq!(first, FindOutcome::Found(PaneId::new("%1")));
}

#[test]
fn a_missing_start_time_counts_as_oldest() {
    let panes = [
        pane("%0", 10, "claude", "/work/api"),
        pane("%1", 11, "claude", "/work/api"),
    ];
    let mut starts = HashMap::new();
    starts.insert(PaneId::new("%0"), 1u64);

    // %1 has no known start time; the one known time wins however small.
    assert_eq!(
        pick_pane(&panes, &starts, Path::new("/work/api")),
        FindOutcome::Found(PaneId::new("%0"))
    );
}

#[test]
fn parent_directory_panes_serve_nested_cwds() {
    let panes = [pane("%0", 10, "claude", "/work")];
    assert_eq!(
        pick_pane(&panes, &HashMap::new(), Path::new("/work/api/src")),
        FindOutcome::Found(PaneId::new("%0"))
    );
}

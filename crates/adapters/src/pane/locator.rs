// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tether Authors

//! Pane resolution: which pane is running the agent for a given cwd.

use super::{MuxAdapter, MuxError, Pane};
use crate::env;
use std::collections::HashMap;
use std::path::Path;
use tether_core::paths::sanitize_window_name;
use tether_core::PaneId;

/// Resume-launch command typed into a fresh pane.
const LAUNCH_COMMAND: &str = "claude -c";
const SKIP_PERMISSIONS_FLAG: &str = "--dangerously-skip-permissions";

/// Why no pane could be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundReason {
    /// The multiplexer reported no panes at all (it may not be running).
    NoMux,
    /// Panes exist, but none is recognisably running the agent.
    NoAgentPane,
    /// Several agent panes compete and nothing breaks the tie.
    Ambiguous,
}

impl std::fmt::Display for NotFoundReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NotFoundReason::NoMux => "tmux is not running",
            NotFoundReason::NoAgentPane => "no pane is running the agent",
            NotFoundReason::Ambiguous => "several agent panes match",
        };
        write!(f, "{s}")
    }
}

/// Outcome of a pane lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FindOutcome {
    Found(PaneId),
    NotFound(NotFoundReason),
}

impl FindOutcome {
    pub fn found(&self) -> Option<&PaneId> {
        match self {
            FindOutcome::Found(id) => Some(id),
            FindOutcome::NotFound(_) => None,
        }
    }
}

/// Whether a pane's reported command is recognisable as the agent: the
/// literal `claude` as a substring, or a dotted three-field version string
/// (the agent advertises its version as the process title).
pub fn is_agent_command(command: &str) -> bool {
    command.contains("claude") || command.split_whitespace().any(looks_like_version)
}

fn looks_like_version(token: &str) -> bool {
    let fields: Vec<&str> = token.split('.').collect();
    fields.len() == 3
        && fields
            .iter()
            .all(|f| !f.is_empty() && f.chars().all(|c| c.is_ascii_digit()))
}

/// Resolve the agent pane for `target` from enumerated panes plus the agent
/// child start times gathered per shell pid. Pure, so the resolution order
/// is testable without a multiplexer:
///
/// 1. exactly one pane at the cwd wins;
/// 2. else exactly one pane at a strict parent directory wins;
/// 3. else the freshest agent child process wins (a stale pane the user
///    quit from keeps an older shell history; the newest spawn is the one
///    they mean), missing start times sorting oldest;
/// 4. else a sole remaining candidate wins regardless of cwd.
pub fn pick_pane(
    panes: &[Pane],
    starts: &HashMap<PaneId, u64>,
    target: &Path,
) -> FindOutcome {
    if panes.is_empty() {
        return FindOutcome::NotFound(NotFoundReason::NoMux);
    }

    let candidates: Vec<&Pane> = panes.iter().filter(|p| is_agent_command(&p.command)).collect();
    if candidates.is_empty() {
        return FindOutcome::NotFound(NotFoundReason::NoAgentPane);
    }

    let exact: Vec<&&Pane> = candidates.iter().filter(|p| p.cwd == target).collect();
    if exact.len() == 1 {
        return FindOutcome::Found(exact[0].pane_id.clone());
    }

    if exact.is_empty() {
        let parents: Vec<&&Pane> = candidates
            .iter()
            .filter(|p| target.starts_with(&p.cwd) && p.cwd != target)
            .collect();
        if parents.len() == 1 {
            return FindOutcome::Found(parents[0].pane_id.clone());
        }
        if parents.len() > 1 {
            return break_tie(&parents, starts);
        }
    } else {
        return break_tie(&exact, starts);
    }

    if candidates.len() == 1 {
        return FindOutcome::Found(candidates[0].pane_id.clone());
    }
    break_tie(&candidates.iter().collect::<Vec<_>>(), starts)
}

/// Most recently started agent child wins; a missing start time counts as 0.
/// With no start information at all the set stays ambiguous.
fn break_tie(tied: &[&&Pane], starts: &HashMap<PaneId, u64>) -> FindOutcome {
    if tied.iter().all(|p| !starts.contains_key(&p.pane_id)) {
        return FindOutcome::NotFound(NotFoundReason::Ambiguous);
    }
    let winner = tied
        .iter()
        .max_by_key(|p| starts.get(&p.pane_id).copied().unwrap_or(0));
    match winner {
        Some(p) => FindOutcome::Found(p.pane_id.clone()),
        None => FindOutcome::NotFound(NotFoundReason::Ambiguous),
    }
}

/// Locate the agent pane for `target` through the multiplexer.
pub async fn find<M: MuxAdapter>(mux: &M, target: &Path) -> FindOutcome {
    let panes = mux.list_panes().await;
    let mut starts = HashMap::new();
    for pane in panes.iter().filter(|p| is_agent_command(&p.command)) {
        if let Some(start) = mux.agent_child_start(pane.shell_pid).await {
            starts.insert(pane.pane_id.clone(), start);
        }
    }
    pick_pane(&panes, &starts, target)
}

/// The command line typed into a freshly launched pane.
pub fn launch_command(skip_permissions: bool) -> String {
    if skip_permissions {
        format!("{LAUNCH_COMMAND} {SKIP_PERMISSIONS_FLAG}")
    } else {
        LAUNCH_COMMAND.to_string()
    }
}

/// Open a new window at `cwd` and start the agent in it. Text and submit go
/// out as two separate keystroke commands; submitting in the same command
/// fires before the text is registered.
pub async fn launch<M: MuxAdapter>(
    mux: &M,
    cwd: &Path,
    project_name: &str,
    skip_permissions: bool,
) -> Result<PaneId, MuxError> {
    let window = sanitize_window_name(project_name);
    let pane = mux.new_window(&window, cwd).await?;
    mux.send_text(&pane, &launch_command(skip_permissions)).await?;
    tokio::time::sleep(env::key_delay()).await;
    mux.send_key(&pane, "Enter").await?;
    Ok(pane)
}

#[cfg(test)]
#[path = "locator_tests.rs"]
mod tests;

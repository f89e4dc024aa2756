// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tether Authors

//! Fake multiplexer adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{MuxAdapter, MuxError, Pane};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tether_core::PaneId;

/// Recorded multiplexer call
#[derive(Debug, Clone, PartialEq)]
pub enum MuxCall {
    SendText { pane: PaneId, text: String },
    SendKey { pane: PaneId, key: String },
    NewWindow { name: String, cwd: PathBuf },
    KillWindow { pane: PaneId },
}

#[derive(Default)]
struct FakeMuxState {
    panes: Vec<Pane>,
    starts: HashMap<u32, u64>,
    calls: Vec<MuxCall>,
    next_window: u64,
    fail_sends: bool,
}

/// Fake multiplexer adapter for testing
#[derive(Clone, Default)]
pub struct FakeMuxAdapter {
    inner: Arc<Mutex<FakeMuxState>>,
}

impl FakeMuxAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pane to the enumeration.
    pub fn add_pane(&self, pane_id: &str, shell_pid: u32, command: &str, cwd: &Path) {
        self.inner.lock().panes.push(Pane {
            pane_id: PaneId::new(pane_id),
            shell_pid,
            command: command.to_string(),
            cwd: cwd.to_path_buf(),
        });
    }

    /// Set the agent child start time reported for a shell pid.
    pub fn set_child_start(&self, shell_pid: u32, start: u64) {
        self.inner.lock().starts.insert(shell_pid, start);
    }

    /// Make subsequent send calls fail.
    pub fn fail_sends(&self) {
        self.inner.lock().fail_sends = true;
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<MuxCall> {
        self.inner.lock().calls.clone()
    }

    /// All text sent to the given pane, in order.
    pub fn sent_text(&self, pane: &str) -> Vec<String> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                MuxCall::SendText { pane: p, text } if *p == pane => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// All named keys sent to the given pane, in order.
    pub fn sent_keys(&self, pane: &str) -> Vec<String> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                MuxCall::SendKey { pane: p, key } if *p == pane => Some(key.clone()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl MuxAdapter for FakeMuxAdapter {
    async fn list_panes(&self) -> Vec<Pane> {
        self.inner.lock().panes.clone()
    }

    async fn send_text(&self, pane: &PaneId, text: &str) -> Result<(), MuxError> {
        let mut state = self.inner.lock();
        if state.fail_sends {
            return Err(MuxError::NotFound(pane.to_string()));
        }
        state.calls.push(MuxCall::SendText {
            pane: pane.clone(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn send_key(&self, pane: &PaneId, key: &str) -> Result<(), MuxError> {
        let mut state = self.inner.lock();
        if state.fail_sends {
            return Err(MuxError::NotFound(pane.to_string()));
        }
        state.calls.push(MuxCall::SendKey {
            pane: pane.clone(),
            key: key.to_string(),
        });
        Ok(())
    }

    async fn new_window(&self, name: &str, cwd: &Path) -> Result<PaneId, MuxError> {
        let mut state = self.inner.lock();
        state.next_window += 1;
        let pane_id = PaneId::new(format!("%f{}", state.next_window));
        state.calls.push(MuxCall::NewWindow {
            name: name.to_string(),
            cwd: cwd.to_path_buf(),
        });
        let shell_pid = 90_000 + state.next_window as u32;
        state.panes.push(Pane {
            pane_id: pane_id.clone(),
            shell_pid,
            command: "claude".to_string(),
            cwd: cwd.to_path_buf(),
        });
        Ok(pane_id)
    }

    async fn kill_window(&self, pane: &PaneId) -> Result<(), MuxError> {
        let mut state = self.inner.lock();
        state.calls.push(MuxCall::KillWindow { pane: pane.clone() });
        state.panes.retain(|p| p.pane_id != *pane);
        Ok(())
    }

    async fn agent_child_start(&self, shell_pid: u32) -> Option<u64> {
        self.inner.lock().starts.get(&shell_pid).copied()
    }
}

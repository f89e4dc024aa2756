// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tether Authors

//! Terminal multiplexer adapters

pub mod locator;
mod tmux;

pub use tmux::TmuxAdapter;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeMuxAdapter, MuxCall};

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tether_core::PaneId;
use thiserror::Error;

/// Errors from multiplexer operations
#[derive(Debug, Error)]
pub enum MuxError {
    #[error("pane not found: {0}")]
    NotFound(String),
    #[error("spawn failed: {0}")]
    SpawnFailed(String),
    #[error("command failed: {0}")]
    CommandFailed(String),
}

/// One multiplexer pane as reported by enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pane {
    pub pane_id: PaneId,
    /// Pid of the shell process owning the pane.
    pub shell_pid: u32,
    /// Current foreground command of the pane.
    pub command: String,
    pub cwd: PathBuf,
}

/// Adapter for driving the terminal multiplexer (tmux)
#[async_trait]
pub trait MuxAdapter: Clone + Send + Sync + 'static {
    /// Enumerate all panes across all sessions. Failure yields an empty
    /// list; the multiplexer may simply be absent.
    async fn list_panes(&self) -> Vec<Pane>;

    /// Send literal text to a pane (no key-name interpretation, no submit).
    async fn send_text(&self, pane: &PaneId, text: &str) -> Result<(), MuxError>;

    /// Send a single named key (`Enter`, `Escape`, `1`, ...) to a pane.
    async fn send_key(&self, pane: &PaneId, key: &str) -> Result<(), MuxError>;

    /// Create a new window at `cwd` and return the id of its pane.
    async fn new_window(&self, name: &str, cwd: &Path) -> Result<PaneId, MuxError>;

    /// Kill the window containing the given pane.
    async fn kill_window(&self, pane: &PaneId) -> Result<(), MuxError>;

    /// Start time (epoch seconds) of the most recently started agent child
    /// of the given shell pid, or `None` when no such child exists.
    async fn agent_child_start(&self, shell_pid: u32) -> Option<u64>;
}

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tether Authors

//! Session-level data carried between the index, the engine, and the chat UI.

use crate::id::SessionId;
use std::path::PathBuf;
use std::time::SystemTime;

/// The `(sessionId, cwd)` pair currently selected as the target of user
/// messages. Persisted as a two-line marker file in the state directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachedSession {
    pub session_id: SessionId,
    pub cwd: PathBuf,
}

/// Snapshot taken immediately before an injection so the turn watcher only
/// considers what the agent appends afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Baseline {
    pub file_path: PathBuf,
    pub session_id: SessionId,
    /// File length in bytes at snapshot time; the watcher ignores
    /// everything at or before this offset.
    pub size: u64,
}

/// One row of the session picker.
#[derive(Debug, Clone)]
pub struct SessionEntry {
    pub session_id: SessionId,
    pub cwd: PathBuf,
    pub project_name: String,
    pub last_message: Option<String>,
    pub mtime: SystemTime,
}

/// Picker state retained between drawing the session list and the tap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSession {
    pub cwd: PathBuf,
    pub project_name: String,
}

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tether Authors

//! Two-file handshake with the agent's permission hook.
//!
//! The hook writes `permission-request-<id>.json` into the bridge state
//! directory and polls for `permission-response-<id>`; it exits 0 on
//! `approve` and 2 on `deny`. The bridge watches the directory, surfaces
//! each request out-of-band, and writes the response file on the operator's
//! tap.

use crate::transcript::last_tool_command;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use serde::Deserialize;
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use tether_core::paths::{permission_request_id, permission_response_file};
use tether_core::RequestId;
use tokio::sync::mpsc;

/// On-disk request payload written by the hook.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RequestFile {
    request_id: String,
    tool_name: String,
    #[serde(default)]
    tool_input: serde_json::Value,
    #[serde(default)]
    transcript_path: Option<PathBuf>,
}

/// A surfaced permission request.
#[derive(Debug, Clone, PartialEq)]
pub struct PermissionRequest {
    pub request_id: RequestId,
    pub tool_name: String,
    pub tool_input: serde_json::Value,
    /// Human-readable preview of the last tool command in the transcript,
    /// when the hook provided a transcript path that could be read.
    pub tool_command: Option<String>,
    pub file_path: PathBuf,
}

/// The operator's verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionAction {
    Approve,
    Deny,
}

impl std::fmt::Display for PermissionAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PermissionAction::Approve => write!(f, "approve"),
            PermissionAction::Deny => write!(f, "deny"),
        }
    }
}

/// Parse one request file into a surfaced request. Unreadable files yield
/// `None`; the hook times out on its own.
pub fn read_request(path: &Path) -> Option<PermissionRequest> {
    let file_name = path.file_name()?.to_string_lossy();
    permission_request_id(&file_name)?;

    let raw = std::fs::read_to_string(path).ok()?;
    let parsed: RequestFile = serde_json::from_str(&raw).ok()?;

    let tool_command = parsed
        .transcript_path
        .as_deref()
        .and_then(last_tool_command);

    Some(PermissionRequest {
        request_id: RequestId::new(parsed.request_id),
        tool_name: parsed.tool_name,
        tool_input: parsed.tool_input,
        tool_command,
        file_path: path.to_path_buf(),
    })
}

/// Watch `dir` for permission request files, delivering each request once
/// on `tx`. The returned watcher must be kept alive.
pub fn watch_permission_requests(
    dir: &Path,
    tx: mpsc::Sender<PermissionRequest>,
) -> notify::Result<RecommendedWatcher> {
    std::fs::create_dir_all(dir).map_err(|e| notify::Error::io(e).add_path(dir.to_path_buf()))?;

    // Creation may surface as Create and again as Modify once the content
    // lands; the id set keeps delivery at once-per-request.
    let seen: Mutex<HashSet<String>> = Mutex::new(HashSet::new());
    let mut watcher = notify::recommended_watcher(move |res: Result<notify::Event, _>| {
        let Ok(event) = res else { return };
        for path in event.paths {
            let Some(request) = read_request(&path) else {
                continue;
            };
            if !seen.lock().insert(request.request_id.to_string()) {
                continue;
            }
            if tx.blocking_send(request).is_err() {
                return;
            }
        }
    })?;

    watcher.watch(dir, RecursiveMode::NonRecursive)?;
    Ok(watcher)
}

/// Write the response file the hook polls for.
pub fn respond_to_permission(
    dir: &Path,
    request_id: &RequestId,
    action: PermissionAction,
) -> io::Result<()> {
    std::fs::create_dir_all(dir)?;
    std::fs::write(
        dir.join(permission_response_file(request_id.as_str())),
        action.to_string(),
    )
}

#[cfg(test)]
#[path = "permission_tests.rs"]
mod tests;

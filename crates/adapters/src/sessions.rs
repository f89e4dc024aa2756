// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tether Authors

//! Index over the agent's on-disk project tree.
//!
//! One directory per encoded cwd, one `.jsonl` file per session. The agent
//! owns the tree; the bridge only reads it.

use crate::env;
use crate::transcript::summarize_file;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tether_core::paths::{encode_cwd, project_name_from_encoded};
use tether_core::{Baseline, SessionEntry, SessionId};

const TRANSCRIPT_EXT: &str = "jsonl";

#[derive(Clone)]
pub struct SessionIndex {
    projects_root: PathBuf,
}

impl SessionIndex {
    pub fn new(projects_root: PathBuf) -> Self {
        Self { projects_root }
    }

    pub fn from_env() -> Self {
        Self::new(env::projects_root())
    }

    /// List known sessions, newest first, at most one per project directory
    /// (the newest transcript of each).
    pub fn list_sessions(&self, limit: usize) -> Vec<SessionEntry> {
        let Ok(dirs) = std::fs::read_dir(&self.projects_root) else {
            return Vec::new();
        };

        let mut entries: Vec<SessionEntry> = dirs
            .filter_map(|d| d.ok())
            .filter(|d| d.path().is_dir())
            .filter_map(|dir| {
                let encoded = dir.file_name().to_string_lossy().to_string();
                let (path, mtime) = newest_transcript(&dir.path())?;
                let session_id = session_id_of(&path)?;
                let summary = summarize_file(&path);
                let cwd = summary
                    .cwd
                    .map(PathBuf::from)
                    .unwrap_or_else(env::home_dir);
                Some(SessionEntry {
                    session_id,
                    cwd,
                    project_name: project_name_from_encoded(&encoded),
                    last_message: summary.last_message,
                    mtime,
                })
            })
            .collect();

        entries.sort_by(|a, b| b.mtime.cmp(&a.mtime));
        entries.truncate(limit);
        entries
    }

    /// Newest transcript for a cwd. Metadata-only files count too: a fresh
    /// post-clear session holds nothing but a snapshot record and must still
    /// be picked — that is exactly the rotation case.
    pub fn latest_session_file_for_cwd(&self, cwd: &Path) -> Option<(SessionId, PathBuf)> {
        let dir = self.projects_root.join(encode_cwd(cwd));
        let (path, _) = newest_transcript(&dir)?;
        let session_id = session_id_of(&path)?;
        Some((session_id, path))
    }

    /// Probe every project directory for a transcript with this session id.
    pub fn session_file_path(&self, session_id: &SessionId) -> Option<PathBuf> {
        let file_name = format!("{}.{}", session_id, TRANSCRIPT_EXT);
        let dirs = std::fs::read_dir(&self.projects_root).ok()?;
        for dir in dirs.filter_map(|d| d.ok()) {
            let candidate = dir.path().join(&file_name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
        None
    }

    /// Capture `{filePath, sessionId, size}` for the session currently
    /// active in `cwd`. Taken immediately before injection so the watcher
    /// sees only the post-injection tail.
    pub fn snapshot_baseline(&self, cwd: &Path) -> Option<Baseline> {
        let (session_id, file_path) = self.latest_session_file_for_cwd(cwd)?;
        let size = std::fs::metadata(&file_path).ok()?.len();
        Some(Baseline {
            file_path,
            session_id,
            size,
        })
    }
}

fn newest_transcript(dir: &Path) -> Option<(PathBuf, SystemTime)> {
    std::fs::read_dir(dir)
        .ok()?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == TRANSCRIPT_EXT))
        .filter_map(|p| {
            let mtime = std::fs::metadata(&p).ok()?.modified().ok()?;
            Some((p, mtime))
        })
        .max_by_key(|(_, mtime)| *mtime)
}

fn session_id_of(path: &Path) -> Option<SessionId> {
    Some(SessionId::new(path.file_stem()?.to_string_lossy()))
}

#[cfg(test)]
#[path = "sessions_tests.rs"]
mod tests;

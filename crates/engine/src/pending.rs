// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tether Authors

//! Process-local pending state.
//!
//! Created once at startup and handed to components by constructor; nothing
//! in the engine reaches for hidden globals. Everything here is in-flight
//! UI state that is acceptable to lose on restart.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tether_core::{PaneId, PendingImage, PendingSession, SessionId};

/// What the next plain-text message should be consumed as.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    None,
    /// Awaiting "how many images" for a stashed batch.
    AwaitImageCount { key: String },
    /// Awaiting the frequency of a new prompt timer, in minutes.
    AwaitTimerFrequency,
    /// Awaiting the prompt text of a new prompt timer.
    AwaitTimerPrompt { frequency_min: u64 },
}

#[derive(Default)]
struct PendingInner {
    images: HashMap<String, Vec<PendingImage>>,
    sessions: HashMap<SessionId, PendingSession>,
    input: InputMode,
    launched_pane: Option<PaneId>,
}

/// Shared pending tables: images awaiting pickup, picker rows awaiting a
/// tap, the current input mode, and the last launched pane id.
#[derive(Clone, Default)]
pub struct PendingTables {
    inner: Arc<Mutex<PendingInner>>,
}

impl PendingTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stash an image batch under a fresh timestamp key, returning the key.
    pub fn stash_images(&self, images: Vec<PendingImage>) -> String {
        let mut inner = self.inner.lock();
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let mut key = stamp.to_string();
        let mut bump = 0u32;
        while inner.images.contains_key(&key) {
            bump += 1;
            key = format!("{stamp}-{bump}");
        }
        inner.images.insert(key.clone(), images);
        key
    }

    /// Pop an image batch; entries are single-use.
    pub fn take_images(&self, key: &str) -> Option<Vec<PendingImage>> {
        self.inner.lock().images.remove(key)
    }

    /// Key and size of the most recently stashed batch.
    pub fn newest_image_batch(&self) -> Option<(String, usize)> {
        let inner = self.inner.lock();
        inner
            .images
            .iter()
            .max_by(|a, b| a.0.cmp(b.0))
            .map(|(key, images)| (key.clone(), images.len()))
    }

    pub fn remember_session(&self, session_id: SessionId, session: PendingSession) {
        self.inner.lock().sessions.insert(session_id, session);
    }

    pub fn session(&self, session_id: &SessionId) -> Option<PendingSession> {
        self.inner.lock().sessions.get(session_id).cloned()
    }

    /// Take the current input mode, resetting it to `None`.
    pub fn take_input(&self) -> InputMode {
        std::mem::take(&mut self.inner.lock().input)
    }

    pub fn set_input(&self, mode: InputMode) {
        self.inner.lock().input = mode;
    }

    /// Remember the pane created by the latest launch; consulted as an
    /// injection fallback when the locator cannot resolve a pane by cwd.
    pub fn set_launched_pane(&self, pane: PaneId) {
        self.inner.lock().launched_pane = Some(pane);
    }

    pub fn launched_pane(&self) -> Option<PaneId> {
        self.inner.lock().launched_pane.clone()
    }
}

#[cfg(test)]
#[path = "pending_tests.rs"]
mod tests;

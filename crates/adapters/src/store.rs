// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tether Authors

//! Bridge state directory.
//!
//! Small files only: the attached-session marker, the optional config, the
//! last-seen chat id, the voice-polish flag, and staged inbound images.
//! Reads are tolerant — transient malformed content degrades to `None` or a
//! default, never to an error the caller has to route.

use crate::env;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tether_core::paths::{
    ATTACHED_FILE, CHAT_ID_FILE, CONFIG_FILE, IMAGES_DIR, POLISH_VOICE_OFF_FILE,
};
use tether_core::{AttachedSession, BridgeConfig, ChatId, SessionId};

#[derive(Clone)]
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn from_env() -> Self {
        Self::new(env::state_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Read the attached marker: line one the session id, line two the cwd.
    /// A missing session id line means no attachment; a missing cwd line
    /// substitutes the operator's home.
    pub fn attached(&self) -> Option<AttachedSession> {
        let raw = std::fs::read_to_string(self.dir.join(ATTACHED_FILE)).ok()?;
        let mut lines = raw.lines();
        let session_id = lines.next()?.trim();
        if session_id.is_empty() {
            return None;
        }
        let cwd = lines
            .next()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(env::home_dir);
        Some(AttachedSession {
            session_id: SessionId::new(session_id),
            cwd,
        })
    }

    pub fn set_attached(&self, attached: &AttachedSession) -> io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(
            self.dir.join(ATTACHED_FILE),
            format!("{}\n{}\n", attached.session_id, attached.cwd.display()),
        )
    }

    pub fn clear_attached(&self) {
        let _ = std::fs::remove_file(self.dir.join(ATTACHED_FILE));
    }

    /// Load the optional config; absent or malformed files yield defaults.
    pub fn load_config(&self) -> BridgeConfig {
        std::fs::read_to_string(self.dir.join(CONFIG_FILE))
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default()
    }

    pub fn chat_id(&self) -> Option<ChatId> {
        let raw = std::fs::read_to_string(self.dir.join(CHAT_ID_FILE)).ok()?;
        raw.trim().parse::<i64>().ok().map(ChatId)
    }

    pub fn set_chat_id(&self, chat_id: ChatId) {
        if std::fs::create_dir_all(&self.dir).is_ok() {
            let _ = std::fs::write(self.dir.join(CHAT_ID_FILE), chat_id.to_string());
        }
    }

    /// Voice-transcript polishing is on unless the off-flag file exists.
    pub fn polish_enabled(&self) -> bool {
        !self.dir.join(POLISH_VOICE_OFF_FILE).exists()
    }

    pub fn set_polish_enabled(&self, enabled: bool) -> io::Result<()> {
        let flag = self.dir.join(POLISH_VOICE_OFF_FILE);
        if enabled {
            match std::fs::remove_file(flag) {
                Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
                _ => Ok(()),
            }
        } else {
            std::fs::create_dir_all(&self.dir)?;
            std::fs::write(flag, "")
        }
    }

    /// Stage an inbound image for the agent to read, returning its path.
    pub fn stage_image(&self, extension: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        let images = self.dir.join(IMAGES_DIR);
        std::fs::create_dir_all(&images)?;
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let mut path = images.join(format!("telegram-{stamp}.{extension}"));
        let mut bump = 0u32;
        while path.exists() {
            bump += 1;
            path = images.join(format!("telegram-{stamp}-{bump}.{extension}"));
        }
        std::fs::write(&path, bytes)?;
        Ok(path)
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tether Authors

//! Centralized environment variable access for the adapters crate.
//!
//! Every timing knob of the turn pipeline can be shrunk in tests or tuned
//! in the field without a rebuild.

use std::path::PathBuf;
use std::time::Duration;

fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Delay between typing text into a pane and pressing Enter (default: 100ms).
pub fn key_delay() -> Duration {
    parse_duration_ms("TETHER_KEY_DELAY_MS").unwrap_or(Duration::from_millis(100))
}

/// Grace window after a result record, to collect trailing blocks flushed in
/// the same write (default: 500ms).
pub fn result_grace() -> Duration {
    parse_duration_ms("TETHER_RESULT_GRACE_MS").unwrap_or(Duration::from_millis(500))
}

/// Quiet period before the tail is offered to the waiting classifier
/// (default: 3000ms).
pub fn stall_quiet() -> Duration {
    parse_duration_ms("TETHER_STALL_QUIET_MS").unwrap_or(Duration::from_secs(3))
}

/// Silence before a "still working" ping when no text has been delivered
/// (default: 60s).
pub fn ping_after() -> Duration {
    parse_duration_ms("TETHER_PING_MS").unwrap_or(Duration::from_secs(60))
}

/// Hard idle timeout terminating a watch (default: 120s).
pub fn hard_idle() -> Duration {
    parse_duration_ms("TETHER_HARD_IDLE_MS").unwrap_or(Duration::from_secs(120))
}

/// Bridge state directory: `$TETHER_CONFIG_DIR`, default `~/.tether`.
pub fn state_dir() -> PathBuf {
    std::env::var("TETHER_CONFIG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".tether"))
}

/// Root of the agent's per-project transcript tree:
/// `$CLAUDE_CONFIG_DIR/projects`, default `~/.claude/projects`.
pub fn projects_root() -> PathBuf {
    std::env::var("CLAUDE_CONFIG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".claude"))
        .join("projects")
}

/// Operator home directory, `/` when unresolvable.
pub fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("/"))
}

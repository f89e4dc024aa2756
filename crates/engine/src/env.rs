// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tether Authors

//! Centralized environment variable access for the engine crate.

use std::time::Duration;

fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Settle time after interrupting a running turn before the next injection
/// (default: 600ms).
pub fn interrupt_settle() -> Duration {
    parse_duration_ms("TETHER_INTERRUPT_SETTLE_MS").unwrap_or(Duration::from_millis(600))
}

/// Interval of the session-rotation poll (default: 3s).
pub fn rotation_poll() -> Duration {
    parse_duration_ms("TETHER_ROTATION_POLL_MS").unwrap_or(Duration::from_secs(3))
}

/// How long a rotated (post-compaction) watch may run before the turn is
/// closed; post-clear transcripts never receive a result record
/// (default: 60s).
pub fn rotation_give_up() -> Duration {
    parse_duration_ms("TETHER_ROTATION_GIVE_UP_MS").unwrap_or(Duration::from_secs(60))
}

/// Poll interval while waiting for a freshly launched pane to appear
/// (default: 1s).
pub fn launch_poll() -> Duration {
    parse_duration_ms("TETHER_LAUNCH_POLL_MS").unwrap_or(Duration::from_secs(1))
}

/// How many launch polls before giving up (default: 30).
pub fn launch_poll_attempts() -> u32 {
    std::env::var("TETHER_LAUNCH_POLL_ATTEMPTS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(30)
}

/// Refresh interval of the transient typing indicator (default: 4s).
pub fn typing_refresh() -> Duration {
    parse_duration_ms("TETHER_TYPING_REFRESH_MS").unwrap_or(Duration::from_secs(4))
}

/// Period of the recurring prompt timer. The override collapses the
/// minute-based frequency for tests.
pub fn timer_period(frequency_min: u64) -> Duration {
    parse_duration_ms("TETHER_TIMER_PERIOD_MS")
        .unwrap_or_else(|| Duration::from_secs(frequency_min.max(1) * 60))
}

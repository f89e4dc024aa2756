// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tether Authors

//! Tmux multiplexer adapter

use super::{locator, MuxAdapter, MuxError, Pane};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tether_core::PaneId;
use tokio::process::Command;

const LIST_FORMAT: &str = "#{pane_id} #{pane_pid} #{pane_current_command} #{pane_current_path}";

/// Tmux-based multiplexer adapter
#[derive(Clone, Default)]
pub struct TmuxAdapter;

impl TmuxAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MuxAdapter for TmuxAdapter {
    async fn list_panes(&self) -> Vec<Pane> {
        let output = Command::new("tmux")
            .args(["list-panes", "-a", "-F", LIST_FORMAT])
            .output()
            .await;

        let output = match output {
            Ok(o) if o.status.success() => o,
            Ok(o) => {
                let stderr = String::from_utf8_lossy(&o.stderr);
                tracing::debug!(stderr = %stderr, "tmux list-panes failed");
                return Vec::new();
            }
            Err(e) => {
                tracing::debug!(error = %e, "tmux not available");
                return Vec::new();
            }
        };

        String::from_utf8_lossy(&output.stdout)
            .lines()
            .filter_map(parse_pane_line)
            .collect()
    }

    async fn send_text(&self, pane: &PaneId, text: &str) -> Result<(), MuxError> {
        // -l = literal mode (no key name interpretation)
        // -- = end of options (handles text starting with -)
        let output = Command::new("tmux")
            .args(["send-keys", "-t", pane.as_str(), "-l", "--", text])
            .output()
            .await
            .map_err(|e| MuxError::CommandFailed(e.to_string()))?;

        if !output.status.success() {
            return Err(MuxError::NotFound(pane.to_string()));
        }
        Ok(())
    }

    async fn send_key(&self, pane: &PaneId, key: &str) -> Result<(), MuxError> {
        let output = Command::new("tmux")
            .args(["send-keys", "-t", pane.as_str(), key])
            .output()
            .await
            .map_err(|e| MuxError::CommandFailed(e.to_string()))?;

        if !output.status.success() {
            return Err(MuxError::NotFound(pane.to_string()));
        }
        Ok(())
    }

    async fn new_window(&self, name: &str, cwd: &Path) -> Result<PaneId, MuxError> {
        if !cwd.exists() {
            return Err(MuxError::SpawnFailed(format!(
                "working directory does not exist: {}",
                cwd.display()
            )));
        }

        let output = Command::new("tmux")
            .arg("new-window")
            .arg("-d")
            .arg("-P")
            .arg("-F")
            .arg("#{pane_id}")
            .arg("-n")
            .arg(name)
            .arg("-c")
            .arg(cwd)
            .output()
            .await
            .map_err(|e| MuxError::SpawnFailed(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::error!(name, stderr = %stderr, "tmux new-window failed");
            return Err(MuxError::SpawnFailed(stderr.to_string()));
        }

        let pane_id = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if pane_id.is_empty() {
            return Err(MuxError::SpawnFailed("no pane id reported".to_string()));
        }
        Ok(PaneId::new(pane_id))
    }

    async fn kill_window(&self, pane: &PaneId) -> Result<(), MuxError> {
        let output = Command::new("tmux")
            .args(["kill-window", "-t", pane.as_str()])
            .output()
            .await
            .map_err(|e| MuxError::CommandFailed(e.to_string()))?;

        if !output.status.success() {
            return Err(MuxError::NotFound(pane.to_string()));
        }
        Ok(())
    }

    async fn agent_child_start(&self, shell_pid: u32) -> Option<u64> {
        let pgrep = Command::new("pgrep")
            .args(["-P", &shell_pid.to_string()])
            .output()
            .await
            .ok()?;
        let pids: Vec<String> = String::from_utf8_lossy(&pgrep.stdout)
            .lines()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();
        if pids.is_empty() {
            return None;
        }

        let ps = Command::new("ps")
            .args(["-p", &pids.join(","), "-o", "etime=,comm="])
            .output()
            .await
            .ok()?;

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_secs();

        String::from_utf8_lossy(&ps.stdout)
            .lines()
            .filter_map(|line| {
                let mut parts = line.split_whitespace();
                let etime = parts.next()?;
                let comm = parts.collect::<Vec<_>>().join(" ");
                if !locator::is_agent_command(&comm) {
                    return None;
                }
                Some(now.saturating_sub(parse_etime_secs(etime)?))
            })
            .max()
    }
}

/// Parse one `list-panes` output line. Paths containing spaces are rejoined
/// into the trailing cwd field.
fn parse_pane_line(line: &str) -> Option<Pane> {
    let mut parts = line.split_whitespace();
    let pane_id = parts.next()?;
    let shell_pid: u32 = parts.next()?.parse().ok()?;
    let command = parts.next()?.to_string();
    let rest: Vec<&str> = parts.collect();
    if rest.is_empty() {
        return None;
    }
    Some(Pane {
        pane_id: PaneId::new(pane_id),
        shell_pid,
        command,
        cwd: PathBuf::from(rest.join(" ")),
    })
}

/// Parse a `ps` elapsed-time field (`[[dd-]hh:]mm:ss`) into seconds.
fn parse_etime_secs(etime: &str) -> Option<u64> {
    let (days, clock) = match etime.split_once('-') {
        Some((d, rest)) => (d.parse::<u64>().ok()?, rest),
        None => (0, etime),
    };
    let fields: Vec<u64> = clock
        .split(':')
        .map(|f| f.parse::<u64>())
        .collect::<Result<_, _>>()
        .ok()?;
    let secs = match fields.as_slice() {
        [m, s] => m * 60 + s,
        [h, m, s] => h * 3600 + m * 60 + s,
        _ => return None,
    };
    Some(days * 86400 + secs)
}

#[cfg(test)]
#[path = "tmux_tests.rs"]
mod tests;

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tether Authors

//! Keystroke injection into an agent pane.

use crate::env;
use crate::pane::locator::{self, FindOutcome, NotFoundReason};
use crate::pane::MuxAdapter;
use std::path::Path;
use tether_core::PaneId;

/// Why an injection did not happen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InjectFailure {
    NotFound(NotFoundReason),
    SendFailed(String),
}

impl std::fmt::Display for InjectFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InjectFailure::NotFound(reason) => write!(f, "{reason}"),
            InjectFailure::SendFailed(e) => write!(f, "send failed: {e}"),
        }
    }
}

/// Result union of an injection attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InjectOutcome {
    Injected { pane_id: PaneId },
    NotInjected { reason: InjectFailure },
}

impl InjectOutcome {
    pub fn injected(&self) -> bool {
        matches!(self, InjectOutcome::Injected { .. })
    }
}

/// Locates a pane for a cwd and types user text into it.
#[derive(Clone)]
pub struct Injector<M: MuxAdapter> {
    mux: M,
}

impl<M: MuxAdapter> Injector<M> {
    pub fn new(mux: M) -> Self {
        Self { mux }
    }

    /// Send `text` into the agent pane for `cwd`, falling back to
    /// `fallback_pane` when the locator comes up empty. Text and Enter are
    /// two separate keystroke commands with a small delay in between; a
    /// combined send submits before the text is registered.
    pub async fn inject(
        &self,
        cwd: &Path,
        text: &str,
        fallback_pane: Option<&PaneId>,
    ) -> InjectOutcome {
        let pane = match locator::find(&self.mux, cwd).await {
            FindOutcome::Found(pane) => pane,
            FindOutcome::NotFound(reason) => match fallback_pane {
                Some(pane) if !pane.as_str().is_empty() => pane.clone(),
                _ => {
                    return InjectOutcome::NotInjected {
                        reason: InjectFailure::NotFound(reason),
                    }
                }
            },
        };
        self.type_and_submit(&pane, text).await
    }

    async fn type_and_submit(&self, pane: &PaneId, text: &str) -> InjectOutcome {
        if let Err(e) = self.mux.send_text(pane, text).await {
            return InjectOutcome::NotInjected {
                reason: InjectFailure::SendFailed(e.to_string()),
            };
        }
        tokio::time::sleep(env::key_delay()).await;
        if let Err(e) = self.mux.send_key(pane, "Enter").await {
            return InjectOutcome::NotInjected {
                reason: InjectFailure::SendFailed(e.to_string()),
            };
        }
        InjectOutcome::Injected {
            pane_id: pane.clone(),
        }
    }

    /// Send the agent's universal interrupt (Escape) without submit.
    pub async fn send_interrupt(&self, pane: &PaneId) {
        if let Err(e) = self.mux.send_key(pane, "Escape").await {
            tracing::warn!(pane = %pane, error = %e, "interrupt keystroke failed");
        }
    }

    /// Send a single named key (digit picks, Escape for deny) without submit.
    pub async fn send_key(&self, pane: &PaneId, key: &str) {
        if let Err(e) = self.mux.send_key(pane, key).await {
            tracing::warn!(pane = %pane, key, error = %e, "keystroke failed");
        }
    }
}

#[cfg(test)]
#[path = "inject_tests.rs"]
mod tests;

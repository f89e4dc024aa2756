// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tether Authors

//! Recurring prompt timer.
//!
//! Each tick replays the full injection pipeline — resolve attached
//! session, locate the pane, capture a baseline, type the prompt, arm the
//! manager — so a timer tick and a user message cannot race: the manager
//! serialises them like any two messages.

use crate::manager::TurnManager;
use crate::pending::PendingTables;
use parking_lot::Mutex;
use std::sync::Arc;
use tether_adapters::{ChatAdapter, InjectOutcome, Injector, MuxAdapter, StateStore};
use tether_core::ChatId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerSettings {
    pub frequency_min: u64,
    pub prompt: String,
}

struct TimerState {
    task: tokio::task::JoinHandle<()>,
    settings: TimerSettings,
}

/// Holds at most one recurring prompt; starting a new one replaces it.
#[derive(Clone, Default)]
pub struct PromptTimer {
    inner: Arc<Mutex<Option<TimerState>>>,
}

/// Everything a tick needs, cloned in at start.
pub struct TimerDeps<C: ChatAdapter, M: MuxAdapter> {
    pub manager: TurnManager<C>,
    pub injector: Injector<M>,
    pub store: StateStore,
    pub pending: PendingTables,
    pub chat_id: ChatId,
}

impl PromptTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<TimerSettings> {
        self.inner.lock().as_ref().map(|s| s.settings.clone())
    }

    /// Start (or replace) the recurring prompt. Returns the settings that
    /// were replaced, if any.
    pub fn start<C: ChatAdapter, M: MuxAdapter>(
        &self,
        deps: TimerDeps<C, M>,
        frequency_min: u64,
        prompt: String,
    ) -> Option<TimerSettings> {
        let settings = TimerSettings {
            frequency_min,
            prompt: prompt.clone(),
        };
        let task = tokio::spawn(run_ticks(deps, frequency_min, prompt));
        let prior = self.inner.lock().replace(TimerState { task, settings });
        prior.map(|state| {
            state.task.abort();
            state.settings
        })
    }

    /// Stop the timer, returning its settings for the UI echo.
    pub fn stop(&self) -> Option<TimerSettings> {
        self.inner.lock().take().map(|state| {
            state.task.abort();
            state.settings
        })
    }
}

async fn run_ticks<C: ChatAdapter, M: MuxAdapter>(
    deps: TimerDeps<C, M>,
    frequency_min: u64,
    prompt: String,
) {
    loop {
        tokio::time::sleep(crate::env::timer_period(frequency_min)).await;

        let Some(attached) = deps.store.attached() else {
            tracing::debug!("timer tick skipped: no attached session");
            continue;
        };

        let baseline = deps.manager.snapshot_baseline(&attached.cwd);
        let fallback = deps.pending.launched_pane();
        match deps
            .injector
            .inject(&attached.cwd, &prompt, fallback.as_ref())
            .await
        {
            InjectOutcome::Injected { .. } => {
                deps.manager
                    .start_turn(&attached, deps.chat_id, baseline, None)
                    .await;
            }
            InjectOutcome::NotInjected { reason } => {
                tracing::debug!(%reason, "timer tick skipped: injection failed");
            }
        }
    }
}

#[cfg(test)]
#[path = "timer_tests.rs"]
mod tests;

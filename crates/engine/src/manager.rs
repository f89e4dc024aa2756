// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tether Authors

//! Turn manager: singleton owner of the active transcript watch.
//!
//! At most one watch runs at a time. Arming a new one first stops and
//! flushes the previous (its completion fires exactly once), resolves the
//! baseline, and rewrites the attached marker when the agent rotated to a
//! new session file in the meantime. A background poll follows further
//! rotations (compaction, `/clear`) by swapping the watch to the newest
//! file with a zero baseline while the same event driver keeps running.

use crate::env;
use crate::notify::Notifier;
use crate::pending::PendingTables;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tether_adapters::{start_turn_watcher, ChatAdapter, Keyboard, SessionIndex, StateStore};
use tether_adapters::{Button, TurnWatch, WatchHandle};
use tether_core::waiting::{WaitingClassifier, WaitingKind, PLAN_CHOICES};
use tether_core::{AttachedSession, Baseline, ChatId, SessionId, TurnEvent};
use tokio::sync::{mpsc, oneshot};

/// Exactly-once completion slot shared by every termination path.
type DoneSlot = Arc<Mutex<Option<oneshot::Sender<()>>>>;

fn fire(done: &DoneSlot) {
    if let Some(tx) = done.lock().take() {
        let _ = tx.send(());
    }
}

struct ActiveTurn {
    handle: WatchHandle,
    watched_file: PathBuf,
    events_tx: mpsc::Sender<TurnEvent>,
    done: DoneSlot,
}

#[derive(Default)]
struct ManagerInner {
    /// Monotonic counter; every arm invalidates in-flight rotation polls of
    /// earlier turns.
    generation: u64,
    active: Option<ActiveTurn>,
}

#[derive(Clone)]
pub struct TurnManager<C: ChatAdapter> {
    notifier: Notifier<C>,
    index: SessionIndex,
    store: StateStore,
    pending: PendingTables,
    classifier: WaitingClassifier,
    inner: Arc<Mutex<ManagerInner>>,
}

impl<C: ChatAdapter> TurnManager<C> {
    pub fn new(
        chat: C,
        index: SessionIndex,
        store: StateStore,
        pending: PendingTables,
    ) -> Self {
        Self {
            notifier: Notifier::new(chat),
            index,
            store,
            pending,
            classifier: WaitingClassifier::new(),
            inner: Arc::new(Mutex::new(ManagerInner::default())),
        }
    }

    pub fn is_active(&self) -> bool {
        self.inner.lock().active.is_some()
    }

    /// Capture a pre-injection baseline for `cwd`.
    pub fn snapshot_baseline(&self, cwd: &Path) -> Option<Baseline> {
        self.index.snapshot_baseline(cwd)
    }

    /// Stop the active watch and fire its completion. Used when a new user
    /// message supersedes a running turn.
    pub fn stop_and_flush(&self) {
        let taken = self.inner.lock().active.take();
        if let Some(active) = taken {
            active.handle.stop();
            fire(&active.done);
        }
    }

    /// Discard the active watch without firing completion. Used at detach
    /// and shutdown only.
    pub fn clear(&self) {
        let taken = self.inner.lock().active.take();
        if let Some(active) = taken {
            active.handle.stop();
        }
    }

    /// Arm a watch for the turn just injected into `attached`'s session.
    ///
    /// `pre_baseline` should be the snapshot taken before injection; without
    /// it a fresh snapshot is taken now. `done` fires exactly once, on
    /// whichever termination path wins.
    pub async fn start_turn(
        &self,
        attached: &AttachedSession,
        chat_id: ChatId,
        pre_baseline: Option<Baseline>,
        done: Option<oneshot::Sender<()>>,
    ) {
        self.stop_and_flush();
        let generation = {
            let mut inner = self.inner.lock();
            inner.generation += 1;
            inner.generation
        };

        let done: DoneSlot = Arc::new(Mutex::new(done));

        let Some(baseline) = pre_baseline.or_else(|| self.index.snapshot_baseline(&attached.cwd))
        else {
            // Nothing to watch; a session file appears only once the agent
            // has started writing.
            fire(&done);
            return;
        };

        if baseline.session_id != attached.session_id {
            self.rewrite_marker(&baseline.session_id, &attached.cwd);
        }

        let (events_tx, events_rx) = mpsc::channel(64);
        let watch = TurnWatch {
            file_path: baseline.file_path.clone(),
            baseline: baseline.size,
            session_id: baseline.session_id.clone(),
            project_name: project_name_of(&attached.cwd),
            cwd: attached.cwd.clone(),
        };
        let handle = start_turn_watcher(watch, events_tx.clone());

        self.inner.lock().active = Some(ActiveTurn {
            handle,
            watched_file: baseline.file_path.clone(),
            events_tx: events_tx.clone(),
            done: done.clone(),
        });

        tokio::spawn(self.clone().drive(events_rx, chat_id, generation, done));
        tokio::spawn(self.clone().poll_rotation(attached.cwd.clone(), generation));
    }

    /// Consume events of the current turn and fan them out to the chat.
    /// Outlives watch swaps: rotation replaces the watcher, not the driver.
    async fn drive(
        self,
        mut events_rx: mpsc::Receiver<TurnEvent>,
        chat_id: ChatId,
        generation: u64,
        done: DoneSlot,
    ) {
        let mut text_delivered = false;
        while let Some(event) = events_rx.recv().await {
            match event {
                TurnEvent::Text { text, .. } => {
                    text_delivered = true;
                    self.notifier.text(chat_id, &text).await;
                }
                TurnEvent::Ping => {
                    self.notifier.text(chat_id, "⏳ Still working…").await;
                }
                TurnEvent::Stalled(tail) => {
                    self.report_stall(chat_id, &tail).await;
                }
                TurnEvent::Images(images) => {
                    let count = images.len();
                    let key = self.pending.stash_images(images);
                    tracing::debug!(%key, count, "stashed image batch");
                    self.notifier
                        .text(
                            chat_id,
                            &format!("📷 Captured {count} image(s) — send /images to fetch them."),
                        )
                        .await;
                }
                TurnEvent::Complete => {
                    if !text_delivered {
                        self.notifier.text(chat_id, "✅ Done.").await;
                    }
                    fire(&done);
                    self.deactivate(generation);
                    return;
                }
            }
        }
        // Channel closed without Complete: the watch was stopped externally
        // (flush or clear); whoever stopped it owns the completion.
    }

    async fn report_stall(&self, chat_id: ChatId, tail: &tether_core::AssistantTail) {
        let Some(kind) = self.classifier.classify(tail) else {
            return;
        };
        let text = tail.text.as_deref().unwrap_or("");
        match kind {
            WaitingKind::MultipleChoice => {
                let buttons = PLAN_CHOICES
                    .iter()
                    .enumerate()
                    .map(|(i, label)| Button::new(*label, format!("plan:{}", i + 1)))
                    .collect();
                let plan = tail.plan.as_deref().unwrap_or(text);
                self.notifier
                    .keyboard(
                        chat_id,
                        &format!("📋 The agent proposes a plan:\n\n{plan}"),
                        &Keyboard::column(buttons),
                    )
                    .await;
            }
            WaitingKind::YesNo | WaitingKind::Enter | WaitingKind::Question => {
                self.notifier
                    .text(chat_id, &format!("🤔 The agent is waiting on you:\n\n{text}"))
                    .await;
            }
        }
    }

    /// Follow session-file rotation for the watched cwd. Swaps the watch to
    /// the newest file with a zero baseline; once a rotation happened, the
    /// new transcript gets a bounded window to finish before the turn is
    /// closed (post-clear sessions never receive a result record).
    async fn poll_rotation(self, cwd: PathBuf, generation: u64) {
        let mut give_up_at: Option<Instant> = None;
        loop {
            tokio::time::sleep(env::rotation_poll()).await;

            let (watched_file, events_tx, done) = {
                let inner = self.inner.lock();
                if inner.generation != generation {
                    return;
                }
                let Some(active) = inner.active.as_ref() else {
                    return;
                };
                (
                    active.watched_file.clone(),
                    active.events_tx.clone(),
                    active.done.clone(),
                )
            };

            if let Some(deadline) = give_up_at {
                if Instant::now() >= deadline {
                    tracing::info!(cwd = %cwd.display(), "rotated turn never finished, closing");
                    let taken = {
                        let mut inner = self.inner.lock();
                        if inner.generation != generation {
                            return;
                        }
                        inner.active.take()
                    };
                    if let Some(active) = taken {
                        active.handle.stop();
                    }
                    fire(&done);
                    return;
                }
            }

            let Some((session_id, latest)) = self.index.latest_session_file_for_cwd(&cwd) else {
                continue;
            };
            if latest == watched_file {
                continue;
            }

            tracing::info!(
                old = %watched_file.display(),
                new = %latest.display(),
                "session rotated, rearming watch"
            );
            let watch = TurnWatch {
                file_path: latest.clone(),
                baseline: 0,
                session_id: session_id.clone(),
                project_name: project_name_of(&cwd),
                cwd: cwd.clone(),
            };
            let new_handle = start_turn_watcher(watch, events_tx.clone());

            let stale = {
                let mut inner = self.inner.lock();
                if inner.generation != generation {
                    None
                } else if let Some(active) = inner.active.as_mut() {
                    let old = std::mem::replace(&mut active.handle, new_handle.clone());
                    active.watched_file = latest;
                    Some(old)
                } else {
                    None
                }
            };
            match stale {
                Some(old_handle) => {
                    old_handle.stop();
                    self.rewrite_marker(&session_id, &cwd);
                    if give_up_at.is_none() {
                        give_up_at = Some(Instant::now() + env::rotation_give_up());
                    }
                }
                None => {
                    // Superseded mid-swap; the fresh watcher must not leak.
                    new_handle.stop();
                    return;
                }
            }
        }
    }

    fn deactivate(&self, generation: u64) {
        let mut inner = self.inner.lock();
        if inner.generation == generation {
            inner.active = None;
        }
    }

    fn rewrite_marker(&self, session_id: &SessionId, cwd: &Path) {
        let attached = AttachedSession {
            session_id: session_id.clone(),
            cwd: cwd.to_path_buf(),
        };
        if let Err(e) = self.store.set_attached(&attached) {
            tracing::warn!(error = %e, "failed to rewrite attached marker");
        }
    }
}

fn project_name_of(cwd: &Path) -> String {
    cwd.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "project".to_string())
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tether Authors

//! Turn watcher: observe one transcript file from a byte baseline.
//!
//! A watch follows a single turn of the agent. It reads only what the agent
//! appends after the baseline, emits each new assistant text block exactly
//! once, and terminates on the hook's `result` record (after a short grace
//! for trailing blocks) or on the hard idle timeout. Stopping the handle is
//! silent; completion events belong to watches that ran their course.

use crate::env;
use crate::transcript::read_new_lines;
use base64::Engine;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tether_core::transcript::{
    last_assistant_entry, parse_record, written_image_path, ContentBlock, TranscriptRecord,
};
use tether_core::{PendingImage, SessionId, TurnEvent};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval, Duration, MissedTickBehavior};

/// Fallback/housekeeping tick. File changes normally arrive via notify;
/// the tick drives timeouts and covers watchers that failed to attach.
const TICK: Duration = Duration::from_millis(100);

/// One transcript file observed from a byte baseline.
#[derive(Debug, Clone)]
pub struct TurnWatch {
    pub file_path: PathBuf,
    pub baseline: u64,
    pub session_id: SessionId,
    pub project_name: String,
    pub cwd: PathBuf,
}

/// Handle to a running watch. `stop` is idempotent and silent: the watch
/// ends without emitting `Complete`.
#[derive(Clone)]
pub struct WatchHandle {
    stop_tx: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}

impl WatchHandle {
    pub fn stop(&self) {
        if let Some(tx) = self.stop_tx.lock().take() {
            let _ = tx.send(());
        }
    }
}

/// Start watching `watch`, emitting [`TurnEvent`]s on `events`.
pub fn start_turn_watcher(watch: TurnWatch, events: mpsc::Sender<TurnEvent>) -> WatchHandle {
    let (stop_tx, stop_rx) = oneshot::channel();
    tokio::spawn(run_watch(watch, events, stop_rx));
    WatchHandle {
        stop_tx: Arc::new(Mutex::new(Some(stop_tx))),
    }
}

async fn run_watch(
    watch: TurnWatch,
    events: mpsc::Sender<TurnEvent>,
    mut stop_rx: oneshot::Receiver<()>,
) {
    let (file_tx, mut file_rx) = mpsc::channel::<()>(8);
    let _watcher_guard = match create_file_watcher(&watch.file_path, file_tx) {
        Ok(w) => Some(w),
        Err(e) => {
            // The file may not exist yet (fresh session after clear); the
            // tick below polls it into existence.
            tracing::debug!(file = %watch.file_path.display(), error = %e, "file watcher unavailable, polling");
            None
        }
    };

    let mut state = WatchState::new(watch.baseline);
    let mut tick = interval(TICK);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            Some(()) = file_rx.recv() => {
                if state.absorb(&watch, &events).await.is_break() {
                    break;
                }
            }

            _ = tick.tick() => {
                if state.on_tick(&watch, &events).await.is_break() {
                    break;
                }
            }

            _ = &mut stop_rx => {
                tracing::debug!(session_id = %watch.session_id, "watch stopped");
                break;
            }
        }
    }
}

struct WatchState {
    cursor: u64,
    baseline: u64,
    emitted: HashSet<String>,
    tail_lines: Vec<String>,
    image_paths: Vec<String>,
    text_delivered: bool,
    result_seen: bool,
    grace_deadline: Option<Instant>,
    last_activity: Instant,
    last_ping: Instant,
    stall_reported: bool,
}

impl WatchState {
    fn new(baseline: u64) -> Self {
        let now = Instant::now();
        Self {
            cursor: baseline,
            baseline,
            emitted: HashSet::new(),
            tail_lines: Vec::new(),
            image_paths: Vec::new(),
            text_delivered: false,
            result_seen: false,
            grace_deadline: None,
            last_activity: now,
            last_ping: now,
            stall_reported: false,
        }
    }

    /// Read and process any complete lines past the cursor.
    async fn absorb(
        &mut self,
        watch: &TurnWatch,
        events: &mpsc::Sender<TurnEvent>,
    ) -> ControlFlow<()> {
        let len = std::fs::metadata(&watch.file_path).map(|m| m.len()).unwrap_or(0);
        if len <= self.cursor {
            return ControlFlow::Continue(());
        }

        let (lines, new_cursor) = read_new_lines(&watch.file_path, self.cursor);
        if new_cursor > self.cursor {
            self.cursor = new_cursor;
            self.last_activity = Instant::now();
            self.stall_reported = false;
        }

        for line in lines {
            if let ControlFlow::Break(()) = self.process_line(&line, watch, events).await {
                return ControlFlow::Break(());
            }
            self.tail_lines.push(line);
        }
        ControlFlow::Continue(())
    }

    async fn process_line(
        &mut self,
        line: &str,
        watch: &TurnWatch,
        events: &mpsc::Sender<TurnEvent>,
    ) -> ControlFlow<()> {
        match parse_record(line) {
            Some(TranscriptRecord::Assistant { message, .. }) => {
                for block in &message.content {
                    if let Some(path) = written_image_path(block) {
                        if !self.image_paths.contains(&path) {
                            self.image_paths.push(path);
                        }
                    }
                    let ContentBlock::Text { text } = block else {
                        continue;
                    };
                    // The agent flushes the same block more than once; the
                    // set keeps delivery at most-once per block text.
                    if !self.emitted.insert(text.clone()) {
                        continue;
                    }
                    self.text_delivered = true;
                    let event = TurnEvent::Text {
                        session_id: watch.session_id.clone(),
                        project_name: watch.project_name.clone(),
                        cwd: watch.cwd.clone(),
                        file_path: watch.file_path.clone(),
                        text: text.clone(),
                    };
                    if events.send(event).await.is_err() {
                        return ControlFlow::Break(());
                    }
                }
            }
            Some(TranscriptRecord::TurnResult {}) => {
                if !self.result_seen {
                    self.result_seen = true;
                    self.grace_deadline = Some(Instant::now() + env::result_grace());
                }
            }
            _ => {}
        }
        ControlFlow::Continue(())
    }

    async fn on_tick(
        &mut self,
        watch: &TurnWatch,
        events: &mpsc::Sender<TurnEvent>,
    ) -> ControlFlow<()> {
        // Notify can drop or coalesce events; the tick re-checks the file.
        if let ControlFlow::Break(()) = self.absorb(watch, events).await {
            return ControlFlow::Break(());
        }

        if let Some(deadline) = self.grace_deadline {
            if Instant::now() >= deadline {
                return self.finish(watch, events).await;
            }
        }

        if self.last_activity.elapsed() >= env::hard_idle() {
            tracing::info!(session_id = %watch.session_id, "watch hit hard idle timeout");
            return self.finish(watch, events).await;
        }

        if !self.text_delivered && self.last_ping.elapsed() >= env::ping_after() {
            self.last_ping = Instant::now();
            if events.send(TurnEvent::Ping).await.is_err() {
                return ControlFlow::Break(());
            }
        }

        if !self.result_seen
            && !self.stall_reported
            && self.cursor > self.baseline
            && self.last_activity.elapsed() >= env::stall_quiet()
        {
            self.stall_reported = true;
            let tail = last_assistant_entry(self.tail_lines.iter().rev().map(String::as_str));
            if tail.text.is_some() || tail.has_exit_plan_mode {
                if events.send(TurnEvent::Stalled(tail)).await.is_err() {
                    return ControlFlow::Break(());
                }
            }
        }

        ControlFlow::Continue(())
    }

    /// Terminate: pick up anything flushed during the grace window, emit
    /// collected images, then `Complete`.
    async fn finish(
        &mut self,
        watch: &TurnWatch,
        events: &mpsc::Sender<TurnEvent>,
    ) -> ControlFlow<()> {
        let _ = self.absorb(watch, events).await;

        let images = load_images(&self.image_paths).await;
        if !images.is_empty() {
            let _ = events.send(TurnEvent::Images(images)).await;
        }
        let _ = events.send(TurnEvent::Complete).await;
        ControlFlow::Break(())
    }
}

/// Read and encode the image files referenced in the tail. Files that moved
/// or vanished since the tool call are skipped.
async fn load_images(paths: &[String]) -> Vec<PendingImage> {
    let mut images = Vec::new();
    for path in paths {
        let Some(media_type) = tether_core::transcript::image_media_type(path) else {
            continue;
        };
        match tokio::fs::read(path).await {
            Ok(bytes) => images.push(PendingImage {
                media_type: media_type.to_string(),
                data: base64::engine::general_purpose::STANDARD.encode(bytes),
            }),
            Err(e) => {
                tracing::debug!(%path, error = %e, "referenced image unreadable, skipping");
            }
        }
    }
    images
}

fn create_file_watcher(
    path: &Path,
    tx: mpsc::Sender<()>,
) -> Result<RecommendedWatcher, notify::Error> {
    let mut watcher = notify::recommended_watcher(move |res: Result<notify::Event, _>| {
        if res.is_ok() {
            let _ = tx.blocking_send(());
        }
    })?;

    watcher.watch(path, RecursiveMode::NonRecursive)?;
    Ok(watcher)
}

#[cfg(test)]
#[path = "watcher_tests.rs"]
mod tests;

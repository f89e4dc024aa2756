// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tether Authors

//! Coordinator: chat events in, injections and replies out.
//!
//! One task calls [`Coordinator::handle_update`] for each inbound event, in
//! arrival order; everything here is sequential per chat. The allowlist is
//! enforced before any handler runs.

use crate::env;
use crate::manager::TurnManager;
use crate::notify::Notifier;
use crate::pending::{InputMode, PendingTables};
use crate::timer::{PromptTimer, TimerDeps};
use base64::Engine as _;
use std::path::Path;
use tether_adapters::locator::{self, FindOutcome};
use tether_adapters::transcript::assistant_tail_of_file;
use tether_adapters::{
    respond_to_permission, AssistAdapter, Button, ChatAdapter, ChatUpdate, InjectOutcome,
    Injector, Keyboard, MessageRef, MuxAdapter, PermissionAction, PermissionRequest, SessionIndex,
    SpeechAdapter, StateStore,
};
use tether_core::{
    AttachedSession, BridgeConfig, ChatId, PaneId, PendingSession, RequestId, SessionId,
};
use tokio::sync::oneshot;

const HELP: &str = "\
/sessions — pick or launch a session
/detach — detach from the current session
/status — bridge status
/summarize — summarize the last reply
/compact — ask the agent to compact its context
/clear — ask the agent to clear its context
/close_session — close the agent window and detach
/polishvoice — toggle voice-transcript polishing
/images — fetch images captured from the last turns
/timer — recurring prompt (also: /timer stop, /timer <min> <prompt>)
/model — switch the agent's model
/escape — send Escape to the agent
/restart — restart the agent in its pane
/help — this text";

/// Model names offered by the switcher; tapped names are forwarded to the
/// agent's own `/model` command.
const MODEL_CHOICES: [&str; 4] = ["default", "opus", "sonnet", "haiku"];

pub struct Coordinator<C, M, S, A>
where
    C: ChatAdapter,
    M: MuxAdapter,
    S: SpeechAdapter,
    A: AssistAdapter,
{
    chat: C,
    notifier: Notifier<C>,
    mux: M,
    injector: Injector<M>,
    speech: S,
    assist: A,
    manager: TurnManager<C>,
    timer: PromptTimer,
    index: SessionIndex,
    store: StateStore,
    pending: PendingTables,
    allowed_chat: Option<ChatId>,
    repos_folder: Option<std::path::PathBuf>,
}

impl<C, M, S, A> Coordinator<C, M, S, A>
where
    C: ChatAdapter,
    M: MuxAdapter,
    S: SpeechAdapter,
    A: AssistAdapter,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        chat: C,
        mux: M,
        speech: S,
        assist: A,
        manager: TurnManager<C>,
        timer: PromptTimer,
        index: SessionIndex,
        store: StateStore,
        pending: PendingTables,
        config: BridgeConfig,
    ) -> Self {
        Self {
            notifier: Notifier::new(chat.clone()),
            injector: Injector::new(mux.clone()),
            chat,
            mux,
            speech,
            assist,
            manager,
            timer,
            index,
            store,
            pending,
            allowed_chat: config.allowed_chat_id,
            repos_folder: config.repos_folder,
        }
    }

    /// Handle one inbound chat event. Non-allowlisted chats are dropped
    /// silently before anything else happens.
    pub async fn handle_update(&self, update: ChatUpdate) {
        let chat_id = update.chat_id();
        if let Some(allowed) = self.allowed_chat {
            if chat_id != allowed {
                tracing::debug!(%chat_id, "dropping update from non-allowlisted chat");
                return;
            }
        }
        self.store.set_chat_id(chat_id);

        match update {
            ChatUpdate::Text { text, .. } => self.handle_text(chat_id, text).await,
            ChatUpdate::Command { name, args, .. } => {
                self.handle_command(chat_id, &name, &args).await
            }
            ChatUpdate::Callback {
                callback_id,
                message,
                data,
                ..
            } => self.handle_callback(chat_id, &callback_id, message, &data).await,
            ChatUpdate::Voice {
                file_id, file_name, ..
            } => self.handle_voice(chat_id, &file_id, file_name.as_deref()).await,
            ChatUpdate::Photo {
                file_id, caption, ..
            } => {
                self.handle_inbound_image(chat_id, &file_id, None, None, caption)
                    .await
            }
            ChatUpdate::Document {
                file_id,
                mime,
                file_name,
                caption,
                ..
            } => {
                self.handle_inbound_image(chat_id, &file_id, Some(mime), file_name, caption)
                    .await
            }
        }
    }

    /// Surface a permission request from the agent hook as an inline
    /// approve/deny prompt.
    pub async fn handle_permission(&self, request: PermissionRequest) {
        let Some(chat_id) = self.notify_chat() else {
            tracing::warn!("permission request with no chat to notify");
            return;
        };

        let detail = request
            .tool_command
            .clone()
            .unwrap_or_else(|| compact_json(&request.tool_input));
        let keyboard = Keyboard::rows(vec![vec![
            Button::new(
                "✅ Approve",
                format!("perm:{}:approve", request.request_id),
            ),
            Button::new("🚫 Deny", format!("perm:{}:deny", request.request_id)),
        ]]);
        self.notifier
            .keyboard(
                chat_id,
                &format!("🔐 Permission request: {}\n{}", request.tool_name, detail),
                &keyboard,
            )
            .await;
    }

    // ── text turns ──────────────────────────────────────────────────────

    async fn handle_text(&self, chat_id: ChatId, text: String) {
        match self.pending.take_input() {
            InputMode::AwaitImageCount { key } => {
                self.deliver_images(chat_id, &key, text.trim()).await;
                return;
            }
            InputMode::AwaitTimerFrequency => {
                match text.trim().parse::<u64>() {
                    Ok(minutes) if minutes > 0 => {
                        self.pending.set_input(InputMode::AwaitTimerPrompt {
                            frequency_min: minutes,
                        });
                        self.notifier
                            .text(chat_id, "And what should I send each time?")
                            .await;
                    }
                    _ => {
                        self.notifier
                            .text(chat_id, "I need a number of minutes; timer setup cancelled.")
                            .await;
                    }
                }
                return;
            }
            InputMode::AwaitTimerPrompt { frequency_min } => {
                self.start_timer(chat_id, frequency_min, text.trim().to_string())
                    .await;
                return;
            }
            InputMode::None => {}
        }

        let Some(attached) = self.ensure_attached(chat_id).await else {
            return;
        };
        self.run_turn(chat_id, &attached, &text, false).await;
    }

    /// The text-turn pipeline: interrupt a running turn, capture a fresh
    /// baseline, inject, arm the watch, keep typing until it completes.
    async fn run_turn(
        &self,
        chat_id: ChatId,
        attached: &AttachedSession,
        text: &str,
        voice_reply: bool,
    ) {
        if self.manager.is_active() {
            if let FindOutcome::Found(pane) = locator::find(&self.mux, &attached.cwd).await {
                self.injector.send_interrupt(&pane).await;
            }
            self.manager.stop_and_flush();
            tokio::time::sleep(env::interrupt_settle()).await;
        }

        let baseline = self.manager.snapshot_baseline(&attached.cwd);

        let fallback = self.pending.launched_pane();
        match self.injector.inject(&attached.cwd, text, fallback.as_ref()).await {
            InjectOutcome::Injected { .. } => {}
            InjectOutcome::NotInjected { reason } => {
                self.notifier
                    .text(
                        chat_id,
                        &format!(
                            "No agent is running at this session ({reason}). Use /sessions to pick or launch one."
                        ),
                    )
                    .await;
                return;
            }
        }

        let (done_tx, done_rx) = oneshot::channel();
        self.manager
            .start_turn(attached, chat_id, baseline, Some(done_tx))
            .await;
        self.spawn_turn_tail(chat_id, attached.cwd.clone(), done_rx, voice_reply);
    }

    /// Keep the typing indicator alive until the turn completes, then
    /// optionally speak the reply for voice-initiated turns.
    fn spawn_turn_tail(
        &self,
        chat_id: ChatId,
        cwd: std::path::PathBuf,
        mut done_rx: oneshot::Receiver<()>,
        voice_reply: bool,
    ) {
        let chat = self.chat.clone();
        let index = self.index.clone();
        let speech = self.speech.clone();
        let assist = self.assist.clone();
        tokio::spawn(async move {
            loop {
                let _ = chat.typing(chat_id).await;
                tokio::select! {
                    _ = tokio::time::sleep(env::typing_refresh()) => {}
                    _ = &mut done_rx => break,
                }
            }

            if !voice_reply {
                return;
            }
            let Some((_, file)) = index.latest_session_file_for_cwd(&cwd) else {
                return;
            };
            let Some(text) = assistant_tail_of_file(&file).text else {
                return;
            };
            let narrated = match assist.narrate(&text).await {
                Ok(narrated) => narrated,
                Err(_) => return, // text reply already streamed
            };
            match speech.synthesize(&narrated).await {
                Ok(bytes) => {
                    let _ = chat.send_voice(chat_id, bytes).await;
                }
                Err(e) => tracing::debug!(error = %e, "voice synthesis unavailable"),
            }
        });
    }

    /// Resolve the attached session, auto-attaching to the most recent one.
    async fn ensure_attached(&self, chat_id: ChatId) -> Option<AttachedSession> {
        if let Some(attached) = self.store.attached() {
            return Some(attached);
        }

        let sessions = self.index.list_sessions(1);
        let newest = sessions.first()?.clone();
        let attached = AttachedSession {
            session_id: newest.session_id.clone(),
            cwd: newest.cwd.clone(),
        };
        if let Err(e) = self.store.set_attached(&attached) {
            tracing::warn!(error = %e, "failed to write attached marker");
        }
        self.notifier
            .text(
                chat_id,
                &format!(
                    "Attached to {} ({}).",
                    newest.project_name,
                    newest.cwd.display()
                ),
            )
            .await;
        Some(attached)
    }

    // ── commands ────────────────────────────────────────────────────────

    async fn handle_command(&self, chat_id: ChatId, name: &str, args: &str) {
        match name {
            "help" | "start" => {
                self.notifier.text(chat_id, HELP).await;
            }
            "status" => self.cmd_status(chat_id).await,
            "sessions" => self.cmd_sessions(chat_id).await,
            "detach" => self.cmd_detach(chat_id).await,
            "summarize" => self.cmd_summarize(chat_id).await,
            "compact" | "clear" => {
                if let Some(attached) = self.ensure_attached(chat_id).await {
                    self.run_turn(chat_id, &attached, &format!("/{name}"), false)
                        .await;
                }
            }
            "close_session" => self.cmd_close_session(chat_id).await,
            "polishvoice" => self.cmd_polishvoice(chat_id).await,
            "images" => self.cmd_images(chat_id).await,
            "timer" => self.cmd_timer(chat_id, args).await,
            "model" => {
                let buttons = MODEL_CHOICES
                    .iter()
                    .map(|m| Button::new(*m, format!("model:{m}")))
                    .collect();
                self.notifier
                    .keyboard(chat_id, "Switch the agent's model:", &Keyboard::column(buttons))
                    .await;
            }
            "escape" => {
                if let Some(pane) = self.attached_pane().await {
                    self.injector.send_key(&pane, "Escape").await;
                    self.notifier.text(chat_id, "Sent Escape.").await;
                } else {
                    self.notifier.text(chat_id, "No agent pane found.").await;
                }
            }
            "restart" => self.cmd_restart(chat_id).await,
            _ => {
                self.notifier
                    .text(chat_id, "Unknown command — see /help.")
                    .await;
            }
        }
    }

    async fn cmd_status(&self, chat_id: ChatId) {
        let mut lines = Vec::new();
        match self.store.attached() {
            Some(attached) => {
                lines.push(format!(
                    "Attached: {} at {}",
                    attached.session_id,
                    attached.cwd.display()
                ));
                match locator::find(&self.mux, &attached.cwd).await {
                    FindOutcome::Found(pane) => lines.push(format!("Agent pane: {pane}")),
                    FindOutcome::NotFound(reason) => lines.push(format!("Agent pane: {reason}")),
                }
            }
            None => lines.push("Attached: nothing".to_string()),
        }
        lines.push(format!(
            "Turn watch: {}",
            if self.manager.is_active() { "active" } else { "idle" }
        ));
        if let Some(settings) = self.timer.current() {
            lines.push(format!(
                "Timer: every {} min — {}",
                settings.frequency_min, settings.prompt
            ));
        }
        self.notifier.text(chat_id, &lines.join("\n")).await;
    }

    async fn cmd_sessions(&self, chat_id: ChatId) {
        let mut buttons = Vec::new();
        let mut listed = std::collections::HashSet::new();

        // Panes running the agent come first, deduped by cwd, each resolved
        // to its cwd's newest session file.
        let mut seen_cwds = std::collections::HashSet::new();
        for pane in self.mux.list_panes().await {
            if !locator::is_agent_command(&pane.command) || !seen_cwds.insert(pane.cwd.clone()) {
                continue;
            }
            let Some((session_id, _)) = self.index.latest_session_file_for_cwd(&pane.cwd) else {
                continue;
            };
            let project_name = project_label(&pane.cwd);
            self.pending.remember_session(
                session_id.clone(),
                PendingSession {
                    cwd: pane.cwd.clone(),
                    project_name: project_name.clone(),
                },
            );
            buttons.push(Button::new(
                format!("🟢 {project_name}"),
                format!("attach:{session_id}"),
            ));
            listed.insert(session_id);
        }

        // Recent sessions with no live pane still get a row; tapping one
        // leads into the launch flow.
        for entry in self.index.list_sessions(8) {
            if listed.contains(&entry.session_id) {
                continue;
            }
            self.pending.remember_session(
                entry.session_id.clone(),
                PendingSession {
                    cwd: entry.cwd.clone(),
                    project_name: entry.project_name.clone(),
                },
            );
            let label = match &entry.last_message {
                Some(last) => format!("{} · {}", entry.project_name, snippet(last, 32)),
                None => entry.project_name.clone(),
            };
            buttons.push(Button::new(label, format!("attach:{}", entry.session_id)));
        }

        // Checkouts from the configured repos folder that have no session
        // yet can be started fresh.
        for name in self.repo_checkouts(&seen_cwds) {
            buttons.push(Button::new(format!("📁 {name}"), format!("new:{name}")));
        }

        if buttons.is_empty() {
            self.notifier
                .text(chat_id, "No sessions found under the agent's project tree.")
                .await;
            return;
        }
        self.notifier
            .keyboard(chat_id, "Pick a session:", &Keyboard::column(buttons))
            .await;
    }

    /// Top-level directories of the repos folder without a live agent pane.
    fn repo_checkouts(&self, running: &std::collections::HashSet<std::path::PathBuf>) -> Vec<String> {
        let Some(repos) = &self.repos_folder else {
            return Vec::new();
        };
        let Ok(entries) = std::fs::read_dir(repos) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_dir())
            .filter(|e| !running.contains(&e.path()))
            .map(|e| e.file_name().to_string_lossy().to_string())
            .filter(|name| !name.starts_with('.'))
            .collect();
        names.sort();
        names.truncate(6);
        names
    }

    async fn cmd_detach(&self, chat_id: ChatId) {
        let Some(attached) = self.store.attached() else {
            self.notifier.text(chat_id, "Nothing attached.").await;
            return;
        };
        match locator::find(&self.mux, &attached.cwd).await {
            FindOutcome::Found(_) => {
                let keyboard = Keyboard::rows(vec![vec![
                    Button::new("Close window", "detach:close"),
                    Button::new("Keep it", "detach:keep"),
                ]]);
                self.notifier
                    .keyboard(chat_id, "Close the agent window too?", &keyboard)
                    .await;
            }
            FindOutcome::NotFound(_) => {
                self.store.clear_attached();
                self.notifier.text(chat_id, "Detached.").await;
            }
        }
    }

    async fn cmd_summarize(&self, chat_id: ChatId) {
        let Some(attached) = self.store.attached() else {
            self.notifier.text(chat_id, "Nothing attached.").await;
            return;
        };
        let file = self
            .index
            .session_file_path(&attached.session_id)
            .or_else(|| {
                self.index
                    .latest_session_file_for_cwd(&attached.cwd)
                    .map(|(_, path)| path)
            });
        let Some(file) = file else {
            self.notifier.text(chat_id, "No transcript yet.").await;
            return;
        };
        let Some(text) = assistant_tail_of_file(&file).text else {
            self.notifier
                .text(chat_id, "The agent has not replied yet.")
                .await;
            return;
        };
        let summary = self
            .assist
            .summarize(&text)
            .await
            .unwrap_or_else(|_| text.clone());
        self.notifier.text(chat_id, &summary).await;
    }

    async fn cmd_close_session(&self, chat_id: ChatId) {
        let Some(attached) = self.store.attached() else {
            self.notifier.text(chat_id, "Nothing attached.").await;
            return;
        };
        self.manager.clear();
        match locator::find(&self.mux, &attached.cwd).await {
            FindOutcome::Found(pane) => {
                if let Err(e) = self.mux.kill_window(&pane).await {
                    tracing::warn!(error = %e, "failed to kill agent window");
                }
                self.store.clear_attached();
                self.notifier
                    .text(chat_id, "Closed the agent window and detached.")
                    .await;
            }
            FindOutcome::NotFound(_) => {
                self.store.clear_attached();
                self.notifier
                    .text(chat_id, "No agent window found; detached.")
                    .await;
            }
        }
    }

    async fn cmd_polishvoice(&self, chat_id: ChatId) {
        let enable = !self.store.polish_enabled();
        if let Err(e) = self.store.set_polish_enabled(enable) {
            tracing::warn!(error = %e, "failed to toggle polish flag");
        }
        self.notifier
            .text(
                chat_id,
                if enable {
                    "Voice polishing is on."
                } else {
                    "Voice polishing is off."
                },
            )
            .await;
    }

    async fn cmd_images(&self, chat_id: ChatId) {
        let Some((key, count)) = self.pending.newest_image_batch() else {
            self.notifier.text(chat_id, "No images pending.").await;
            return;
        };
        self.pending.set_input(InputMode::AwaitImageCount { key });
        self.notifier
            .text(
                chat_id,
                &format!("There are {count} image(s). How many should I send?"),
            )
            .await;
    }

    async fn deliver_images(&self, chat_id: ChatId, key: &str, reply: &str) {
        let Ok(count) = reply.parse::<usize>() else {
            self.notifier
                .text(chat_id, "I needed a number; the images stay queued under /images.")
                .await;
            return;
        };
        let Some(images) = self.pending.take_images(key) else {
            self.notifier.text(chat_id, "Those images are gone.").await;
            return;
        };
        for (i, image) in images.into_iter().take(count).enumerate() {
            let Ok(bytes) = base64::engine::general_purpose::STANDARD.decode(&image.data) else {
                continue;
            };
            let ext = image
                .media_type
                .strip_prefix("image/")
                .unwrap_or("png")
                .replace("jpeg", "jpg");
            if let Err(e) = self
                .chat
                .send_photo(chat_id, bytes, &format!("capture-{}.{ext}", i + 1))
                .await
            {
                tracing::warn!(error = %e, "photo upload failed");
            }
        }
    }

    async fn cmd_timer(&self, chat_id: ChatId, args: &str) {
        let args = args.trim();
        if args.eq_ignore_ascii_case("stop") {
            match self.timer.stop() {
                Some(settings) => {
                    self.notifier
                        .text(
                            chat_id,
                            &format!(
                                "Stopped the every-{}-min prompt ({}).",
                                settings.frequency_min, settings.prompt
                            ),
                        )
                        .await;
                }
                None => {
                    self.notifier.text(chat_id, "No timer running.").await;
                }
            }
            return;
        }

        if let Some((freq, prompt)) = args.split_once(char::is_whitespace) {
            if let Ok(minutes) = freq.parse::<u64>() {
                if minutes > 0 {
                    self.start_timer(chat_id, minutes, prompt.trim().to_string())
                        .await;
                    return;
                }
            }
        }

        self.pending.set_input(InputMode::AwaitTimerFrequency);
        self.notifier
            .text(chat_id, "Every how many minutes should I prompt the agent?")
            .await;
    }

    async fn start_timer(&self, chat_id: ChatId, frequency_min: u64, prompt: String) {
        if prompt.is_empty() {
            self.notifier
                .text(chat_id, "The timer needs a prompt; setup cancelled.")
                .await;
            return;
        }
        let deps = TimerDeps {
            manager: self.manager.clone(),
            injector: self.injector.clone(),
            store: self.store.clone(),
            pending: self.pending.clone(),
            chat_id,
        };
        let replaced = self.timer.start(deps, frequency_min, prompt.clone());
        let mut notice = format!("Prompting every {frequency_min} min: {prompt}");
        if let Some(prior) = replaced {
            notice.push_str(&format!(" (replaced the every-{}-min one)", prior.frequency_min));
        }
        self.notifier.text(chat_id, &notice).await;
    }

    async fn cmd_restart(&self, chat_id: ChatId) {
        let Some(pane) = self.attached_pane().await else {
            self.notifier.text(chat_id, "No agent pane found.").await;
            return;
        };
        // Two interrupts drop whatever the agent is doing, then the resume
        // command brings it back in the same pane.
        self.injector.send_key(&pane, "C-c").await;
        tokio::time::sleep(env::interrupt_settle()).await;
        self.injector.send_key(&pane, "C-c").await;
        tokio::time::sleep(env::interrupt_settle()).await;
        if let Err(e) = self.mux.send_text(&pane, &locator::launch_command(false)).await {
            tracing::warn!(error = %e, "restart command failed");
            return;
        }
        tokio::time::sleep(env::interrupt_settle()).await;
        let _ = self.mux.send_key(&pane, "Enter").await;
        self.notifier.text(chat_id, "Restarting the agent…").await;
    }

    // ── callbacks ───────────────────────────────────────────────────────

    async fn handle_callback(
        &self,
        chat_id: ChatId,
        callback_id: &str,
        message: Option<MessageRef>,
        data: &str,
    ) {
        let mut parts = data.splitn(3, ':');
        let namespace = parts.next().unwrap_or_default();
        let arg1 = parts.next().unwrap_or_default();
        let arg2 = parts.next().unwrap_or_default();

        match namespace {
            "attach" => {
                self.answer(callback_id, "Attaching…").await;
                self.cb_attach(chat_id, message, &SessionId::new(arg1)).await;
            }
            "launch" => {
                self.answer(callback_id, "OK").await;
                self.cb_launch(chat_id, message, arg1, arg2).await;
            }
            "detach" => {
                self.answer(callback_id, "Detaching…").await;
                self.cb_detach(chat_id, message, arg1).await;
            }
            "perm" => {
                let action = if arg2 == "approve" {
                    PermissionAction::Approve
                } else {
                    PermissionAction::Deny
                };
                self.answer(
                    callback_id,
                    if action == PermissionAction::Approve {
                        "Approved"
                    } else {
                        "Denied"
                    },
                )
                .await;
                self.cb_permission(chat_id, message, &RequestId::new(arg1), action)
                    .await;
            }
            "plan" => {
                self.answer(callback_id, "Sending choice…").await;
                if let Some(pane) = self.attached_pane().await {
                    if matches!(arg1, "1" | "2" | "3" | "4") {
                        self.injector.send_key(&pane, arg1).await;
                    }
                }
            }
            "model" => {
                self.answer(callback_id, arg1).await;
                if MODEL_CHOICES.contains(&arg1) {
                    if let Some(attached) = self.ensure_attached(chat_id).await {
                        self.run_turn(chat_id, &attached, &format!("/model {arg1}"), false)
                            .await;
                    }
                }
            }
            "new" => {
                self.answer(callback_id, "OK").await;
                let keyboard = Keyboard::column(vec![
                    Button::new("Launch", format!("launchdir:{arg1}:run")),
                    Button::new(
                        "Launch (skip permissions)",
                        format!("launchdir:{arg1}:skip"),
                    ),
                ]);
                self.notifier
                    .keyboard(chat_id, &format!("Start the agent in {arg1}?"), &keyboard)
                    .await;
            }
            "launchdir" => {
                self.answer(callback_id, "Launching…").await;
                self.cb_launch_dir(chat_id, message, arg1, arg2).await;
            }
            _ => {
                self.answer(callback_id, "Unknown action").await;
            }
        }
    }

    async fn cb_attach(
        &self,
        chat_id: ChatId,
        message: Option<MessageRef>,
        session_id: &SessionId,
    ) {
        let Some(session) = self.pending.session(session_id) else {
            self.notifier
                .text(chat_id, "That session list is stale — run /sessions again.")
                .await;
            return;
        };

        match locator::find(&self.mux, &session.cwd).await {
            FindOutcome::Found(_) => {
                let attached = AttachedSession {
                    session_id: session_id.clone(),
                    cwd: session.cwd.clone(),
                };
                if let Err(e) = self.store.set_attached(&attached) {
                    tracing::warn!(error = %e, "failed to write attached marker");
                }
                self.edit_or_send(
                    chat_id,
                    message,
                    &format!("Attached to {}.", session.project_name),
                )
                .await;
            }
            FindOutcome::NotFound(_) => {
                let keyboard = Keyboard::column(vec![
                    Button::new("Launch", format!("launch:{session_id}:run")),
                    Button::new(
                        "Launch (skip permissions)",
                        format!("launch:{session_id}:skip"),
                    ),
                    Button::new("Cancel", "launch:cancel:-"),
                ]);
                self.notifier
                    .keyboard(
                        chat_id,
                        &format!(
                            "No agent is running at {}. Launch one?",
                            session.cwd.display()
                        ),
                        &keyboard,
                    )
                    .await;
            }
        }
    }

    async fn cb_launch(
        &self,
        chat_id: ChatId,
        message: Option<MessageRef>,
        session_arg: &str,
        mode: &str,
    ) {
        if session_arg == "cancel" {
            self.edit_or_send(chat_id, message, "Launch cancelled.").await;
            return;
        }
        let session_id = SessionId::new(session_arg);
        let Some(session) = self.pending.session(&session_id) else {
            self.notifier
                .text(chat_id, "That session list is stale — run /sessions again.")
                .await;
            return;
        };

        let skip = mode == "skip";
        let pane = match locator::launch(&self.mux, &session.cwd, &session.project_name, skip).await
        {
            Ok(pane) => pane,
            Err(e) => {
                self.notifier
                    .text(chat_id, &format!("Launch failed: {e}"))
                    .await;
                return;
            }
        };
        self.pending.set_launched_pane(pane);

        let attached = AttachedSession {
            session_id,
            cwd: session.cwd.clone(),
        };
        if let Err(e) = self.store.set_attached(&attached) {
            tracing::warn!(error = %e, "failed to write attached marker");
        }

        // Wait for the locator to see the new pane before declaring ready.
        for _ in 0..env::launch_poll_attempts() {
            if let FindOutcome::Found(_) = locator::find(&self.mux, &session.cwd).await {
                self.edit_or_send(
                    chat_id,
                    message,
                    &format!("Agent ready at {}.", session.cwd.display()),
                )
                .await;
                return;
            }
            tokio::time::sleep(env::launch_poll()).await;
        }
        self.notifier
            .text(
                chat_id,
                "Launched, but the agent pane never reported in — check the terminal.",
            )
            .await;
    }

    /// Start the agent in a repos-folder checkout that has no session yet.
    /// The session file appears once the agent writes; the marker follows
    /// as soon as it does.
    async fn cb_launch_dir(
        &self,
        chat_id: ChatId,
        message: Option<MessageRef>,
        name: &str,
        mode: &str,
    ) {
        let Some(repos) = &self.repos_folder else {
            self.notifier.text(chat_id, "No repos folder configured.").await;
            return;
        };
        let cwd = repos.join(name);
        let skip = mode == "skip";
        let pane = match locator::launch(&self.mux, &cwd, name, skip).await {
            Ok(pane) => pane,
            Err(e) => {
                self.notifier
                    .text(chat_id, &format!("Launch failed: {e}"))
                    .await;
                return;
            }
        };
        self.pending.set_launched_pane(pane);

        for _ in 0..env::launch_poll_attempts() {
            if let Some((session_id, _)) = self.index.latest_session_file_for_cwd(&cwd) {
                let attached = AttachedSession {
                    session_id,
                    cwd: cwd.clone(),
                };
                if let Err(e) = self.store.set_attached(&attached) {
                    tracing::warn!(error = %e, "failed to write attached marker");
                }
                self.edit_or_send(
                    chat_id,
                    message,
                    &format!("Agent ready at {}.", cwd.display()),
                )
                .await;
                return;
            }
            tokio::time::sleep(env::launch_poll()).await;
        }
        self.notifier
            .text(
                chat_id,
                "Launched, but no session file appeared — check the terminal.",
            )
            .await;
    }

    async fn cb_detach(&self, chat_id: ChatId, message: Option<MessageRef>, mode: &str) {
        let pane = self.attached_pane().await;
        self.manager.clear();
        self.store.clear_attached();
        if mode == "close" {
            if let Some(pane) = pane {
                if let Err(e) = self.mux.kill_window(&pane).await {
                    tracing::warn!(error = %e, "failed to kill agent window");
                }
            }
            self.edit_or_send(chat_id, message, "Detached; window closed.").await;
        } else {
            self.edit_or_send(chat_id, message, "Detached; window kept.").await;
        }
    }

    /// Both halves of a permission reply are fire-and-forget on purpose:
    /// some agent prompts consume the response file, some only a keypress.
    async fn cb_permission(
        &self,
        chat_id: ChatId,
        message: Option<MessageRef>,
        request_id: &RequestId,
        action: PermissionAction,
    ) {
        if let Err(e) = respond_to_permission(self.store.dir(), request_id, action) {
            tracing::warn!(error = %e, "failed to write permission response");
        }
        if let Some(pane) = self.attached_pane().await {
            let key = match action {
                PermissionAction::Approve => "1",
                PermissionAction::Deny => "Escape",
            };
            self.injector.send_key(&pane, key).await;
        }
        let verdict = match action {
            PermissionAction::Approve => "✅ Approved.",
            PermissionAction::Deny => "🚫 Denied.",
        };
        self.edit_or_send(chat_id, message, verdict).await;
    }

    // ── media intake ────────────────────────────────────────────────────

    async fn handle_voice(&self, chat_id: ChatId, file_id: &str, file_name: Option<&str>) {
        let audio = match self.chat.download_file(file_id).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, "voice download failed");
                self.notifier
                    .text(chat_id, "Couldn't download that voice note.")
                    .await;
                return;
            }
        };

        let raw = match self.speech.transcribe(audio, file_name).await {
            Ok(text) => text,
            Err(e) => {
                tracing::debug!(error = %e, "transcription unavailable");
                self.notifier
                    .text(chat_id, "Voice transcription is not available.")
                    .await;
                return;
            }
        };

        let text = if self.store.polish_enabled() {
            self.assist.polish(&raw).await.unwrap_or_else(|_| raw.clone())
        } else {
            raw.clone()
        };

        self.notifier.text(chat_id, &format!("🎤 {text}")).await;
        let Some(attached) = self.ensure_attached(chat_id).await else {
            return;
        };
        self.run_turn(chat_id, &attached, &text, true).await;
    }

    async fn handle_inbound_image(
        &self,
        chat_id: ChatId,
        file_id: &str,
        mime: Option<String>,
        file_name: Option<String>,
        caption: Option<String>,
    ) {
        let bytes = match self.chat.download_file(file_id).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, "image download failed");
                self.notifier
                    .text(chat_id, "Couldn't download that image.")
                    .await;
                return;
            }
        };

        let extension = image_extension(mime.as_deref(), file_name.as_deref());
        let path = match self.store.stage_image(extension, &bytes) {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(error = %e, "image staging failed");
                self.notifier.text(chat_id, "Couldn't stage that image.").await;
                return;
            }
        };

        let text = match caption.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            Some(caption) => format!("{caption}\n(see the image at {})", path.display()),
            None => format!("Look at the image at {}", path.display()),
        };

        let Some(attached) = self.ensure_attached(chat_id).await else {
            return;
        };
        self.run_turn(chat_id, &attached, &text, false).await;
    }

    // ── helpers ─────────────────────────────────────────────────────────

    async fn attached_pane(&self) -> Option<PaneId> {
        let attached = self.store.attached()?;
        match locator::find(&self.mux, &attached.cwd).await {
            FindOutcome::Found(pane) => Some(pane),
            FindOutcome::NotFound(_) => self.pending.launched_pane(),
        }
    }

    fn notify_chat(&self) -> Option<ChatId> {
        self.allowed_chat.or_else(|| self.store.chat_id())
    }

    async fn answer(&self, callback_id: &str, text: &str) {
        if let Err(e) = self.chat.answer_callback(callback_id, text).await {
            tracing::debug!(error = %e, "callback answer failed");
        }
    }

    async fn edit_or_send(&self, chat_id: ChatId, message: Option<MessageRef>, text: &str) {
        match message {
            Some(message) => {
                if self.chat.edit_text(chat_id, message, text).await.is_err() {
                    self.notifier.text(chat_id, text).await;
                }
            }
            None => {
                self.notifier.text(chat_id, text).await;
            }
        }
    }
}

fn project_label(cwd: &Path) -> String {
    cwd.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| cwd.display().to_string())
}

fn snippet(text: &str, max: usize) -> String {
    let flat = text.replace('\n', " ");
    let mut out: String = flat.chars().take(max).collect();
    if flat.chars().count() > max {
        out.push('…');
    }
    out
}

fn compact_json(value: &serde_json::Value) -> String {
    let rendered = match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    snippet(&rendered, 200)
}

fn image_extension(mime: Option<&str>, file_name: Option<&str>) -> &'static str {
    match mime {
        Some("image/png") => return "png",
        Some("image/jpeg") => return "jpg",
        Some("image/gif") => return "gif",
        Some("image/webp") => return "webp",
        _ => {}
    }
    match file_name.and_then(|n| n.rsplit('.').next()) {
        Some(ext) if ext.eq_ignore_ascii_case("png") => "png",
        Some(ext) if ext.eq_ignore_ascii_case("gif") => "gif",
        Some(ext) if ext.eq_ignore_ascii_case("webp") => "webp",
        _ => "jpg",
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;

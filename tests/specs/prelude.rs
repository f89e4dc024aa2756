//! Test helpers for behavioral specifications.
//!
//! A `Bridge` is the full engine wired to fake chat/mux adapters and a
//! temp-dir agent project tree, plus helpers for playing the agent's side
//! (appending transcript records, rotating session files).

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tether_adapters::{
    FakeAssistAdapter, FakeChatAdapter, FakeMuxAdapter, FakeSpeechAdapter, SessionIndex,
    StateStore,
};
use tether_core::{AttachedSession, BridgeConfig, ChatId, SessionId};
use tether_engine::{Coordinator, PendingTables, PromptTimer, TurnManager};

pub const CHAT: ChatId = ChatId(1);

/// How long specs wait for asynchronous effects before failing.
pub const SPEC_WAIT_MAX_MS: u64 = 3_000;
pub const SPEC_POLL_INTERVAL_MS: u64 = 25;

pub type SpecCoordinator =
    Coordinator<FakeChatAdapter, FakeMuxAdapter, FakeSpeechAdapter, FakeAssistAdapter>;

pub struct Bridge {
    pub projects: TempDir,
    pub state: TempDir,
    pub chat: FakeChatAdapter,
    pub mux: FakeMuxAdapter,
    pub speech: FakeSpeechAdapter,
    pub store: StateStore,
    pub index: SessionIndex,
    pub pending: PendingTables,
    pub manager: TurnManager<FakeChatAdapter>,
    pub coordinator: SpecCoordinator,
    pub cwd: PathBuf,
    pub project_dir: PathBuf,
}

/// Shrink every pipeline timeout so specs run in milliseconds. Serialized
/// tests only; the vars are process-global.
pub fn fast_env() {
    std::env::set_var("TETHER_KEY_DELAY_MS", "1");
    std::env::set_var("TETHER_INTERRUPT_SETTLE_MS", "10");
    std::env::set_var("TETHER_RESULT_GRACE_MS", "50");
    std::env::set_var("TETHER_HARD_IDLE_MS", "10000");
    std::env::set_var("TETHER_PING_MS", "10000");
    std::env::set_var("TETHER_STALL_QUIET_MS", "10000");
    std::env::set_var("TETHER_ROTATION_POLL_MS", "100");
    std::env::set_var("TETHER_ROTATION_GIVE_UP_MS", "10000");
    std::env::set_var("TETHER_TYPING_REFRESH_MS", "100");
    std::env::set_var("TETHER_LAUNCH_POLL_MS", "10");
    std::env::set_var("TETHER_TIMER_PERIOD_MS", "600000");
}

/// A bridge attached to session `s1` at a fake project, with one agent pane.
pub fn bridge() -> Bridge {
    bridge_with_allowlist(None)
}

pub fn bridge_with_allowlist(allowed: Option<ChatId>) -> Bridge {
    fast_env();

    let projects = TempDir::new().unwrap();
    let state = TempDir::new().unwrap();
    let cwd = PathBuf::from("/tmp/spec-proj");
    let project_dir = projects
        .path()
        .join(tether_core::paths::encode_cwd(&cwd));
    std::fs::create_dir_all(&project_dir).unwrap();
    std::fs::write(project_dir.join("s1.jsonl"), "").unwrap();

    let chat = FakeChatAdapter::new();
    let mux = FakeMuxAdapter::new();
    mux.add_pane("%1", 100, "claude", &cwd);
    let speech = FakeSpeechAdapter::new();

    let store = StateStore::new(state.path().to_path_buf());
    store
        .set_attached(&AttachedSession {
            session_id: SessionId::new("s1"),
            cwd: cwd.clone(),
        })
        .unwrap();

    let index = SessionIndex::new(projects.path().to_path_buf());
    let pending = PendingTables::new();
    let manager = TurnManager::new(chat.clone(), index.clone(), store.clone(), pending.clone());
    let coordinator = Coordinator::new(
        chat.clone(),
        mux.clone(),
        speech.clone(),
        FakeAssistAdapter::new(),
        manager.clone(),
        PromptTimer::new(),
        index.clone(),
        store.clone(),
        pending.clone(),
        BridgeConfig {
            repos_folder: None,
            allowed_chat_id: allowed,
        },
    );

    Bridge {
        projects,
        state,
        chat,
        mux,
        speech,
        store,
        index,
        pending,
        manager,
        coordinator,
        cwd,
        project_dir,
    }
}

impl Bridge {
    pub fn transcript(&self) -> PathBuf {
        self.project_dir.join("s1.jsonl")
    }

    /// Append one raw record line to a transcript.
    pub fn append(&self, path: &Path, line: &str) {
        let mut f = std::fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(path)
            .unwrap();
        writeln!(f, "{line}").unwrap();
    }

    /// Append an assistant text block.
    pub fn agent_says(&self, path: &Path, text: &str) {
        self.append(
            path,
            &format!(
                r#"{{"type":"assistant","cwd":"{}","message":{{"content":[{{"type":"text","text":"{text}"}}]}}}}"#,
                self.cwd.display()
            ),
        );
    }

    /// Append the hook's turn-over record.
    pub fn agent_finishes(&self, path: &Path) {
        self.append(path, r#"{"type":"result","subtype":"success"}"#);
    }

    /// Create a strictly newer transcript in the same project (a rotation).
    pub fn rotate_to(&self, session_id: &str) -> PathBuf {
        let path = self.project_dir.join(format!("{session_id}.jsonl"));
        std::fs::write(&path, "{\"type\":\"file-history-snapshot\"}\n").unwrap();
        let later = std::time::SystemTime::now() + Duration::from_secs(60);
        std::fs::File::options()
            .append(true)
            .open(&path)
            .unwrap()
            .set_modified(later)
            .unwrap();
        path
    }

    /// Poll until `predicate` holds or the spec deadline expires.
    pub async fn wait_until(&self, what: &str, predicate: impl Fn() -> bool) {
        let mut waited = 0;
        while !predicate() {
            assert!(
                waited < SPEC_WAIT_MAX_MS,
                "timed out after {SPEC_WAIT_MAX_MS}ms waiting for: {what}"
            );
            tokio::time::sleep(Duration::from_millis(SPEC_POLL_INTERVAL_MS)).await;
            waited += SPEC_POLL_INTERVAL_MS;
        }
    }

    pub async fn user_says(&self, text: &str) {
        self.coordinator
            .handle_update(tether_adapters::ChatUpdate::Text {
                chat_id: CHAT,
                text: text.to_string(),
            })
            .await;
    }

    pub async fn user_runs(&self, name: &str, args: &str) {
        self.coordinator
            .handle_update(tether_adapters::ChatUpdate::Command {
                chat_id: CHAT,
                name: name.to_string(),
                args: args.to_string(),
            })
            .await;
    }

    pub async fn user_taps(&self, data: &str) {
        self.coordinator
            .handle_update(tether_adapters::ChatUpdate::Callback {
                chat_id: CHAT,
                callback_id: "cb".to_string(),
                message: None,
                data: data.to_string(),
            })
            .await;
    }
}

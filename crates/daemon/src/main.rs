// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tether Authors

//! Tether daemon (tetherd)
//!
//! Long-running bridge process: polls the chat platform, watches the agent's
//! transcripts and permission requests, and drives tmux panes.
//!
//! Architecture:
//! - Update loop: long-polls the chat platform, feeds the coordinator
//! - Permission watcher: filesystem events from the agent hook
//! - Coordinator: processes both streams sequentially

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::path::Path;

use tether_adapters::{
    watch_permission_requests, NoOpAssistAdapter, NoOpSpeechAdapter, SessionIndex, StateStore,
    TelegramChat, TmuxAdapter,
};
use tether_core::paths::LOG_FILE;
use tether_engine::{Coordinator, PendingTables, PromptTimer, TurnManager};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("tetherd {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("tetherd {}", env!("CARGO_PKG_VERSION"));
                println!("Tether daemon - chat remote for a terminal coding agent");
                println!();
                println!("USAGE:");
                println!("    TETHER_BOT_TOKEN=<token> tetherd");
                println!();
                println!("ENVIRONMENT:");
                println!("    TETHER_BOT_TOKEN     Bot API token (required)");
                println!("    TETHER_CONFIG_DIR    State directory (default ~/.tether)");
                println!("    CLAUDE_CONFIG_DIR    Agent state root (default ~/.claude)");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help       Print help information");
                println!("    -v, --version    Print version information");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: tetherd [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    // Missing credentials are the only fatal startup error.
    let Ok(token) = std::env::var("TETHER_BOT_TOKEN") else {
        eprintln!("error: TETHER_BOT_TOKEN is not set");
        eprintln!("Create a bot with @BotFather and export its token.");
        std::process::exit(1);
    };

    let store = StateStore::from_env();
    let log_path = store.dir().join(LOG_FILE);
    rotate_log_if_needed(&log_path);
    let _log_guard = setup_logging(&log_path)?;

    info!("starting tether daemon");

    let config = store.load_config();
    let chat = TelegramChat::new(&token);
    let mux = TmuxAdapter::new();
    let index = SessionIndex::from_env();
    let pending = PendingTables::new();
    let manager = TurnManager::new(chat.clone(), index.clone(), store.clone(), pending.clone());
    let timer = PromptTimer::new();

    let coordinator = Coordinator::new(
        chat.clone(),
        mux,
        NoOpSpeechAdapter::new(),
        NoOpAssistAdapter::new(),
        manager.clone(),
        timer.clone(),
        index,
        store.clone(),
        pending,
        config.clone(),
    );

    // Inbound streams: chat updates and permission requests.
    let (update_tx, mut update_rx) = mpsc::channel(64);
    tokio::spawn(chat.clone().run_updates(update_tx));

    let (perm_tx, mut perm_rx) = mpsc::channel(16);
    let _perm_watcher = match watch_permission_requests(store.dir(), perm_tx) {
        Ok(watcher) => Some(watcher),
        Err(e) => {
            error!(error = %e, "permission watcher failed to start");
            None
        }
    };

    // Tell the operator the bridge is back, if we know where they are.
    if let Some(chat_id) = config.allowed_chat_id.or_else(|| store.chat_id()) {
        use tether_adapters::ChatAdapter;
        if let Err(e) = chat.send_text(chat_id, "🔌 Bridge online.").await {
            tracing::warn!(error = %e, "startup notice failed");
        }
    }

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    info!("daemon ready");

    loop {
        tokio::select! {
            Some(update) = update_rx.recv() => {
                coordinator.handle_update(update).await;
            }

            Some(request) = perm_rx.recv() => {
                coordinator.handle_permission(request).await;
            }

            _ = sigterm.recv() => {
                info!("received SIGTERM, shutting down");
                break;
            }

            _ = sigint.recv() => {
                info!("received SIGINT, shutting down");
                break;
            }
        }
    }

    // Discard any in-flight watch without firing its completion.
    manager.clear();
    timer.stop();
    info!("daemon stopped");
    Ok(())
}

/// Maximum log file size before rotation (10 MB).
const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Number of rotated log files to keep.
const MAX_ROTATED_LOGS: u32 = 3;

/// Rotate the daemon log file if it exceeds [`MAX_LOG_SIZE`].
///
/// Shifts `daemon.log` → `daemon.log.1` → `daemon.log.2` → `daemon.log.3`,
/// deleting the oldest. Best-effort: rotation failures are silently ignored
/// so the daemon still starts.
fn rotate_log_if_needed(log_path: &Path) {
    let size = match std::fs::metadata(log_path) {
        Ok(m) => m.len(),
        Err(_) => return,
    };

    if size < MAX_LOG_SIZE {
        return;
    }

    let log_str = log_path.display().to_string();
    for i in (1..MAX_ROTATED_LOGS).rev() {
        let from = format!("{log_str}.{i}");
        let to = format!("{log_str}.{}", i + 1);
        let _ = std::fs::rename(&from, &to);
    }
    let _ = std::fs::rename(log_path, format!("{log_str}.1"));
}

fn setup_logging(
    log_path: &Path,
) -> Result<tracing_appender::non_blocking::WorkerGuard, Box<dyn std::error::Error>> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let dir = log_path.parent().ok_or("log path has no parent")?;
    std::fs::create_dir_all(dir)?;

    let file_name = log_path.file_name().ok_or("log path has no file name")?;
    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tether Authors

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters for external I/O: the terminal multiplexer, the agent's
//! transcript files, the bridge state directory, the permission hook, and
//! the chat / speech / assist collaborators.

pub mod assist;
pub mod chat;
mod env;
pub mod inject;
pub mod pane;
pub mod permission;
pub mod sessions;
pub mod speech;
pub mod store;
pub mod transcript;
pub mod watcher;

pub use assist::{AssistAdapter, AssistError, NoOpAssistAdapter};
pub use chat::{Button, ChatAdapter, ChatError, ChatUpdate, Keyboard, MessageRef, TelegramChat};
pub use inject::{InjectFailure, InjectOutcome, Injector};
pub use pane::{locator, MuxAdapter, MuxError, Pane, TmuxAdapter};
pub use permission::{
    respond_to_permission, watch_permission_requests, PermissionAction, PermissionRequest,
};
pub use sessions::SessionIndex;
pub use speech::{NoOpSpeechAdapter, SpeechAdapter, SpeechError};
pub use store::StateStore;
pub use watcher::{start_turn_watcher, TurnWatch, WatchHandle};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use assist::FakeAssistAdapter;
#[cfg(any(test, feature = "test-support"))]
pub use chat::{ChatCall, FakeChatAdapter};
#[cfg(any(test, feature = "test-support"))]
pub use pane::{FakeMuxAdapter, MuxCall};
#[cfg(any(test, feature = "test-support"))]
pub use speech::FakeSpeechAdapter;

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tether Authors

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Domain types for the tether bridge.
//!
//! Everything here is pure: transcript record schema and parsing, cwd
//! encoding, the waiting classifier, turn events, and the small structs the
//! adapters and engine pass around. File and process I/O live in
//! `tether-adapters`.

pub mod config;
pub mod event;
mod id;
pub mod paths;
pub mod session;
pub mod transcript;
pub mod waiting;

pub use config::BridgeConfig;
pub use event::{PendingImage, TurnEvent};
pub use id::{ChatId, PaneId, RequestId, SessionId};
pub use session::{AttachedSession, Baseline, PendingSession, SessionEntry};
pub use transcript::{AssistantTail, ContentBlock, ToolCall, TranscriptRecord, TranscriptSummary};
pub use waiting::{WaitingClassifier, WaitingKind, PLAN_CHOICES};

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tether Authors

//! Chat surface adapters

mod telegram;

pub use telegram::TelegramChat;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{ChatCall, FakeChatAdapter};

use async_trait::async_trait;
use tether_core::ChatId;
use thiserror::Error;

/// Errors from chat operations
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("request failed: {0}")]
    RequestFailed(String),
    #[error("platform rejected call: {0}")]
    Rejected(String),
    #[error("file unavailable: {0}")]
    FileUnavailable(String),
}

/// Reference to a message already sent, for later edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageRef(pub i64);

/// One inline-keyboard button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    /// Callback payload delivered back on tap.
    pub data: String,
}

impl Button {
    pub fn new(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            data: data.into(),
        }
    }
}

/// Inline keyboard attached to a message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    pub fn rows(rows: Vec<Vec<Button>>) -> Self {
        Self { rows }
    }

    /// One button per row.
    pub fn column(buttons: Vec<Button>) -> Self {
        Self {
            rows: buttons.into_iter().map(|b| vec![b]).collect(),
        }
    }
}

/// Inbound chat event, already translated from the platform's update shape.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatUpdate {
    Text {
        chat_id: ChatId,
        text: String,
    },
    /// A `/command` message; `args` is the remainder after the command word.
    Command {
        chat_id: ChatId,
        name: String,
        args: String,
    },
    /// Inline-keyboard tap.
    Callback {
        chat_id: ChatId,
        callback_id: String,
        message: Option<MessageRef>,
        data: String,
    },
    Voice {
        chat_id: ChatId,
        file_id: String,
        /// Path hint used to pick a transcription format, when known.
        file_name: Option<String>,
    },
    Photo {
        chat_id: ChatId,
        file_id: String,
        caption: Option<String>,
    },
    /// Document whose mime type is `image/*`; anything else is dropped at
    /// the adapter boundary.
    Document {
        chat_id: ChatId,
        file_id: String,
        mime: String,
        file_name: Option<String>,
        caption: Option<String>,
    },
}

impl ChatUpdate {
    pub fn chat_id(&self) -> ChatId {
        match self {
            ChatUpdate::Text { chat_id, .. }
            | ChatUpdate::Command { chat_id, .. }
            | ChatUpdate::Callback { chat_id, .. }
            | ChatUpdate::Voice { chat_id, .. }
            | ChatUpdate::Photo { chat_id, .. }
            | ChatUpdate::Document { chat_id, .. } => *chat_id,
        }
    }
}

/// Adapter for the chat platform (outbound surface)
#[async_trait]
pub trait ChatAdapter: Clone + Send + Sync + 'static {
    /// Send plain text.
    async fn send_text(&self, chat: ChatId, text: &str) -> Result<MessageRef, ChatError>;

    /// Send text with an inline keyboard.
    async fn send_keyboard(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: &Keyboard,
    ) -> Result<MessageRef, ChatError>;

    /// Replace the text (and drop the keyboard) of a prior message.
    async fn edit_text(
        &self,
        chat: ChatId,
        message: MessageRef,
        text: &str,
    ) -> Result<(), ChatError>;

    /// Upload a photo.
    async fn send_photo(
        &self,
        chat: ChatId,
        bytes: Vec<u8>,
        file_name: &str,
    ) -> Result<(), ChatError>;

    /// Upload a voice note (OGG/Opus bytes).
    async fn send_voice(&self, chat: ChatId, bytes: Vec<u8>) -> Result<(), ChatError>;

    /// Answer a callback with a short transient notice.
    async fn answer_callback(&self, callback_id: &str, text: &str) -> Result<(), ChatError>;

    /// Show a transient "typing" indicator.
    async fn typing(&self, chat: ChatId) -> Result<(), ChatError>;

    /// Download a platform file by its id.
    async fn download_file(&self, file_id: &str) -> Result<Vec<u8>, ChatError>;
}

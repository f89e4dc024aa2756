// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tether Authors

//! Fake chat adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{ChatAdapter, ChatError, Keyboard, MessageRef};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tether_core::ChatId;

/// Recorded chat call
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCall {
    SendText { chat: ChatId, text: String },
    SendKeyboard { chat: ChatId, text: String, keyboard: Keyboard },
    EditText { chat: ChatId, message: MessageRef, text: String },
    SendPhoto { chat: ChatId, file_name: String, bytes: usize },
    SendVoice { chat: ChatId, bytes: usize },
    AnswerCallback { callback_id: String, text: String },
    Typing { chat: ChatId },
    DownloadFile { file_id: String },
}

#[derive(Default)]
struct FakeChatState {
    calls: Vec<ChatCall>,
    files: HashMap<String, Vec<u8>>,
    next_message_id: i64,
    fail_next_sends: u32,
}

/// Fake chat adapter for testing
#[derive(Clone, Default)]
pub struct FakeChatAdapter {
    inner: Arc<Mutex<FakeChatState>>,
}

impl FakeChatAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<ChatCall> {
        self.inner.lock().calls.clone()
    }

    /// All plain texts sent, in order.
    pub fn sent_texts(&self) -> Vec<String> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                ChatCall::SendText { text, .. } => Some(text.clone()),
                ChatCall::SendKeyboard { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Keyboards sent, in order.
    pub fn sent_keyboards(&self) -> Vec<Keyboard> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                ChatCall::SendKeyboard { keyboard, .. } => Some(keyboard.clone()),
                _ => None,
            })
            .collect()
    }

    /// Count of outbound calls of any kind.
    pub fn outbound_count(&self) -> usize {
        self.inner
            .lock()
            .calls
            .iter()
            .filter(|c| !matches!(c, ChatCall::DownloadFile { .. }))
            .count()
    }

    /// Register a downloadable file.
    pub fn add_file(&self, file_id: &str, bytes: Vec<u8>) {
        self.inner.lock().files.insert(file_id.to_string(), bytes);
    }

    /// Fail the next `n` send calls with a request error.
    pub fn fail_next_sends(&self, n: u32) {
        self.inner.lock().fail_next_sends = n;
    }

    fn record(&self, call: ChatCall) -> Result<MessageRef, ChatError> {
        let mut state = self.inner.lock();
        if state.fail_next_sends > 0 {
            state.fail_next_sends -= 1;
            return Err(ChatError::RequestFailed("fake send failure".to_string()));
        }
        state.calls.push(call);
        state.next_message_id += 1;
        Ok(MessageRef(state.next_message_id))
    }
}

#[async_trait]
impl ChatAdapter for FakeChatAdapter {
    async fn send_text(&self, chat: ChatId, text: &str) -> Result<MessageRef, ChatError> {
        self.record(ChatCall::SendText {
            chat,
            text: text.to_string(),
        })
    }

    async fn send_keyboard(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: &Keyboard,
    ) -> Result<MessageRef, ChatError> {
        self.record(ChatCall::SendKeyboard {
            chat,
            text: text.to_string(),
            keyboard: keyboard.clone(),
        })
    }

    async fn edit_text(
        &self,
        chat: ChatId,
        message: MessageRef,
        text: &str,
    ) -> Result<(), ChatError> {
        self.record(ChatCall::EditText {
            chat,
            message,
            text: text.to_string(),
        })
        .map(|_| ())
    }

    async fn send_photo(
        &self,
        chat: ChatId,
        bytes: Vec<u8>,
        file_name: &str,
    ) -> Result<(), ChatError> {
        self.record(ChatCall::SendPhoto {
            chat,
            file_name: file_name.to_string(),
            bytes: bytes.len(),
        })
        .map(|_| ())
    }

    async fn send_voice(&self, chat: ChatId, bytes: Vec<u8>) -> Result<(), ChatError> {
        self.record(ChatCall::SendVoice {
            chat,
            bytes: bytes.len(),
        })
        .map(|_| ())
    }

    async fn answer_callback(&self, callback_id: &str, text: &str) -> Result<(), ChatError> {
        self.record(ChatCall::AnswerCallback {
            callback_id: callback_id.to_string(),
            text: text.to_string(),
        })
        .map(|_| ())
    }

    async fn typing(&self, chat: ChatId) -> Result<(), ChatError> {
        self.record(ChatCall::Typing { chat }).map(|_| ())
    }

    async fn download_file(&self, file_id: &str) -> Result<Vec<u8>, ChatError> {
        self.inner.lock().calls.push(ChatCall::DownloadFile {
            file_id: file_id.to_string(),
        });
        self.inner
            .lock()
            .files
            .get(file_id)
            .cloned()
            .ok_or_else(|| ChatError::FileUnavailable(file_id.to_string()))
    }
}

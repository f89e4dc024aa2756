// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tether Authors

//! Outbound chat sends with the retry policy applied.

use tether_adapters::{ChatAdapter, Keyboard, MessageRef};
use tether_core::ChatId;

/// Wraps a [`ChatAdapter`] with retry-once-then-log semantics. A dropped
/// notification is an inconvenience; a crashed pipeline is not.
#[derive(Clone)]
pub struct Notifier<C: ChatAdapter> {
    chat: C,
}

impl<C: ChatAdapter> Notifier<C> {
    pub fn new(chat: C) -> Self {
        Self { chat }
    }

    pub async fn text(&self, chat_id: ChatId, text: &str) -> Option<MessageRef> {
        match self.chat.send_text(chat_id, text).await {
            Ok(message) => Some(message),
            Err(first) => match self.chat.send_text(chat_id, text).await {
                Ok(message) => Some(message),
                Err(second) => {
                    tracing::warn!(%chat_id, %first, %second, "chat send failed twice, dropping");
                    None
                }
            },
        }
    }

    pub async fn keyboard(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: &Keyboard,
    ) -> Option<MessageRef> {
        match self.chat.send_keyboard(chat_id, text, keyboard).await {
            Ok(message) => Some(message),
            Err(first) => match self.chat.send_keyboard(chat_id, text, keyboard).await {
                Ok(message) => Some(message),
                Err(second) => {
                    tracing::warn!(%chat_id, %first, %second, "chat keyboard send failed twice, dropping");
                    None
                }
            },
        }
    }
}

#[cfg(test)]
#[path = "notify_tests.rs"]
mod tests;

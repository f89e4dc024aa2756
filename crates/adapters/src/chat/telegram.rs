// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tether Authors

//! Telegram Bot API adapter.
//!
//! A deliberately thin client: JSON methods over HTTPS, multipart for
//! uploads, long-poll `getUpdates` translated into [`ChatUpdate`]s. Only the
//! slice of the Bot API the bridge uses is modelled.

use super::{Button, ChatAdapter, ChatError, ChatUpdate, Keyboard, MessageRef};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tether_core::ChatId;
use tokio::sync::mpsc;

const POLL_TIMEOUT_SECS: u64 = 25;
const ERROR_BACKOFF: Duration = Duration::from_secs(2);

#[derive(Clone)]
pub struct TelegramChat {
    client: reqwest::Client,
    api_base: String,
    file_base: String,
}

impl TelegramChat {
    pub fn new(token: &str) -> Self {
        Self::with_base("https://api.telegram.org", token)
    }

    /// Point the client at a different server (tests, local bot-api).
    pub fn with_base(base: &str, token: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: format!("{base}/bot{token}"),
            file_base: format!("{base}/file/bot{token}"),
        }
    }

    async fn call<T: DeserializeOwned + Default>(
        &self,
        method: &str,
        body: serde_json::Value,
    ) -> Result<T, ChatError> {
        let response = self
            .client
            .post(format!("{}/{method}", self.api_base))
            .json(&body)
            .send()
            .await
            .map_err(|e| ChatError::RequestFailed(e.to_string()))?;

        let envelope: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| ChatError::RequestFailed(e.to_string()))?;

        match envelope {
            ApiResponse {
                ok: true,
                result: Some(result),
                ..
            } => Ok(result),
            ApiResponse { description, .. } => Err(ChatError::Rejected(
                description.unwrap_or_else(|| "unknown error".to_string()),
            )),
        }
    }

    async fn upload(
        &self,
        method: &str,
        chat: ChatId,
        field: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<(), ChatError> {
        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new()
            .text("chat_id", chat.to_string())
            .part(field.to_string(), part);

        let response = self
            .client
            .post(format!("{}/{method}", self.api_base))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ChatError::RequestFailed(e.to_string()))?;

        let envelope: ApiResponse<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| ChatError::RequestFailed(e.to_string()))?;
        if envelope.ok {
            Ok(())
        } else {
            Err(ChatError::Rejected(
                envelope
                    .description
                    .unwrap_or_else(|| "unknown error".to_string()),
            ))
        }
    }

    /// Long-poll `getUpdates` forever, translating each update onto `tx`.
    /// Ends when the receiving side goes away.
    pub async fn run_updates(self, tx: mpsc::Sender<ChatUpdate>) {
        let mut offset: Option<i64> = None;
        loop {
            let mut body = json!({ "timeout": POLL_TIMEOUT_SECS });
            if let Some(offset) = offset {
                body["offset"] = json!(offset);
            }

            let updates: Vec<Update> = match self.call("getUpdates", body).await {
                Ok(updates) => updates,
                Err(e) => {
                    tracing::warn!(error = %e, "getUpdates failed, backing off");
                    tokio::time::sleep(ERROR_BACKOFF).await;
                    continue;
                }
            };

            for update in updates {
                offset = Some(update.update_id + 1);
                let Some(translated) = translate_update(update) else {
                    continue;
                };
                if tx.send(translated).await.is_err() {
                    return;
                }
            }
        }
    }
}

#[async_trait]
impl ChatAdapter for TelegramChat {
    async fn send_text(&self, chat: ChatId, text: &str) -> Result<MessageRef, ChatError> {
        let message: Message = self
            .call("sendMessage", json!({ "chat_id": chat.0, "text": text }))
            .await?;
        Ok(MessageRef(message.message_id))
    }

    async fn send_keyboard(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: &Keyboard,
    ) -> Result<MessageRef, ChatError> {
        let message: Message = self
            .call(
                "sendMessage",
                json!({
                    "chat_id": chat.0,
                    "text": text,
                    "reply_markup": { "inline_keyboard": keyboard_json(keyboard) },
                }),
            )
            .await?;
        Ok(MessageRef(message.message_id))
    }

    async fn edit_text(
        &self,
        chat: ChatId,
        message: MessageRef,
        text: &str,
    ) -> Result<(), ChatError> {
        self.call::<serde_json::Value>(
            "editMessageText",
            json!({ "chat_id": chat.0, "message_id": message.0, "text": text }),
        )
        .await
        .map(|_| ())
    }

    async fn send_photo(
        &self,
        chat: ChatId,
        bytes: Vec<u8>,
        file_name: &str,
    ) -> Result<(), ChatError> {
        self.upload("sendPhoto", chat, "photo", file_name, bytes).await
    }

    async fn send_voice(&self, chat: ChatId, bytes: Vec<u8>) -> Result<(), ChatError> {
        self.upload("sendVoice", chat, "voice", "voice.ogg", bytes).await
    }

    async fn answer_callback(&self, callback_id: &str, text: &str) -> Result<(), ChatError> {
        self.call::<serde_json::Value>(
            "answerCallbackQuery",
            json!({ "callback_query_id": callback_id, "text": text }),
        )
        .await
        .map(|_| ())
    }

    async fn typing(&self, chat: ChatId) -> Result<(), ChatError> {
        self.call::<serde_json::Value>(
            "sendChatAction",
            json!({ "chat_id": chat.0, "action": "typing" }),
        )
        .await
        .map(|_| ())
    }

    async fn download_file(&self, file_id: &str) -> Result<Vec<u8>, ChatError> {
        let file: ApiFile = self
            .call("getFile", json!({ "file_id": file_id }))
            .await?;
        let path = file
            .file_path
            .ok_or_else(|| ChatError::FileUnavailable(file_id.to_string()))?;

        let response = self
            .client
            .get(format!("{}/{path}", self.file_base))
            .send()
            .await
            .map_err(|e| ChatError::RequestFailed(e.to_string()))?;
        if !response.status().is_success() {
            return Err(ChatError::FileUnavailable(path));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ChatError::RequestFailed(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

fn keyboard_json(keyboard: &Keyboard) -> serde_json::Value {
    json!(keyboard
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|Button { label, data }| json!({ "text": label, "callback_data": data }))
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>())
}

// ── Wire types (inbound subset) ─────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Message {
    message_id: i64,
}

#[derive(Debug, Default, Deserialize)]
struct ApiFile {
    #[serde(default)]
    file_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    #[serde(default)]
    message: Option<IncomingMessage>,
    #[serde(default)]
    callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Deserialize)]
struct IncomingMessage {
    chat: Chat,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    caption: Option<String>,
    #[serde(default)]
    voice: Option<FileRef>,
    #[serde(default)]
    photo: Vec<PhotoSize>,
    #[serde(default)]
    document: Option<Document>,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct FileRef {
    file_id: String,
}

#[derive(Debug, Deserialize)]
struct PhotoSize {
    file_id: String,
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
}

#[derive(Debug, Deserialize)]
struct Document {
    file_id: String,
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    file_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CallbackQuery {
    id: String,
    #[serde(default)]
    data: Option<String>,
    #[serde(default)]
    message: Option<CallbackMessage>,
}

#[derive(Debug, Deserialize)]
struct CallbackMessage {
    message_id: i64,
    chat: Chat,
}

/// Translate one raw update into a [`ChatUpdate`]. Updates the bridge has
/// no use for (stickers, non-image documents, joins) collapse to `None`.
fn translate_update(update: Update) -> Option<ChatUpdate> {
    if let Some(callback) = update.callback_query {
        let message = callback.message?;
        return Some(ChatUpdate::Callback {
            chat_id: ChatId(message.chat.id),
            callback_id: callback.id,
            message: Some(MessageRef(message.message_id)),
            data: callback.data.unwrap_or_default(),
        });
    }

    let message = update.message?;
    let chat_id = ChatId(message.chat.id);

    if let Some(voice) = message.voice {
        return Some(ChatUpdate::Voice {
            chat_id,
            file_id: voice.file_id,
            file_name: None,
        });
    }

    if let Some(largest) = message
        .photo
        .into_iter()
        .max_by_key(|p| u64::from(p.width) * u64::from(p.height))
    {
        return Some(ChatUpdate::Photo {
            chat_id,
            file_id: largest.file_id,
            caption: message.caption,
        });
    }

    if let Some(document) = message.document {
        let mime = document.mime_type.unwrap_or_default();
        if !mime.starts_with("image/") {
            return None;
        }
        return Some(ChatUpdate::Document {
            chat_id,
            file_id: document.file_id,
            mime,
            file_name: document.file_name,
            caption: message.caption,
        });
    }

    let text = message.text?;
    if let Some(command) = text.strip_prefix('/') {
        let (name, args) = command.split_once(char::is_whitespace).unwrap_or((command, ""));
        // Group chats address commands as /name@botname.
        let name = name.split('@').next().unwrap_or(name);
        if !name.is_empty() {
            return Some(ChatUpdate::Command {
                chat_id,
                name: name.to_string(),
                args: args.trim().to_string(),
            });
        }
    }
    Some(ChatUpdate::Text { chat_id, text })
}

#[cfg(test)]
#[path = "telegram_tests.rs"]
mod tests;

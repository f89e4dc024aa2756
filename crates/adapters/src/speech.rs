// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tether Authors

//! Speech collaborator: STT for inbound voice notes, TTS for spoken replies.
//!
//! The HTTP providers live outside this repo; the bridge only needs the
//! contract plus a no-op for running without them.

use async_trait::async_trait;
use thiserror::Error;

/// Errors from speech operations
#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("no speech provider configured")]
    Unavailable,
    #[error("provider failed: {0}")]
    ProviderFailed(String),
}

/// Adapter for speech-to-text and text-to-speech
#[async_trait]
pub trait SpeechAdapter: Clone + Send + Sync + 'static {
    /// Transcribe an audio payload. `file_name` hints at the container
    /// format when the platform provides one.
    async fn transcribe(
        &self,
        audio: Vec<u8>,
        file_name: Option<&str>,
    ) -> Result<String, SpeechError>;

    /// Synthesize speech (OGG/Opus bytes) for a reply.
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SpeechError>;
}

/// Speech adapter that reports itself unavailable; callers fall back to
/// plain text.
#[derive(Clone, Default)]
pub struct NoOpSpeechAdapter;

impl NoOpSpeechAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SpeechAdapter for NoOpSpeechAdapter {
    async fn transcribe(&self, _: Vec<u8>, _: Option<&str>) -> Result<String, SpeechError> {
        Err(SpeechError::Unavailable)
    }

    async fn synthesize(&self, _: &str) -> Result<Vec<u8>, SpeechError> {
        Err(SpeechError::Unavailable)
    }
}

/// Fake speech adapter for testing
#[cfg(any(test, feature = "test-support"))]
#[derive(Clone, Default)]
pub struct FakeSpeechAdapter {
    transcript: std::sync::Arc<parking_lot::Mutex<Option<String>>>,
}

#[cfg(any(test, feature = "test-support"))]
impl FakeSpeechAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `transcribe` return this text.
    pub fn set_transcript(&self, text: &str) {
        *self.transcript.lock() = Some(text.to_string());
    }
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl SpeechAdapter for FakeSpeechAdapter {
    async fn transcribe(&self, _: Vec<u8>, _: Option<&str>) -> Result<String, SpeechError> {
        self.transcript.lock().clone().ok_or(SpeechError::Unavailable)
    }

    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SpeechError> {
        Ok(format!("voice:{text}").into_bytes())
    }
}

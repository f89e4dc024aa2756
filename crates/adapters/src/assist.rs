// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tether Authors

//! Assist collaborator: the single-shot LLM calls around the core pipeline.
//!
//! Polish cleans up a raw voice transcript before injection, summarize
//! condenses a long assistant reply, narrate rewrites a reply for speech.
//! All three have defined fallbacks in the engine, so a missing provider
//! only degrades quality, never function.

use async_trait::async_trait;
use thiserror::Error;

/// Errors from assist operations
#[derive(Debug, Error)]
pub enum AssistError {
    #[error("no assist provider configured")]
    Unavailable,
    #[error("provider failed: {0}")]
    ProviderFailed(String),
}

/// Adapter for one-shot text transformations
#[async_trait]
pub trait AssistAdapter: Clone + Send + Sync + 'static {
    /// Clean up a raw voice transcript (fallback: the raw transcript).
    async fn polish(&self, raw: &str) -> Result<String, AssistError>;

    /// Summarize a reply (fallback: the first text block).
    async fn summarize(&self, text: &str) -> Result<String, AssistError>;

    /// Rewrite a reply for speaking aloud (fallback: plain text message).
    async fn narrate(&self, text: &str) -> Result<String, AssistError>;
}

/// Assist adapter for running without a provider: polish passes text
/// through untouched, the rest report unavailable.
#[derive(Clone, Default)]
pub struct NoOpAssistAdapter;

impl NoOpAssistAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AssistAdapter for NoOpAssistAdapter {
    async fn polish(&self, raw: &str) -> Result<String, AssistError> {
        Ok(raw.to_string())
    }

    async fn summarize(&self, _: &str) -> Result<String, AssistError> {
        Err(AssistError::Unavailable)
    }

    async fn narrate(&self, _: &str) -> Result<String, AssistError> {
        Err(AssistError::Unavailable)
    }
}

/// Fake assist adapter for testing
#[cfg(any(test, feature = "test-support"))]
#[derive(Clone, Default)]
pub struct FakeAssistAdapter;

#[cfg(any(test, feature = "test-support"))]
impl FakeAssistAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl AssistAdapter for FakeAssistAdapter {
    async fn polish(&self, raw: &str) -> Result<String, AssistError> {
        Ok(format!("polished:{raw}"))
    }

    async fn summarize(&self, text: &str) -> Result<String, AssistError> {
        Ok(format!("summary:{text}"))
    }

    async fn narrate(&self, text: &str) -> Result<String, AssistError> {
        Ok(format!("narrated:{text}"))
    }
}

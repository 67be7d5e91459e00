//! Provider abstraction layer for upstream LLM APIs
//!
//! This module defines a common trait for the upstream providers (Anthropic,
//! OpenRouter). Providers parse their own SSE wire format and yield plain
//! text deltas, so the extraction core only ever sees an opaque ordered
//! sequence of text fragments.

use crate::models::chat::ChatMessage;
use async_trait::async_trait;
use futures::stream::Stream;
use std::pin::Pin;
use thiserror::Error;

/// Ordered stream of plain text deltas from the upstream model
pub type TextDeltaStream = Pin<Box<dyn Stream<Item = Result<String, ProviderError>> + Send>>;

/// Error types for provider operations
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// A rendered completion request for the upstream model
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Fully rendered system prompt
    pub system_prompt: String,

    /// Conversation history in arrival order
    pub messages: Vec<ChatMessage>,

    /// Upper bound on completion tokens
    pub max_tokens: u32,
}

/// Trait for upstream LLM providers
#[async_trait]
pub trait Provider: Send + Sync {
    /// Open a streaming completion; items are plain text deltas in arrival
    /// order. The upstream request is torn down when the stream is dropped.
    async fn stream_text(
        &self,
        request: CompletionRequest,
    ) -> Result<TextDeltaStream, ProviderError>;

    /// Get the provider name
    fn provider_name(&self) -> &str;
}

/// Supported provider types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderType {
    Anthropic,
    OpenRouter,
}

impl ProviderType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "anthropic" => Some(ProviderType::Anthropic),
            "openrouter" | "open-router" | "open_router" => Some(ProviderType::OpenRouter),
            _ => None,
        }
    }
}

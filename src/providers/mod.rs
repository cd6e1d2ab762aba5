/*!
 * Client implementations for external language services.
 *
 * This module contains the chat-completion seam used by enrichment plus the
 * concrete OpenAI-compatible client (which also carries the audio
 * transcription call for the speech fallback).
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// One chat-completion style request
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// System message guiding the model
    pub system: String,

    /// User prompt
    pub prompt: String,

    /// Sampling temperature
    pub temperature: f32,
}

impl ChatRequest {
    /// Create a new chat request
    pub fn new(system: impl Into<String>, prompt: impl Into<String>, temperature: f32) -> Self {
        Self {
            system: system.into(),
            prompt: prompt.into(),
            temperature,
        }
    }
}

/// Common trait for chat-completion providers
///
/// Object-safe so enrichment can hold any implementation behind a trait
/// object; the response is the assistant's text.
#[async_trait]
pub trait ChatProvider: Send + Sync + Debug {
    /// Complete a request using this provider
    async fn complete(&self, request: ChatRequest) -> Result<String, ProviderError>;
}

pub mod mock;
pub mod openai;

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use log::error;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{ChatProvider, ChatRequest};
use crate::errors::ProviderError;

/// OpenAI-compatible client for chat completions and audio transcription
#[derive(Debug, Clone)]
pub struct OpenAi {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API endpoint URL (optional, defaults to the public API)
    endpoint: String,
    /// Chat model name
    model: String,
}

/// Chat completion request body
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

/// Chat message object
#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// Chat completion response
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: String,
}

/// One timed segment in a verbose transcription response
#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptionSegment {
    /// Start time in seconds
    #[serde(default)]
    pub start: f64,

    /// End time in seconds
    #[serde(default)]
    pub end: f64,

    /// Transcribed text for this span
    #[serde(default)]
    pub text: String,
}

/// Speech-to-text response in `verbose_json` format.
/// `segments` may be absent; `text` is always present.
#[derive(Debug, Deserialize)]
pub struct TranscriptionResponse {
    /// Full flat transcription
    #[serde(default)]
    pub text: String,

    /// Per-segment timing, when the service provides it
    #[serde(default)]
    pub segments: Vec<TranscriptionSegment>,
}

impl OpenAi {
    /// Create a new client
    pub fn new(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        model: impl Into<String>,
        timeout_secs: u64,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            model: model.into(),
        }
    }

    /// Whether an API key is configured
    pub fn has_key(&self) -> bool {
        !self.api_key.is_empty()
    }

    fn api_url(&self, path: &str) -> String {
        let base = if self.endpoint.is_empty() {
            "https://api.openai.com/v1"
        } else {
            self.endpoint.trim_end_matches('/')
        };
        format!("{base}/{path}")
    }

    fn map_status(status: reqwest::StatusCode, body: String) -> ProviderError {
        match status.as_u16() {
            401 | 403 => ProviderError::AuthenticationError(body),
            429 => ProviderError::RateLimitExceeded(body),
            code => ProviderError::ApiError {
                status_code: code,
                message: body,
            },
        }
    }

    /// Transcribe an audio file, requesting segment-level timing.
    ///
    /// Uploads the file as multipart form data with
    /// `response_format=verbose_json`. Errors carry the upstream status so
    /// the caller can log a useful diagnostic.
    pub async fn transcribe_file(
        &self,
        path: &Path,
        model: &str,
    ) -> Result<TranscriptionResponse, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::AuthenticationError(
                "API key missing".to_string(),
            ));
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ProviderError::RequestFailed(format!("Failed to read audio file: {e}")))?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "audio.m4a".to_string());

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(bytes).file_name(file_name),
            )
            .text("model", model.to_string())
            .text("response_format", "verbose_json");

        let response = self
            .client
            .post(self.api_url("audio/transcriptions"))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(format!("Transcription request: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Transcription API error ({}): {}", status, body);
            return Err(Self::map_status(status, body));
        }

        response
            .json::<TranscriptionResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Transcription response: {e}")))
    }
}

#[async_trait]
impl ChatProvider for OpenAi {
    async fn complete(&self, request: ChatRequest) -> Result<String, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::AuthenticationError(
                "API key missing".to_string(),
            ));
        }

        let body = ChatCompletionRequest {
            model: &self.model,
            temperature: request.temperature,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
        };

        let response = self
            .client
            .post(self.api_url("chat/completions"))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(format!("Chat request: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Chat API error ({}): {}", status, body);
            return Err(Self::map_status(status, body));
        }

        let parsed = response
            .json::<ChatCompletionResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Chat response: {e}")))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .unwrap_or_default();

        Ok(text.trim().to_string())
    }
}

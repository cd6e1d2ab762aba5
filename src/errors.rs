/*!
 * Error types for the kikitori application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when talking to external AI service APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

impl ProviderError {
    /// Whether the provider could not be used at all, as opposed to
    /// answering with something unusable. An unreachable provider degrades
    /// a whole enrichment pass instead of a single batch.
    pub fn is_unreachable(&self) -> bool {
        matches!(
            self,
            Self::ConnectionError(_) | Self::AuthenticationError(_) | Self::RequestFailed(_)
        )
    }
}

/// Errors produced by one transcript acquisition source
#[derive(Error, Debug)]
pub enum SourceError {
    /// The video has no captions this source can see
    #[error("no captions available: {0}")]
    NoCaptions(String),

    /// An upstream HTTP call failed
    #[error("upstream request failed ({status}): {message}")]
    Upstream {
        /// HTTP status code from the upstream service
        status: u16,
        /// Response body or error detail
        message: String,
    },

    /// A timed-text payload could not be parsed
    #[error("failed to parse timed text: {0}")]
    Parse(String),

    /// Downloaded audio was too small to be a real track
    #[error("audio download too small ({got} bytes, minimum {min})")]
    AudioTooSmall {
        /// Bytes actually downloaded
        got: u64,
        /// Configured minimum
        min: u64,
    },

    /// An external tool (yt-dlp) failed or is missing
    #[error("external tool error: {0}")]
    Tool(String),

    /// The speech-to-text provider failed
    #[error("speech service error: {0}")]
    Provider(#[from] ProviderError),

    /// Filesystem error while staging temporary files
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Request-level errors with a fixed HTTP mapping.
///
/// Failures inside one acquisition source or one enrichment batch are
/// handled locally and never become a `TranscriptError`; only the cases
/// below surface to the caller.
#[derive(Error, Debug)]
pub enum TranscriptError {
    /// Missing or unrecognizable video reference (400)
    #[error("{0}")]
    Input(String),

    /// Missing or invalid bearer credential (401)
    #[error("{0}")]
    Auth(String),

    /// Every acquisition source failed (502)
    #[error("no acquisition source produced a transcript")]
    SourceExhausted {
        /// Diagnostic detail from the last source that was tried
        detail: String,
    },

    /// Invariant violation or unexpected failure (500)
    #[error("internal error: {0}")]
    Internal(String),
}

impl TranscriptError {
    /// HTTP status code this error maps to
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Input(_) => 400,
            Self::Auth(_) => 401,
            Self::SourceExhausted { .. } => 502,
            Self::Internal(_) => 500,
        }
    }
}

impl From<anyhow::Error> for TranscriptError {
    fn from(error: anyhow::Error) -> Self {
        Self::Internal(error.to_string())
    }
}

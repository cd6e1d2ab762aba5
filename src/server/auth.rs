/*!
 * Bearer-credential verification against an external identity provider.
 */

use async_trait::async_trait;
use axum::http::HeaderMap;
use log::debug;
use reqwest::Client;

use crate::errors::TranscriptError;

/// Identity attached to a verified request
#[derive(Debug, Clone)]
pub struct Principal {
    /// Stable subject identifier from the identity provider
    pub subject: String,
}

/// Verifies a bearer credential and resolves it to a principal
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Verify `token`, answering the principal it belongs to
    async fn verify(&self, token: &str) -> Result<Principal, TranscriptError>;
}

/// Verifier delegating to a token-info endpoint.
///
/// The endpoint is expected to answer 200 with a JSON body carrying a `sub`
/// field for a live token and a non-200 status otherwise. Any non-200 answer
/// maps to an authentication failure, not an internal error.
#[derive(Debug)]
pub struct TokenInfoVerifier {
    client: Client,
    endpoint: String,
}

impl TokenInfoVerifier {
    /// Create a verifier against the given token-info endpoint
    pub fn new(endpoint: String) -> Self {
        Self {
            client: Client::new(),
            endpoint,
        }
    }
}

#[async_trait]
impl IdentityVerifier for TokenInfoVerifier {
    async fn verify(&self, token: &str) -> Result<Principal, TranscriptError> {
        let url = format!("{}?id_token={}", self.endpoint, token);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| TranscriptError::Auth(format!("token verification failed: {e}")))?;

        if !response.status().is_success() {
            debug!("Token info endpoint answered {}", response.status());
            return Err(TranscriptError::Auth("invalid token".to_string()));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| TranscriptError::Auth(format!("unreadable token info: {e}")))?;

        let subject = body
            .get("sub")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        Ok(Principal { subject })
    }
}

/// Extract the bearer token from an Authorization header
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(axum::http::header::AUTHORIZATION)?;
    let value = value.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();

    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

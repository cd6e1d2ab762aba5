/*!
 * HTTP surface of the transcript service.
 *
 * A small axum router with a permissive CORS layer: the transcript endpoint,
 * a health probe, and bearer-credential enforcement when configured. Every
 * error answers a JSON body with a stable status mapping.
 */

use std::sync::Arc;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use log::info;
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::app_controller::TranscriptPipeline;
use crate::errors::TranscriptError;

pub mod auth;
pub mod handlers;

use auth::IdentityVerifier;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    /// Acquisition and enrichment pipeline
    pub pipeline: Arc<TranscriptPipeline>,

    /// Whether /api/transcript requires a bearer credential
    pub require_auth: bool,

    /// Credential verifier; None when verification is not configured
    pub verifier: Option<Arc<dyn IdentityVerifier>>,

    /// Whether an enrichment API key is available, reported by the health
    /// probe
    pub has_key: bool,
}

impl IntoResponse for TranscriptError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let details = match &self {
            TranscriptError::SourceExhausted { detail } => detail.clone(),
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": self.to_string(),
            "details": details,
        }));

        (status, body).into_response()
    }
}

/// Build the application router over the given state
pub fn router(state: AppState) -> axum::Router {
    axum::Router::new()
        .route("/transcript", get(handlers::transcript))
        .route("/health", get(handlers::health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until the process is stopped
pub async fn serve(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Listening on http://{addr}");
    axum::serve(listener, router(state)).await?;

    Ok(())
}

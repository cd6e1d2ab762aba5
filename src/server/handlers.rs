/*!
 * Request handlers for the transcript HTTP API.
 */

use std::collections::HashMap;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use log::{info, warn};
use serde_json::json;

use super::AppState;
use super::auth::bearer_token;
use crate::errors::TranscriptError;
use crate::segment::TranscriptLine;
use crate::video_reference::VideoId;

/// GET /transcript?url=...&skipTranslate=1
///
/// Resolves the video reference, runs the acquisition and enrichment
/// pipeline and answers the full transcript line list.
pub async fn transcript(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<TranscriptLine>>, TranscriptError> {
    authorize(&state, &headers).await?;

    let url = params
        .get("url")
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| TranscriptError::Input("missing url parameter".to_string()))?;

    let video = VideoId::parse(url)?;
    let skip_translate = params.get("skipTranslate").map(String::as_str) == Some("1");

    info!(
        "Transcript request for {} (skip_translate={})",
        video, skip_translate
    );

    let lines = state.pipeline.run(&video, skip_translate).await?;
    Ok(Json(lines))
}

/// GET /health
///
/// Liveness plus whether an enrichment API key is present.
pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "ok": true,
        "hasKey": state.has_key,
    }))
}

/// Enforce the bearer-credential policy for a request
async fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), TranscriptError> {
    if !state.require_auth {
        return Ok(());
    }

    let Some(verifier) = &state.verifier else {
        warn!("Authentication required but no identity verifier is configured");
        return Err(TranscriptError::Internal(
            "authentication is required but not configured".to_string(),
        ));
    };

    let token = bearer_token(headers)
        .ok_or_else(|| TranscriptError::Auth("missing bearer credential".to_string()))?;

    let principal = verifier.verify(&token).await?;
    info!("Authorized request for subject {}", principal.subject);

    Ok(())
}

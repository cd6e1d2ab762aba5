/*!
 * HTTP API tests over the in-process router
 */

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use tower::ServiceExt;

use kikitori::errors::TranscriptError;
use kikitori::providers::mock::MockChatProvider;
use kikitori::server::auth::{IdentityVerifier, Principal};
use kikitori::server::{AppState, router};

use crate::common::mock_sources::{MockOutcome, MockSource};
use crate::common::{pipeline_with, segments};

/// Verifier accepting exactly one token
#[derive(Debug)]
struct SingleTokenVerifier {
    accepted: &'static str,
}

#[async_trait]
impl IdentityVerifier for SingleTokenVerifier {
    async fn verify(&self, token: &str) -> Result<Principal, TranscriptError> {
        if token == self.accepted {
            Ok(Principal {
                subject: "tester".to_string(),
            })
        } else {
            Err(TranscriptError::Auth("invalid token".to_string()))
        }
    }
}

fn state_with_source(outcome: MockOutcome) -> AppState {
    AppState {
        pipeline: Arc::new(pipeline_with(
            vec![Box::new(MockSource::new("mock", outcome))],
            Arc::new(MockChatProvider::echo()),
        )),
        require_auth: false,
        verifier: None,
        has_key: true,
    }
}

fn happy_state() -> AppState {
    state_with_source(MockOutcome::Segments(segments(&[
        (0.0, 1.0, "first line"),
        (2.0, 3.0, "second line"),
    ])))
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Test a successful transcript request
#[tokio::test]
async fn test_transcript_withValidRequest_shouldReturnLines() {
    let app = router(happy_state());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/transcript?url=dQw4w9WgXcQ")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let lines = body.as_array().unwrap();

    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["text"], "first line");
    assert_eq!(lines[0]["romaji"], "mock:first line");
    assert_eq!(lines[0]["vn"], "mock:first line");
}

/// Test the skipTranslate query flag
#[tokio::test]
async fn test_transcript_withSkipTranslateFlag_shouldOmitTranslation() {
    let app = router(happy_state());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/transcript?url=dQw4w9WgXcQ&skipTranslate=1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;

    assert_eq!(body[0]["romaji"], "mock:first line");
    assert_eq!(body[0]["vn"], "");
}

/// Test the missing url parameter
#[tokio::test]
async fn test_transcript_withMissingUrl_shouldReturn400() {
    let app = router(happy_state());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/transcript")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("url"));
}

/// Test an unrecognizable video reference
#[tokio::test]
async fn test_transcript_withUnparseableUrl_shouldReturn400() {
    let app = router(happy_state());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/transcript?url=nonsense")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

/// Test exhausted sources mapping to 502
#[tokio::test]
async fn test_transcript_withExhaustedSources_shouldReturn502() {
    let app = router(state_with_source(MockOutcome::Fail(
        "nothing anywhere".to_string(),
    )));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/transcript?url=dQw4w9WgXcQ")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = body_json(response).await;
    assert!(body["details"].as_str().unwrap().contains("nothing anywhere"));
}

/// Test auth required but no verifier configured
#[tokio::test]
async fn test_transcript_withAuthRequiredButUnconfigured_shouldReturn500() {
    let mut state = happy_state();
    state.require_auth = true;
    let app = router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/transcript?url=dQw4w9WgXcQ")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

/// Test a missing bearer credential
#[tokio::test]
async fn test_transcript_withMissingBearer_shouldReturn401() {
    let mut state = happy_state();
    state.require_auth = true;
    state.verifier = Some(Arc::new(SingleTokenVerifier { accepted: "good" }));
    let app = router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/transcript?url=dQw4w9WgXcQ")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// Test a rejected bearer credential
#[tokio::test]
async fn test_transcript_withBadBearer_shouldReturn401() {
    let mut state = happy_state();
    state.require_auth = true;
    state.verifier = Some(Arc::new(SingleTokenVerifier { accepted: "good" }));
    let app = router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/transcript?url=dQw4w9WgXcQ")
                .header(header::AUTHORIZATION, "Bearer bad")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// Test an accepted bearer credential
#[tokio::test]
async fn test_transcript_withValidBearer_shouldReturnLines() {
    let mut state = happy_state();
    state.require_auth = true;
    state.verifier = Some(Arc::new(SingleTokenVerifier { accepted: "good" }));
    let app = router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/transcript?url=dQw4w9WgXcQ")
                .header(header::AUTHORIZATION, "Bearer good")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

/// Test the health probe
#[tokio::test]
async fn test_health_withRunningService_shouldReportKeyPresence() {
    let app = router(happy_state());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["ok"], true);
    assert_eq!(body["hasKey"], true);
}

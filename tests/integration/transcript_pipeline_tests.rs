/*!
 * End-to-end pipeline tests over mocked sources and providers
 */

use std::sync::Arc;
use std::sync::atomic::Ordering;

use kikitori::errors::TranscriptError;
use kikitori::providers::mock::MockChatProvider;
use kikitori::sources::TranscriptSource;
use kikitori::video_reference::VideoId;

use crate::common::mock_sources::{MockOutcome, MockSource};
use crate::common::{pipeline_with, segments};

fn video() -> VideoId {
    VideoId::parse("dQw4w9WgXcQ").unwrap()
}

/// Test that the first successful source wins and later tiers stay cold
#[tokio::test]
async fn test_run_withFirstSourceSucceeding_shouldNotInvokeLaterSources() {
    let first = MockSource::new(
        "first",
        MockOutcome::Segments(segments(&[(0.0, 1.0, "from the first tier")])),
    );
    let second = MockSource::new("second", MockOutcome::Fail("should not run".to_string()));
    let second_calls = second.counter();

    let pipeline = pipeline_with(
        vec![Box::new(first), Box::new(second)],
        Arc::new(MockChatProvider::echo()),
    );

    let lines = pipeline.run(&video(), true).await.unwrap();

    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].text, "from the first tier");
    assert_eq!(second_calls.load(Ordering::SeqCst), 0);
}

/// Test that an empty result falls through to the next tier
#[tokio::test]
async fn test_run_withEmptyFirstSource_shouldFallThrough() {
    let first = MockSource::new("first", MockOutcome::Empty);
    let second = MockSource::new(
        "second",
        MockOutcome::Segments(segments(&[(0.0, 1.0, "from the second tier")])),
    );
    let first_calls = first.counter();

    let pipeline = pipeline_with(
        vec![Box::new(first), Box::new(second)],
        Arc::new(MockChatProvider::echo()),
    );

    let lines = pipeline.run(&video(), true).await.unwrap();

    assert_eq!(first_calls.load(Ordering::SeqCst), 1);
    assert_eq!(lines[0].text, "from the second tier");
}

/// Test exhaustion of every tier
#[tokio::test]
async fn test_run_withAllSourcesFailing_shouldReturnSourceExhausted() {
    let first = MockSource::new("first", MockOutcome::Fail("no luck".to_string()));
    let last = MockSource::new("last", MockOutcome::Fail("also no luck".to_string()));

    let pipeline = pipeline_with(
        vec![Box::new(first), Box::new(last)],
        Arc::new(MockChatProvider::echo()),
    );

    let error = pipeline.run(&video(), false).await.unwrap_err();

    assert_eq!(error.status_code(), 502);
    match error {
        TranscriptError::SourceExhausted { detail } => {
            assert!(detail.contains("last"), "detail was: {detail}");
            assert!(detail.contains("also no luck"), "detail was: {detail}");
        }
        other => panic!("expected SourceExhausted, got {other:?}"),
    }
}

/// Test an empty chain
#[tokio::test]
async fn test_run_withNoSources_shouldReturnSourceExhausted() {
    let sources: Vec<Box<dyn TranscriptSource>> = Vec::new();
    let pipeline = pipeline_with(sources, Arc::new(MockChatProvider::echo()));

    let error = pipeline.run(&video(), false).await.unwrap_err();
    match error {
        TranscriptError::SourceExhausted { detail } => {
            assert!(detail.contains("no acquisition sources"));
        }
        other => panic!("expected SourceExhausted, got {other:?}"),
    }
}

/// Test the skip flag: romaji still populated, translations empty
#[tokio::test]
async fn test_run_withSkipTranslate_shouldFillRomajiOnly() {
    let source = MockSource::new(
        "only",
        MockOutcome::Segments(segments(&[(0.0, 1.0, "こんにちは"), (2.0, 3.0, "さようなら")])),
    );

    let pipeline = pipeline_with(vec![Box::new(source)], Arc::new(MockChatProvider::echo()));
    let lines = pipeline.run(&video(), true).await.unwrap();

    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].romaji, "mock:こんにちは");
    assert_eq!(lines[0].vn, "");
    assert_eq!(lines[1].romaji, "mock:さようなら");
    assert_eq!(lines[1].vn, "");
}

/// Test full enrichment with a well-behaved provider
#[tokio::test]
async fn test_run_withEchoProvider_shouldFillBothEnrichments() {
    let source = MockSource::new(
        "only",
        MockOutcome::Segments(segments(&[(0.0, 1.0, "first line"), (2.0, 3.0, "second line")])),
    );

    let pipeline = pipeline_with(vec![Box::new(source)], Arc::new(MockChatProvider::echo()));
    let lines = pipeline.run(&video(), false).await.unwrap();

    assert_eq!(lines[0].romaji, "mock:first line");
    assert_eq!(lines[0].vn, "mock:first line");
    assert_eq!(lines[1].vn, "mock:second line");
}

/// Test the degraded request shape when the provider is unreachable:
/// the transcript still answers, romaji empty, translation echoing text
#[tokio::test]
async fn test_run_withUnreachableProvider_shouldStillAnswerDegraded() {
    let source = MockSource::new(
        "only",
        MockOutcome::Segments(segments(&[(0.0, 1.0, "keep this text")])),
    );

    let pipeline = pipeline_with(
        vec![Box::new(source)],
        Arc::new(MockChatProvider::unreachable()),
    );
    let lines = pipeline.run(&video(), false).await.unwrap();

    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].romaji, "");
    assert_eq!(lines[0].vn, "keep this text");
}

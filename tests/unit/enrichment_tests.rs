/*!
 * Tests for enrichment batching and degradation behavior
 */

use std::sync::Arc;

use kikitori::app_config::EnrichmentConfig;
use kikitori::enrichment::{Enricher, chunk_texts, parse_string_array};
use kikitori::errors::ProviderError;
use kikitori::providers::mock::MockChatProvider;

use crate::common::segments;

fn texts(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("line {i}")).collect()
}

/// Test batch partitioning at the documented sizes
#[test]
fn test_chunk_texts_with85ItemsBound40_shouldProduceThreeBatches() {
    let input = texts(85);
    let batches = chunk_texts(&input, 40);

    assert_eq!(batches.len(), 3);
    assert_eq!(batches[0].len(), 40);
    assert_eq!(batches[1].len(), 40);
    assert_eq!(batches[2].len(), 5);
    assert_eq!(batches[0][0], "line 0");
    assert_eq!(batches[2][4], "line 84");
}

/// Test that an exact multiple produces no trailing batch
#[test]
fn test_chunk_texts_withExactMultiple_shouldHaveNoRemainder() {
    let input = texts(80);
    let batches = chunk_texts(&input, 40);
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[1].len(), 40);
}

/// Test the zero-bound guard
#[test]
fn test_chunk_texts_withZeroBound_shouldReturnSingleBatch() {
    let input = texts(7);
    let batches = chunk_texts(&input, 0);
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].len(), 7);
}

/// Test lenient array extraction from a fenced response
#[test]
fn test_parse_string_array_withFencedResponse_shouldExtract() {
    let response = "Here you go:\n```json\n[\"a\", \"b\"]\n```";
    let parsed = parse_string_array(response, 2).unwrap();
    assert_eq!(parsed, vec!["a", "b"]);
}

/// Test null elements mapping to empty strings
#[test]
fn test_parse_string_array_withNullElement_shouldMapToEmpty() {
    let parsed = parse_string_array(r#"["a", null]"#, 2).unwrap();
    assert_eq!(parsed, vec!["a", ""]);
}

/// Test rejection of malformed or mismatched responses
#[test]
fn test_parse_string_array_withBadResponses_shouldReturnNone() {
    assert!(parse_string_array("no array here", 2).is_none());
    assert!(parse_string_array(r#"["only one"]"#, 2).is_none());
    assert!(parse_string_array(r#"[not json]"#, 1).is_none());
}

/// Test the romaji pass against a well-behaved provider
#[tokio::test]
async fn test_romaji_pass_withEchoProvider_shouldPreserveOrderAndCount() {
    let provider = Arc::new(MockChatProvider::echo());
    let enricher = Enricher::new(provider, &EnrichmentConfig::default());

    let input = segments(&[(0.0, 1.0, "一つ目"), (2.0, 3.0, "二つ目"), (4.0, 5.0, "三つ目")]);
    let romaji = enricher.romaji_pass(&input).await;

    assert_eq!(romaji.len(), 3);
    assert_eq!(romaji[0], "mock:一つ目");
    assert_eq!(romaji[1], "mock:二つ目");
    assert_eq!(romaji[2], "mock:三つ目");
}

/// Test that batching splits calls at the configured bound
#[tokio::test]
async fn test_romaji_pass_withSmallBatchSize_shouldCallPerBatch() {
    let provider = MockChatProvider::echo();
    let counter = provider.counter();
    let config = EnrichmentConfig {
        romaji_batch_size: 2,
        ..EnrichmentConfig::default()
    };
    let enricher = Enricher::new(Arc::new(provider), &config);

    let input = segments(&[
        (0.0, 1.0, "first line"),
        (2.0, 3.0, "second line"),
        (4.0, 5.0, "third line"),
    ]);
    let romaji = enricher.romaji_pass(&input).await;

    assert_eq!(romaji.len(), 3);
    assert_eq!(counter.load(std::sync::atomic::Ordering::SeqCst), 2);
}

/// Test whole-pass degradation when the service is unreachable
#[tokio::test]
async fn test_romaji_pass_withUnreachableProvider_shouldReturnEmptyStrings() {
    let provider = Arc::new(MockChatProvider::unreachable());
    let enricher = Enricher::new(provider, &EnrichmentConfig::default());

    let input = segments(&[(0.0, 1.0, "one"), (2.0, 3.0, "two")]);
    let romaji = enricher.romaji_pass(&input).await;

    assert_eq!(romaji, vec!["".to_string(), "".to_string()]);
}

/// Test translation degradation to the source text when unreachable
#[tokio::test]
async fn test_translate_pass_withUnreachableProvider_shouldEchoSourceText() {
    let provider = Arc::new(MockChatProvider::unreachable());
    let enricher = Enricher::new(provider, &EnrichmentConfig::default());

    let input = segments(&[(0.0, 1.0, "keep me"), (2.0, 3.0, "me too")]);
    let translations = enricher.translate_pass(&input, false).await;

    assert_eq!(translations, vec!["keep me".to_string(), "me too".to_string()]);
}

/// Test the skip flag short-circuiting the translation pass
#[tokio::test]
async fn test_translate_pass_withSkipFlag_shouldReturnEmptyWithoutCalls() {
    let provider = MockChatProvider::echo();
    let counter = provider.counter();
    let enricher = Enricher::new(Arc::new(provider), &EnrichmentConfig::default());

    let input = segments(&[(0.0, 1.0, "one"), (2.0, 3.0, "two")]);
    let translations = enricher.translate_pass(&input, true).await;

    assert_eq!(translations, vec!["".to_string(), "".to_string()]);
    assert_eq!(counter.load(std::sync::atomic::Ordering::SeqCst), 0);
}

/// Test per-batch degradation on an unusable payload
#[tokio::test]
async fn test_translate_pass_withOneBadBatch_shouldDegradeOnlyThatBatch() {
    let provider = MockChatProvider::scripted(vec![
        Ok("this is not a json array".to_string()),
        Ok(r#"["third translated"]"#.to_string()),
    ]);
    let config = EnrichmentConfig {
        translate_batch_size: 2,
        ..EnrichmentConfig::default()
    };
    let enricher = Enricher::new(Arc::new(provider), &config);

    let input = segments(&[
        (0.0, 1.0, "first line"),
        (2.0, 3.0, "second line"),
        (4.0, 5.0, "third line"),
    ]);
    let translations = enricher.translate_pass(&input, false).await;

    assert_eq!(translations, vec!["", "", "third translated"]);
}

/// Test that a recoverable API error degrades one batch, not the pass
#[tokio::test]
async fn test_translate_pass_withRecoverableApiError_shouldContinueNextBatch() {
    let provider = MockChatProvider::scripted(vec![
        Err(ProviderError::ApiError {
            status_code: 500,
            message: "upstream hiccup".to_string(),
        }),
        Ok(r#"["third translated"]"#.to_string()),
    ]);
    let config = EnrichmentConfig {
        translate_batch_size: 2,
        ..EnrichmentConfig::default()
    };
    let enricher = Enricher::new(Arc::new(provider), &config);

    let input = segments(&[
        (0.0, 1.0, "first line"),
        (2.0, 3.0, "second line"),
        (4.0, 5.0, "third line"),
    ]);
    let translations = enricher.translate_pass(&input, false).await;

    assert_eq!(translations, vec!["", "", "third translated"]);
}

/// Test enrichment of an empty segment list
#[tokio::test]
async fn test_passes_withNoSegments_shouldReturnEmptyWithoutCalls() {
    let provider = MockChatProvider::echo();
    let counter = provider.counter();
    let enricher = Enricher::new(Arc::new(provider), &EnrichmentConfig::default());

    assert!(enricher.romaji_pass(&[]).await.is_empty());
    assert!(enricher.translate_pass(&[], false).await.is_empty());
    assert_eq!(counter.load(std::sync::atomic::Ordering::SeqCst), 0);
}

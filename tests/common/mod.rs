/*!
 * Common test utilities for the kikitori test suite
 */

use std::sync::Arc;

use kikitori::app_config::EnrichmentConfig;
use kikitori::app_controller::TranscriptPipeline;
use kikitori::enrichment::Enricher;
use kikitori::providers::ChatProvider;
use kikitori::segment::Segment;
use kikitori::sources::{SourceChain, TranscriptSource};

// Re-export the mock sources module
pub mod mock_sources;

/// Build a segment list from (start, end, text) tuples
pub fn segments(spans: &[(f64, f64, &str)]) -> Vec<Segment> {
    spans
        .iter()
        .map(|(start, end, text)| Segment::new(*start, *end, *text))
        .collect()
}

/// Assemble a pipeline over mocked sources and a mocked provider,
/// with default enrichment settings
pub fn pipeline_with(
    sources: Vec<Box<dyn TranscriptSource>>,
    provider: Arc<dyn ChatProvider>,
) -> TranscriptPipeline {
    TranscriptPipeline::new(
        SourceChain::new(sources),
        Enricher::new(provider, &EnrichmentConfig::default()),
    )
}

/// A small cue-based caption document with three well-spaced cues
pub const SAMPLE_VTT: &str = "WEBVTT

00:00:01.000 --> 00:00:02.000
First line here

00:00:03.000 --> 00:00:04.500
Second line here

00:00:05.000 --> 00:00:06.000
Third line here
";

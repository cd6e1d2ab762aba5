/*!
 * Transcript acquisition sources and the fallback chain.
 *
 * Each source is one strategy for obtaining time-aligned segments for a
 * video, from the cheap hosted caption lookup down to speech recognition on
 * downloaded audio. Sources return tagged results; the chain tries them in
 * registration order and stops at the first non-empty segment list.
 */

use async_trait::async_trait;
use log::{info, warn};

use crate::errors::{SourceError, TranscriptError};
use crate::segment::Segment;
use crate::video_reference::VideoId;

pub mod caption_api;
pub mod downloader;
pub mod player_tracks;
pub mod speech;

/// One acquisition strategy in the fallback chain
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Short name used in diagnostics
    fn name(&self) -> &'static str;

    /// Try to produce segments for the video. An internal sub-format
    /// fallback (e.g. one caption format then another) belongs to the
    /// source's own contract, not the chain's.
    async fn fetch(&self, video: &VideoId) -> Result<Vec<Segment>, SourceError>;
}

/// Outcome of one strategy attempt, kept for diagnostic logging only
#[derive(Debug)]
pub struct SourceAttempt {
    /// Strategy name
    pub source: &'static str,

    /// Segment count on success, failure message otherwise
    pub outcome: Result<usize, String>,
}

/// Ordered registry of acquisition sources.
///
/// Populated once at startup from configuration; an optional capability that
/// is disabled simply never gets registered. Individual sources are not
/// retried.
pub struct SourceChain {
    sources: Vec<Box<dyn TranscriptSource>>,
}

impl SourceChain {
    /// Create a chain over the given sources, tried in order
    pub fn new(sources: Vec<Box<dyn TranscriptSource>>) -> Self {
        Self { sources }
    }

    /// Number of registered sources
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Whether the chain has no sources at all
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Run the chain: first source returning a non-empty segment list wins
    /// and later sources are never invoked. If every source fails, the
    /// request fails with the last attempt's diagnostic detail.
    pub async fn acquire(&self, video: &VideoId) -> Result<Vec<Segment>, TranscriptError> {
        let mut attempts: Vec<SourceAttempt> = Vec::with_capacity(self.sources.len());

        for source in &self.sources {
            match source.fetch(video).await {
                Ok(segments) if !segments.is_empty() => {
                    info!(
                        "Acquired {} segments for {} via {}",
                        segments.len(),
                        video,
                        source.name()
                    );
                    return Ok(segments);
                }
                Ok(_) => {
                    warn!("Source {} returned no segments for {}", source.name(), video);
                    attempts.push(SourceAttempt {
                        source: source.name(),
                        outcome: Err("returned no segments".to_string()),
                    });
                }
                Err(e) => {
                    warn!("Source {} failed for {}: {}", source.name(), video, e);
                    attempts.push(SourceAttempt {
                        source: source.name(),
                        outcome: Err(e.to_string()),
                    });
                }
            }
        }

        let detail = attempts
            .last()
            .map(|attempt| {
                let message = attempt
                    .outcome
                    .as_ref()
                    .err()
                    .cloned()
                    .unwrap_or_default();
                format!("{}: {}", attempt.source, message)
            })
            .unwrap_or_else(|| "no acquisition sources are registered".to_string());

        Err(TranscriptError::SourceExhausted { detail })
    }
}

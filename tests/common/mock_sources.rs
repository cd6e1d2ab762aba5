/*!
 * Mock acquisition sources for pipeline and server tests
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use kikitori::errors::SourceError;
use kikitori::segment::Segment;
use kikitori::sources::TranscriptSource;
use kikitori::video_reference::VideoId;

/// What a mock source does on every fetch
pub enum MockOutcome {
    /// Return these segments
    Segments(Vec<Segment>),
    /// Return an empty list
    Empty,
    /// Fail with this message
    Fail(String),
}

/// Scripted acquisition source that counts its invocations
pub struct MockSource {
    name: &'static str,
    outcome: MockOutcome,
    calls: Arc<AtomicUsize>,
}

impl MockSource {
    pub fn new(name: &'static str, outcome: MockOutcome) -> Self {
        Self {
            name,
            outcome,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared handle to the invocation counter, usable after the source
    /// has been boxed into a chain
    pub fn counter(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

#[async_trait]
impl TranscriptSource for MockSource {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch(&self, _video: &VideoId) -> Result<Vec<Segment>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.outcome {
            MockOutcome::Segments(segments) => Ok(segments.clone()),
            MockOutcome::Empty => Ok(Vec::new()),
            MockOutcome::Fail(message) => Err(SourceError::NoCaptions(message.clone())),
        }
    }
}

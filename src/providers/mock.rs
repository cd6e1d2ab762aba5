/*!
 * Mock chat provider for testing.
 *
 * Supports scripted per-call responses, unconditional failure, and an
 * echo mode that returns a JSON array matching the numbered lines of the
 * prompt - the contract enrichment expects from a well-behaved model.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{ChatProvider, ChatRequest};
use crate::errors::ProviderError;

/// Behavior mode for the mock provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Pop scripted responses in order; error when the script runs out
    Scripted,
    /// Answer every request with a JSON array echoing the numbered prompt
    /// lines, each prefixed with "mock:"
    Echo,
    /// Always fail with a connection error
    Unreachable,
}

/// Mock chat provider
#[derive(Debug)]
pub struct MockChatProvider {
    behavior: MockBehavior,
    responses: Mutex<VecDeque<Result<String, ProviderError>>>,
    call_count: Arc<AtomicUsize>,
}

impl MockChatProvider {
    /// Create a provider that pops scripted responses
    pub fn scripted(responses: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            behavior: MockBehavior::Scripted,
            responses: Mutex::new(responses.into()),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a provider echoing the prompt's numbered lines as JSON
    pub fn echo() -> Self {
        Self {
            behavior: MockBehavior::Echo,
            responses: Mutex::new(VecDeque::new()),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a provider that always fails with a connection error
    pub fn unreachable() -> Self {
        Self {
            behavior: MockBehavior::Unreachable,
            responses: Mutex::new(VecDeque::new()),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of completed calls
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Shared handle to the call counter, for assertions after the provider
    /// has been moved behind a trait object
    pub fn counter(&self) -> Arc<AtomicUsize> {
        self.call_count.clone()
    }

    /// Build the echo response: one "mock:<line>" entry per numbered
    /// prompt line
    fn echo_response(prompt: &str) -> String {
        let lines: Vec<String> = prompt
            .lines()
            .filter_map(|line| {
                let (number, rest) = line.split_once(". ")?;
                number.trim().parse::<usize>().ok()?;
                Some(format!("mock:{}", rest))
            })
            .collect();
        serde_json::to_string(&lines).unwrap_or_else(|_| "[]".to_string())
    }
}

#[async_trait]
impl ChatProvider for MockChatProvider {
    async fn complete(&self, request: ChatRequest) -> Result<String, ProviderError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        match self.behavior {
            MockBehavior::Scripted => self.responses.lock().pop_front().unwrap_or_else(|| {
                Err(ProviderError::RequestFailed(
                    "mock script exhausted".to_string(),
                ))
            }),
            MockBehavior::Echo => Ok(Self::echo_response(&request.prompt)),
            MockBehavior::Unreachable => Err(ProviderError::ConnectionError(
                "mock provider is unreachable".to_string(),
            )),
        }
    }
}

//! Backend abstraction over model providers.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{LlmError, Result};
use crate::types::{GenerateRequest, GenerateResponse};

/// A language model backend capable of tool-calling turns.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Run one `generateContent` round trip.
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse>;

    /// Backend name (for logging).
    fn name(&self) -> &str;
}

/// Shared handle to a backend.
pub type SharedBackend = Arc<dyn LlmBackend>;

/// Scripted backend for tests.
///
/// Responses are handed out in order; every request is recorded so tests
/// can assert on the exact conversation sent upstream.
pub struct MockBackend {
    responses: parking_lot::Mutex<Vec<GenerateResponse>>,
    requests: parking_lot::Mutex<Vec<GenerateRequest>>,
}

impl MockBackend {
    /// Create a mock that plays back `responses` in order.
    pub fn new(responses: Vec<GenerateResponse>) -> Self {
        Self {
            responses: parking_lot::Mutex::new(responses),
            requests: parking_lot::Mutex::new(Vec::new()),
        }
    }

    /// Create a mock that answers every request with the same text.
    pub fn with_text(text: &str) -> Self {
        use crate::types::Part;
        Self::new(vec![GenerateResponse::from_parts(vec![Part::text(text)]); 4])
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().clone()
    }

    /// Number of requests received.
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl LlmBackend for MockBackend {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse> {
        self.requests.lock().push(request);
        let mut responses = self.responses.lock();
        if responses.is_empty() {
            return Err(LlmError::backend("mock response script exhausted"));
        }
        Ok(responses.remove(0))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

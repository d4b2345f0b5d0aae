//! Scripted transport for tests

use super::{HttpTransport, TransportError, TransportRequest, TransportResponse};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Transport that replays queued responses and records every request.
///
/// When the queue is empty it answers with the fallback response (201 with
/// an empty JSON object unless overridden).
#[derive(Clone)]
pub struct RecordingTransport {
    requests: Arc<Mutex<Vec<TransportRequest>>>,
    responses: Arc<Mutex<VecDeque<Result<TransportResponse, TransportError>>>>,
    fallback: TransportResponse,
}

impl RecordingTransport {
    /// Create a transport answering every call with `201 {}`
    pub fn new() -> Self {
        Self::with_fallback(TransportResponse::new(201, "{}"))
    }

    /// Create a transport answering unscripted calls with `fallback`
    pub fn with_fallback(fallback: TransportResponse) -> Self {
        Self {
            requests: Arc::new(Mutex::new(Vec::new())),
            responses: Arc::new(Mutex::new(VecDeque::new())),
            fallback,
        }
    }

    /// Queue a response for the next unanswered call
    pub async fn push_response(&self, status: u16, body: impl Into<String>) {
        self.push(TransportResponse::new(status, body)).await;
    }

    /// Queue a full response, headers included
    pub async fn push(&self, response: TransportResponse) {
        self.responses.lock().await.push_back(Ok(response));
    }

    /// Queue a transport-level failure for the next unanswered call
    pub async fn push_error(&self, error: TransportError) {
        self.responses.lock().await.push_back(Err(error));
    }

    /// Get all recorded requests
    pub async fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().await.clone()
    }

    /// Get the count of recorded requests
    pub async fn request_count(&self) -> usize {
        self.requests.lock().await.len()
    }
}

impl Default for RecordingTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpTransport for RecordingTransport {
    async fn post_json(
        &self,
        request: TransportRequest,
    ) -> Result<TransportResponse, TransportError> {
        self.requests.lock().await.push(request);
        self.responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok(self.fallback.clone()))
    }
}

//! In-memory transport for testing.

use crate::application::ports::{Transport, TransportError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// One document received by a [`MockTransport`].
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Submission {
    /// Serialized document
    pub body: String,
    /// Signature header value
    pub signature: String,
    /// When the submission arrived, on tokio's clock
    pub at: tokio::time::Instant,
}

#[derive(Debug)]
struct State {
    submissions: Vec<Submission>,
    scripted: VecDeque<Result<String, TransportError>>,
    default_response: String,
    latency: Duration,
}

/// Transport that records submissions instead of sending them.
///
/// Responses are taken from a script first (see [`push_response`](Self::push_response)),
/// then fall back to a fixed default body. Clones share state.
///
/// # Examples
///
/// ```
/// use crpt_throttle::infrastructure::mocks::MockTransport;
/// use crpt_throttle::{CrptClient, Document};
/// use std::sync::Arc;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let transport = MockTransport::new().with_default_response("ok");
/// let client = CrptClient::builder()
///     .with_transport(Arc::new(transport.clone()))
///     .build()
///     .unwrap();
///
/// client.create_document(&Document::default(), "sig").await.unwrap();
/// assert_eq!(transport.submissions()[0].body, r#"{"products":[]}"#);
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MockTransport {
    state: Arc<Mutex<State>>,
}

impl MockTransport {
    /// Create a transport answering every submission with `{}`.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                submissions: Vec::new(),
                scripted: VecDeque::new(),
                default_response: "{}".to_string(),
                latency: Duration::ZERO,
            })),
        }
    }

    /// Set the body returned once the script is exhausted.
    pub fn with_default_response(self, body: impl Into<String>) -> Self {
        self.lock().default_response = body.into();
        self
    }

    /// Delay every response by `latency` on tokio's clock.
    ///
    /// The submission is recorded on arrival, before the delay.
    pub fn with_latency(self, latency: Duration) -> Self {
        self.lock().latency = latency;
        self
    }

    /// Queue the result of a future submission.
    pub fn push_response(&self, response: Result<String, TransportError>) {
        self.lock().scripted.push_back(response);
    }

    /// Get all recorded submissions, in arrival order.
    pub fn submissions(&self) -> Vec<Submission> {
        self.lock().submissions.clone()
    }

    /// Clear recorded submissions and scripted responses.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.submissions.clear();
        state.scripted.clear();
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .expect("MockTransport mutex poisoned - a test thread panicked while holding the lock")
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn submit(&self, body: String, signature: &str) -> Result<String, TransportError> {
        let (response, latency) = {
            let mut state = self.lock();
            state.submissions.push(Submission {
                body,
                signature: signature.to_string(),
                at: tokio::time::Instant::now(),
            });
            let response = match state.scripted.pop_front() {
                Some(response) => response,
                None => Ok(state.default_response.clone()),
            };
            (response, state.latency)
        };

        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        response
    }
}

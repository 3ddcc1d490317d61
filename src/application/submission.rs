//! Rate-limited document submission.
//!
//! Each request runs admit → serialize → submit inside one async critical
//! section, so a permit is never taken without the matching submission being
//! attempted, and concurrent callers cannot push more than the request limit
//! through a single window. Callers queue for that section in arrival order;
//! cancellation and shutdown reach them while queued as well as while waiting
//! for a permit.

use crate::application::limiter::{AdmitError, RateLimiter};
use crate::application::metrics::Metrics;
use crate::application::ports::{Transport, TransportError};
use crate::domain::codec::{self, SerializationError};
use crate::domain::document::Document;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

/// Error returned by a document submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrptError {
    /// The caller gave up while waiting for a permit
    Cancelled,
    /// The client has been shut down
    Closed,
    /// The document could not be encoded
    Serialization(SerializationError),
    /// The document could not be delivered
    Transport(TransportError),
}

impl CrptError {
    /// Check whether the error came from a shut-down client.
    pub fn is_closed(&self) -> bool {
        matches!(self, CrptError::Closed)
    }

    /// Check whether the caller cancelled the wait for a permit.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CrptError::Cancelled)
    }
}

impl std::fmt::Display for CrptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CrptError::Cancelled => write!(f, "{}", AdmitError::Cancelled),
            CrptError::Closed => write!(f, "{}", AdmitError::Closed),
            CrptError::Serialization(e) => write!(f, "serialization error: {}", e),
            CrptError::Transport(e) => write!(f, "transport error: {}", e),
        }
    }
}

impl std::error::Error for CrptError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CrptError::Serialization(e) => Some(e),
            CrptError::Transport(e) => Some(e),
            CrptError::Cancelled | CrptError::Closed => None,
        }
    }
}

impl From<AdmitError> for CrptError {
    fn from(e: AdmitError) -> Self {
        match e {
            AdmitError::Cancelled => CrptError::Cancelled,
            AdmitError::Closed => CrptError::Closed,
        }
    }
}

impl From<SerializationError> for CrptError {
    fn from(e: SerializationError) -> Self {
        CrptError::Serialization(e)
    }
}

impl From<TransportError> for CrptError {
    fn from(e: TransportError) -> Self {
        CrptError::Transport(e)
    }
}

/// Pairs rate-limit admission with document delivery.
#[derive(Debug, Clone)]
pub struct SubmissionService {
    limiter: Arc<RateLimiter>,
    transport: Arc<dyn Transport>,
    in_flight: Arc<Mutex<()>>,
}

impl SubmissionService {
    /// Create a service that submits through `transport` under `limiter`.
    pub fn new(limiter: Arc<RateLimiter>, transport: Arc<dyn Transport>) -> Self {
        Self {
            limiter,
            transport,
            in_flight: Arc::new(Mutex::new(())),
        }
    }

    /// Submit a document, waiting for a permit as long as needed.
    pub async fn submit(&self, document: &Document, signature: &str) -> Result<String, CrptError> {
        self.submit_until(document, signature, std::future::pending())
            .await
    }

    /// Submit a document unless `cancel` completes first.
    ///
    /// `cancel` is raced against the wait for the submission slot and then
    /// against the wait for a permit. Once admitted, the HTTP request runs to
    /// completion.
    ///
    /// # Errors
    /// Returns `CrptError::Cancelled` or `CrptError::Closed` if either wait is
    /// interrupted; nothing is sent in that case.
    pub async fn submit_until<F>(
        &self,
        document: &Document,
        signature: &str,
        cancel: F,
    ) -> Result<String, CrptError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(cancel);

        let _guard = tokio::select! {
            biased;
            guard = self.in_flight.lock() => guard,
            _ = self.limiter.closed() => return Err(CrptError::Closed),
            _ = &mut cancel => {
                debug!("submission cancelled while queued");
                return Err(CrptError::Cancelled);
            }
        };

        self.limiter.admit_until(cancel.as_mut()).await?;

        let result = self.serialize_and_send(document, signature).await;
        match &result {
            Ok(body) => {
                self.metrics().record_submitted();
                info!(
                    doc_id = document.doc_id.as_deref().unwrap_or(""),
                    response = %body,
                    "document submitted"
                );
            }
            Err(e) => {
                self.metrics().record_failure();
                error!(
                    doc_id = document.doc_id.as_deref().unwrap_or(""),
                    error = %e,
                    "document submission failed"
                );
            }
        }
        result
    }

    async fn serialize_and_send(
        &self,
        document: &Document,
        signature: &str,
    ) -> Result<String, CrptError> {
        let body = codec::serialize(Some(document))?;
        let response = self.transport.submit(body, signature).await?;
        Ok(response)
    }

    /// Get a reference to the limiter.
    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Get a reference to the metrics.
    pub fn metrics(&self) -> &Metrics {
        self.limiter.metrics()
    }
}

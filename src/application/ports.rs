//! Ports (interfaces) for the application layer.
//!
//! In hexagonal architecture, ports define the interfaces that the application
//! layer needs. Infrastructure adapters implement these ports.

use async_trait::async_trait;
use std::fmt::Debug;
use std::time::Instant;

/// Port for obtaining current time.
///
/// Infrastructure provides concrete implementations (SystemClock, MockClock).
pub trait Clock: Send + Sync + Debug {
    /// Get the current instant.
    fn now(&self) -> Instant;
}

/// Error returned when a document could not be delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The request could not be sent or no response arrived
    Send {
        /// Target endpoint
        endpoint: String,
        /// Underlying failure
        reason: String,
    },
    /// No response within the configured timeout
    Timeout {
        /// Target endpoint
        endpoint: String,
    },
    /// A response arrived but its body could not be read
    Body {
        /// Underlying failure
        reason: String,
    },
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::Send { endpoint, reason } => {
                write!(f, "failed to send document to {}: {}", endpoint, reason)
            }
            TransportError::Timeout { endpoint } => {
                write!(f, "request to {} timed out", endpoint)
            }
            TransportError::Body { reason } => {
                write!(f, "failed to read response body: {}", reason)
            }
        }
    }
}

impl std::error::Error for TransportError {}

/// Port for delivering a serialized document.
///
/// Implementations send `body` with the given `signature` and return the raw
/// response body. An empty body is a valid success; a failure to deliver is
/// always a `TransportError`.
#[async_trait]
pub trait Transport: Send + Sync + Debug {
    /// Submit a serialized document and return the response body.
    async fn submit(&self, body: String, signature: &str) -> Result<String, TransportError>;
}

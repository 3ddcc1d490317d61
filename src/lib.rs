//! # crpt-throttle
//!
//! Rate-limited client for the CRPT (Честный ЗНАК) document API.
//!
//! The client submits product-registration documents to
//! `POST https://ismp.crpt.ru/api/v3/lk/documents/create` and never sends more
//! than a configured number of requests per time window. Callers that exceed
//! the quota wait for the next window instead of failing.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use crpt_throttle::{CrptClient, Description, Document, Product};
//! use std::time::Duration;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // At most 10 documents per minute
//! let client = CrptClient::builder()
//!     .with_request_limit(10)
//!     .with_window(Duration::from_secs(60))
//!     .build()?;
//!
//! let document = Document {
//!     description: Some(Description::new("7700000000")),
//!     doc_id: Some("a1b2c3".to_string()),
//!     doc_type: Some("LP_INTRODUCE_GOODS".to_string()),
//!     products: vec![Product {
//!         tnved_code: Some("6401100000".to_string()),
//!         uit_code: Some("010463003407001221SxMGorvNuq6Wk91fgr92sHg".to_string()),
//!         ..Product::default()
//!     }],
//!     ..Document::default()
//! };
//!
//! let response = client.create_document(&document, "base64-signature").await?;
//! println!("{}", response);
//! # Ok(())
//! # }
//! ```
//!
//! ## Rate Limiting
//!
//! Permits are counted in **fixed windows**. A window opens with the first
//! request after the previous one ended and lasts the configured duration;
//! within it at most `request_limit` requests are sent. Further callers sleep
//! until the window ends.
//!
//! Admission, serialization and the HTTP request run as one critical section,
//! so concurrent callers are sent one at a time and a permit is never taken
//! without the matching request being attempted. The client queues callers
//! for that section in arrival order, which is what orders them across
//! windows; a bare [`RateLimiter`] wakes its waiters together in no
//! particular order.
//!
//! ## Cancellation and Shutdown
//!
//! A caller can bound its wait for a permit with any future:
//!
//! ```rust,no_run
//! # use crpt_throttle::{CrptClient, Document};
//! # use std::time::Duration;
//! # async fn run(client: CrptClient, document: Document) {
//! let result = client
//!     .create_document_until(&document, "sig", tokio::time::sleep(Duration::from_secs(5)))
//!     .await;
//!
//! match result {
//!     Ok(body) => println!("{}", body),
//!     Err(e) if e.is_cancelled() => println!("no permit within 5s"),
//!     Err(e) => eprintln!("{}", e),
//! }
//! # }
//! ```
//!
//! `CrptClient::shutdown` wakes every waiting caller with `CrptError::Closed`
//! and makes later calls fail immediately.
//!
//! ## Errors
//!
//! Nothing is reported through empty values: every failure is a
//! [`CrptError`] (`Cancelled`, `Closed`, `Serialization`, `Transport`), and
//! invalid configuration is a [`BuildError`] at construction time. The HTTP
//! response body is returned as-is whatever its status code.
//!
//! ## Logging
//!
//! The crate emits `tracing` events (`debug` for admissions, `info` for
//! responses, `error` for failed submissions) and never installs a subscriber.

// Domain layer - pure business logic
pub mod domain;

// Application layer - orchestration
pub mod application;

// Infrastructure layer - external adapters
pub mod infrastructure;

pub use domain::{
    codec::{self, SerializationError},
    document::{Description, Document, Product},
    window::{FixedWindow, WindowDecision, WindowError},
};

pub use application::{
    limiter::{AdmitError, RateLimiter},
    metrics::{Metrics, MetricsSnapshot},
    ports::{Clock, Transport, TransportError},
    submission::{CrptError, SubmissionService},
};

pub use infrastructure::{
    client::{BuildError, CrptClient, CrptClientBuilder},
    clock::SystemClock,
    http::{HttpTransport, DEFAULT_ENDPOINT, DEFAULT_TIMEOUT},
};

//! The public client: builder, configuration validation and wiring.

use crate::application::{
    limiter::RateLimiter,
    metrics::Metrics,
    ports::{Clock, Transport},
    submission::{CrptError, SubmissionService},
};
use crate::domain::{document::Document, window::WindowError};
use crate::infrastructure::clock::SystemClock;
use crate::infrastructure::http::{HttpTransport, DEFAULT_ENDPOINT, DEFAULT_TIMEOUT};
use reqwest::Url;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Error returned when building a `CrptClient` fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// Request limit or window is invalid
    Window(WindowError),
    /// Endpoint is not an absolute http(s) URL
    InvalidEndpoint(String),
    /// Request timeout must be greater than zero
    ZeroTimeout,
    /// The HTTP client could not be constructed
    HttpClient(String),
}

impl std::fmt::Display for BuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildError::Window(e) => write!(f, "rate limit configuration error: {}", e),
            BuildError::InvalidEndpoint(endpoint) => {
                write!(f, "invalid endpoint: {}", endpoint)
            }
            BuildError::ZeroTimeout => write!(f, "request timeout must be greater than 0"),
            BuildError::HttpClient(reason) => {
                write!(f, "failed to build HTTP client: {}", reason)
            }
        }
    }
}

impl std::error::Error for BuildError {}

impl From<WindowError> for BuildError {
    fn from(e: WindowError) -> Self {
        BuildError::Window(e)
    }
}

/// Builder for constructing a `CrptClient`.
pub struct CrptClientBuilder {
    request_limit: u32,
    window: Duration,
    endpoint: String,
    timeout: Duration,
    clock: Option<Arc<dyn Clock>>,
    transport: Option<Arc<dyn Transport>>,
}

impl CrptClientBuilder {
    /// Set the maximum number of requests per window.
    ///
    /// Default: 5. The value will be validated when `build()` is called.
    pub fn with_request_limit(mut self, request_limit: u32) -> Self {
        self.request_limit = request_limit;
        self
    }

    /// Set the window length.
    ///
    /// Default: 1 second. The value will be validated when `build()` is called.
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Set the document creation endpoint.
    ///
    /// Default: `https://ismp.crpt.ru/api/v3/lk/documents/create`
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the per-request timeout of the HTTP transport.
    ///
    /// Default: 30 seconds. Ignored when a custom transport is set.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set a custom clock (mainly for testing).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Replace the HTTP transport (mainly for testing).
    ///
    /// Endpoint and timeout settings do not apply to a custom transport.
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    /// Returns `BuildError` if the configuration is invalid.
    pub fn build(self) -> Result<CrptClient, BuildError> {
        let clock: Arc<dyn Clock> = match self.clock {
            Some(clock) => clock,
            None => Arc::new(SystemClock::new()),
        };
        let limiter = Arc::new(RateLimiter::with_clock(
            self.request_limit,
            self.window,
            clock,
        )?);

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(http_transport(&self.endpoint, self.timeout)?),
        };

        debug!(
            request_limit = self.request_limit,
            window_ms = self.window.as_millis() as u64,
            "client configured"
        );

        Ok(CrptClient {
            service: SubmissionService::new(limiter, transport),
        })
    }
}

impl Default for CrptClientBuilder {
    fn default() -> Self {
        Self {
            request_limit: 5,
            window: Duration::from_secs(1),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            clock: None,
            transport: None,
        }
    }
}

fn http_transport(endpoint: &str, timeout: Duration) -> Result<HttpTransport, BuildError> {
    if timeout.is_zero() {
        return Err(BuildError::ZeroTimeout);
    }
    let url = Url::parse(endpoint)
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https"))
        .ok_or_else(|| BuildError::InvalidEndpoint(endpoint.to_string()))?;
    HttpTransport::new(url, timeout).map_err(|e| BuildError::HttpClient(e.to_string()))
}

/// Rate-limited client for the CRPT document API.
///
/// Cloning is cheap; clones share the limiter, the transport and the
/// submission lock.
///
/// # Example
/// ```no_run
/// use crpt_throttle::{codec, CrptClient};
/// use std::time::Duration;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let client = CrptClient::builder()
///     .with_request_limit(10)
///     .with_window(Duration::from_secs(60))
///     .build()?;
///
/// let document = codec::read_document("document.json")?;
/// let response = client.create_document(&document, "base64-signature").await?;
/// println!("{}", response);
///
/// client.shutdown();
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CrptClient {
    service: SubmissionService,
}

impl CrptClient {
    /// Create a client with the default limit (5 requests per second).
    pub fn new() -> Result<Self, BuildError> {
        Self::builder().build()
    }

    /// Create a builder for configuring the client.
    pub fn builder() -> CrptClientBuilder {
        CrptClientBuilder::default()
    }

    /// Submit a document and return the raw response body.
    ///
    /// Waits for a permit if the current window is exhausted.
    ///
    /// # Errors
    /// `CrptError::Closed` after [`shutdown`](Self::shutdown), otherwise the
    /// first serialization or transport error.
    pub async fn create_document(
        &self,
        document: &Document,
        signature: &str,
    ) -> Result<String, CrptError> {
        self.service.submit(document, signature).await
    }

    /// Like [`create_document`](Self::create_document), but gives up with
    /// `CrptError::Cancelled` if `cancel` completes while waiting for a permit.
    pub async fn create_document_until<F>(
        &self,
        document: &Document,
        signature: &str,
        cancel: F,
    ) -> Result<String, CrptError>
    where
        F: Future<Output = ()>,
    {
        self.service.submit_until(document, signature, cancel).await
    }

    /// Shut the client down; pending and later submissions fail with
    /// `CrptError::Closed`.
    pub fn shutdown(&self) {
        self.service.limiter().shutdown();
    }

    /// Get the shared rate limiter.
    pub fn limiter(&self) -> &Arc<RateLimiter> {
        self.service.limiter()
    }

    /// Get a reference to the metrics.
    pub fn metrics(&self) -> &Metrics {
        self.service.metrics()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::mocks::{MockClock, MockTransport};
    use std::time::Instant;

    #[test]
    fn test_defaults() {
        let client = CrptClient::new().unwrap();
        assert_eq!(client.limiter().request_limit(), 5);
        assert_eq!(client.limiter().window(), Duration::from_secs(1));
    }

    #[test]
    fn test_zero_request_limit() {
        let result = CrptClient::builder().with_request_limit(0).build();
        assert!(matches!(
            result,
            Err(BuildError::Window(WindowError::ZeroRequestLimit))
        ));
    }

    #[test]
    fn test_zero_window() {
        let result = CrptClient::builder().with_window(Duration::ZERO).build();
        assert!(matches!(
            result,
            Err(BuildError::Window(WindowError::ZeroWindow))
        ));
    }

    #[test]
    fn test_invalid_endpoint() {
        for endpoint in ["not a url", "ftp://ismp.crpt.ru/create"] {
            let result = CrptClient::builder().with_endpoint(endpoint).build();
            assert_eq!(
                result.unwrap_err(),
                BuildError::InvalidEndpoint(endpoint.to_string())
            );
        }
    }

    #[test]
    fn test_zero_timeout() {
        let result = CrptClient::builder().with_timeout(Duration::ZERO).build();
        assert_eq!(result.unwrap_err(), BuildError::ZeroTimeout);
    }

    #[test]
    fn test_custom_transport_skips_http_settings() {
        let result = CrptClient::builder()
            .with_endpoint("not a url")
            .with_transport(Arc::new(MockTransport::new()))
            .build();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_create_document_with_mock_clock() {
        let clock = MockClock::new(Instant::now());
        let transport = MockTransport::new().with_default_response("accepted");
        let client = CrptClient::builder()
            .with_request_limit(1)
            .with_window(Duration::from_secs(60))
            .with_clock(Arc::new(clock.clone()))
            .with_transport(Arc::new(transport.clone()))
            .build()
            .unwrap();

        let document = Document::default();
        assert_eq!(
            client.create_document(&document, "sig").await.unwrap(),
            "accepted"
        );
        assert_eq!(client.limiter().available_permits(), 0);

        clock.advance(Duration::from_secs(60));
        assert_eq!(
            client.create_document(&document, "sig").await.unwrap(),
            "accepted"
        );
        assert_eq!(transport.submissions().len(), 2);
        assert_eq!(client.metrics().permits_granted(), 2);
    }

    #[tokio::test]
    async fn test_shutdown() {
        let client = CrptClient::builder()
            .with_transport(Arc::new(MockTransport::new()))
            .build()
            .unwrap();
        let clone = client.clone();

        client.shutdown();

        let result = clone.create_document(&Document::default(), "sig").await;
        assert_eq!(result, Err(CrptError::Closed));
    }

    #[test]
    fn test_build_error_display() {
        assert_eq!(
            BuildError::from(WindowError::ZeroRequestLimit).to_string(),
            "rate limit configuration error: request limit must be greater than 0"
        );
    }
}

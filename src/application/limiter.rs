//! Rate limiter coordination logic.
//!
//! The rate limiter issues permits from a [`FixedWindow`] and parks callers
//! whose window is exhausted until it rolls over. Waiting is cancellable
//! through a caller-supplied future and is interrupted by [`RateLimiter::shutdown`].

use crate::application::metrics::Metrics;
use crate::application::ports::Clock;
use crate::domain::window::{FixedWindow, WindowDecision, WindowError};
use crate::infrastructure::clock::SystemClock;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, warn};

// Floor for one wait, so a clock that lags behind tokio's never spins.
const MIN_WAIT: Duration = Duration::from_millis(1);

/// Error returned when a permit could not be obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmitError {
    /// The caller gave up while waiting for the window to roll over
    Cancelled,
    /// The limiter has been shut down
    Closed,
}

impl std::fmt::Display for AdmitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdmitError::Cancelled => write!(f, "cancelled while waiting for a permit"),
            AdmitError::Closed => write!(f, "rate limiter is closed"),
        }
    }
}

impl std::error::Error for AdmitError {}

/// Admits at most `request_limit` operations per window.
///
/// # Example
/// ```
/// use crpt_throttle::RateLimiter;
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let limiter = RateLimiter::new(2, Duration::from_secs(1)).unwrap();
///
/// limiter.admit().await.unwrap();
/// limiter.admit().await.unwrap();
/// assert_eq!(limiter.available_permits(), 0);
///
/// limiter.shutdown();
/// assert!(limiter.admit().await.is_err());
/// # }
/// ```
#[derive(Debug)]
pub struct RateLimiter {
    window: Mutex<FixedWindow>,
    clock: Arc<dyn Clock>,
    closed: watch::Sender<bool>,
    metrics: Metrics,
}

impl RateLimiter {
    /// Create a limiter driven by the system clock.
    ///
    /// # Errors
    /// Returns `WindowError` if `request_limit` or `window` is zero.
    pub fn new(request_limit: u32, window: Duration) -> Result<Self, WindowError> {
        Self::with_clock(request_limit, window, Arc::new(SystemClock::new()))
    }

    /// Create a limiter driven by a custom clock.
    ///
    /// The first window starts at `clock.now()`.
    pub fn with_clock(
        request_limit: u32,
        window: Duration,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, WindowError> {
        let window = FixedWindow::new(request_limit, window, clock.now())?;
        let (closed, _) = watch::channel(false);

        Ok(Self {
            window: Mutex::new(window),
            clock,
            closed,
            metrics: Metrics::new(),
        })
    }

    /// Wait for a permit and consume it.
    ///
    /// Dropping the returned future gives up the wait without consuming a permit.
    ///
    /// # Errors
    /// Returns `AdmitError::Closed` if the limiter is or becomes shut down.
    pub async fn admit(&self) -> Result<(), AdmitError> {
        self.admit_until(std::future::pending()).await
    }

    /// Wait for a permit unless `cancel` completes first.
    ///
    /// `cancel` is only raced against the wait; a permit that is available
    /// immediately is issued without polling it.
    ///
    /// # Errors
    /// Returns `AdmitError::Cancelled` if `cancel` completes while waiting, or
    /// `AdmitError::Closed` if the limiter is or becomes shut down.
    pub async fn admit_until<F>(&self, cancel: F) -> Result<(), AdmitError>
    where
        F: Future<Output = ()>,
    {
        let mut closed = self.closed.subscribe();
        tokio::pin!(cancel);
        let mut delayed = false;

        loop {
            if *closed.borrow_and_update() {
                return Err(AdmitError::Closed);
            }

            let now = self.clock.now();
            let retry_at = match self.lock_window().register_request(now) {
                WindowDecision::Admit => {
                    self.metrics.record_permit();
                    debug!(delayed, "permit granted");
                    return Ok(());
                }
                WindowDecision::WaitUntil(retry_at) => retry_at,
            };

            // Measured on the limiter's clock, slept on tokio's
            let wait = retry_at.saturating_duration_since(now).max(MIN_WAIT);
            if !delayed {
                delayed = true;
                self.metrics.record_delay();
                debug!(
                    wait_ms = wait.as_millis() as u64,
                    "request limit reached, waiting for next window"
                );
            }

            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                // Re-checked at the top of the loop
                _ = closed.changed() => {}
                _ = &mut cancel => {
                    debug!("permit wait cancelled");
                    return Err(AdmitError::Cancelled);
                }
            }
        }
    }

    /// Close the limiter.
    ///
    /// Every waiting caller and every later call fails with
    /// `AdmitError::Closed`. Calling this more than once has no further effect.
    pub fn shutdown(&self) {
        let was_closed = self.closed.send_replace(true);
        if !was_closed {
            warn!("rate limiter shut down");
        }
    }

    /// Resolve once [`shutdown`](Self::shutdown) has been called.
    ///
    /// Resolves immediately on a limiter that is already closed.
    pub async fn closed(&self) {
        let mut closed = self.closed.subscribe();
        // The sender lives in `self`, so this only errors after drop
        let _ = closed.wait_for(|closed| *closed).await;
    }

    /// Check whether [`shutdown`](Self::shutdown) has been called.
    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// Permits left in the current window.
    pub fn available_permits(&self) -> u32 {
        self.lock_window().remaining(self.clock.now())
    }

    /// Maximum permits per window.
    pub fn request_limit(&self) -> u32 {
        self.lock_window().request_limit()
    }

    /// Window length.
    pub fn window(&self) -> Duration {
        self.lock_window().duration()
    }

    /// Get a reference to the metrics.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    // The window is only mutated by `register_request`, which cannot panic
    // halfway, so a poisoned lock still guards consistent state.
    fn lock_window(&self) -> MutexGuard<'_, FixedWindow> {
        self.window.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

//! Observability metrics for document submission.
//!
//! Counts admissions and submission outcomes for monitoring and debugging.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Metrics tracking admission and submission statistics.
///
/// All metrics use atomic operations for thread-safe updates and reads.
/// Clones share the same counters.
#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug)]
struct MetricsInner {
    /// Permits issued by the limiter
    permits_granted: AtomicU64,
    /// Admissions that had to wait for a window to roll over
    admissions_delayed: AtomicU64,
    /// Documents delivered (any response body)
    documents_submitted: AtomicU64,
    /// Requests that ended in an error after admission
    submissions_failed: AtomicU64,
}

impl Metrics {
    /// Create a new metrics tracker.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                permits_granted: AtomicU64::new(0),
                admissions_delayed: AtomicU64::new(0),
                documents_submitted: AtomicU64::new(0),
                submissions_failed: AtomicU64::new(0),
            }),
        }
    }

    pub(crate) fn record_permit(&self) {
        self.inner.permits_granted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_delay(&self) {
        self.inner.admissions_delayed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_submitted(&self) {
        self.inner
            .documents_submitted
            .fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.inner.submissions_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the number of permits issued.
    pub fn permits_granted(&self) -> u64 {
        self.inner.permits_granted.load(Ordering::Relaxed)
    }

    /// Get the number of admissions that waited for a new window.
    pub fn admissions_delayed(&self) -> u64 {
        self.inner.admissions_delayed.load(Ordering::Relaxed)
    }

    /// Get the number of documents delivered.
    pub fn documents_submitted(&self) -> u64 {
        self.inner.documents_submitted.load(Ordering::Relaxed)
    }

    /// Get the number of failed submissions.
    pub fn submissions_failed(&self) -> u64 {
        self.inner.submissions_failed.load(Ordering::Relaxed)
    }

    /// Get a snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            permits_granted: self.permits_granted(),
            admissions_delayed: self.admissions_delayed(),
            documents_submitted: self.documents_submitted(),
            submissions_failed: self.submissions_failed(),
        }
    }

    /// Reset all metrics to zero.
    pub fn reset(&self) {
        self.inner.permits_granted.store(0, Ordering::Relaxed);
        self.inner.admissions_delayed.store(0, Ordering::Relaxed);
        self.inner.documents_submitted.store(0, Ordering::Relaxed);
        self.inner.submissions_failed.store(0, Ordering::Relaxed);
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time snapshot of metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub permits_granted: u64,
    pub admissions_delayed: u64,
    pub documents_submitted: u64,
    pub submissions_failed: u64,
}

impl MetricsSnapshot {
    /// Fraction of finished requests that failed (0.0 to 1.0).
    ///
    /// Returns 0.0 if nothing has finished yet.
    pub fn failure_rate(&self) -> f64 {
        let total = self.total_finished();
        if total == 0 {
            0.0
        } else {
            self.submissions_failed as f64 / total as f64
        }
    }

    /// Requests that finished, successfully or not.
    pub fn total_finished(&self) -> u64 {
        self.documents_submitted
            .saturating_add(self.submissions_failed)
    }
}

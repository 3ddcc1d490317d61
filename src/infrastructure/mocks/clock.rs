//! Hand-driven clock for testing.

use crate::application::ports::Clock;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Mock clock for testing.
///
/// Time only moves when the test says so, which makes window rollover
/// deterministic without sleeping. All clones share the same time value.
///
/// A limiter waiting on this clock sleeps for the remaining window as
/// measured here, then re-checks; advancing the clock releases it on the next
/// check.
///
/// # Examples
///
/// ```
/// use crpt_throttle::infrastructure::mocks::MockClock;
/// use crpt_throttle::RateLimiter;
/// use std::sync::Arc;
/// use std::time::{Duration, Instant};
///
/// let clock = MockClock::new(Instant::now());
/// let limiter =
///     RateLimiter::with_clock(2, Duration::from_secs(60), Arc::new(clock.clone())).unwrap();
/// assert_eq!(limiter.available_permits(), 2);
///
/// clock.advance(Duration::from_secs(61));
/// assert_eq!(limiter.available_permits(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct MockClock {
    current_time: Arc<Mutex<Instant>>,
}

impl MockClock {
    /// Create a mock clock starting at a specific instant.
    pub fn new(start: Instant) -> Self {
        Self {
            current_time: Arc::new(Mutex::new(start)),
        }
    }

    /// Advance the clock by a duration.
    pub fn advance(&self, duration: Duration) {
        *self.lock() += duration;
    }

    /// Set the clock to a specific instant.
    pub fn set(&self, instant: Instant) {
        *self.lock() = instant;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Instant> {
        self.current_time
            .lock()
            .expect("MockClock mutex poisoned - a test thread panicked while holding the lock")
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        *self.lock()
    }
}

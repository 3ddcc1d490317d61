//! Fixed-window admission accounting.
//!
//! A window starts at some instant and lasts a fixed duration. At most
//! `request_limit` permits are issued per window. The first request that
//! arrives at or after the window's end resets the counter and starts a new
//! window at that instant.
//!
//! `FixedWindow` owns no clock: callers pass the current instant, which keeps
//! the arithmetic deterministic and testable.

use std::time::{Duration, Instant};

/// Error returned when window parameters are invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowError {
    /// At least one permit per window is required
    ZeroRequestLimit,
    /// Window duration must be greater than zero
    ZeroWindow,
}

impl std::fmt::Display for WindowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WindowError::ZeroRequestLimit => write!(f, "request limit must be greater than 0"),
            WindowError::ZeroWindow => write!(f, "window duration must be greater than 0"),
        }
    }
}

impl std::error::Error for WindowError {}

/// Outcome of registering a request against the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowDecision {
    /// A permit was issued
    Admit,
    /// The window is exhausted; retry at the given instant
    WaitUntil(Instant),
}

impl WindowDecision {
    /// Check if this decision is Admit.
    pub fn is_admit(&self) -> bool {
        matches!(self, WindowDecision::Admit)
    }
}

/// Permit counter for one fixed window.
///
/// # Example
/// ```
/// use crpt_throttle::{FixedWindow, WindowDecision};
/// use std::time::{Duration, Instant};
///
/// let start = Instant::now();
/// let mut window = FixedWindow::new(2, Duration::from_secs(1), start).unwrap();
///
/// assert!(window.register_request(start).is_admit());
/// assert!(window.register_request(start).is_admit());
/// assert_eq!(
///     window.register_request(start),
///     WindowDecision::WaitUntil(start + Duration::from_secs(1))
/// );
///
/// // The window rolls over once its end is reached
/// assert!(window.register_request(start + Duration::from_secs(1)).is_admit());
/// ```
#[derive(Debug, Clone)]
pub struct FixedWindow {
    request_limit: u32,
    duration: Duration,
    start: Instant,
    issued: u32,
}

impl FixedWindow {
    /// Create a window starting at `start` with no permits issued.
    ///
    /// # Errors
    /// Returns `WindowError` if `request_limit` or `duration` is zero.
    pub fn new(request_limit: u32, duration: Duration, start: Instant) -> Result<Self, WindowError> {
        if request_limit == 0 {
            return Err(WindowError::ZeroRequestLimit);
        }
        if duration.is_zero() {
            return Err(WindowError::ZeroWindow);
        }
        Ok(Self {
            request_limit,
            duration,
            start,
            issued: 0,
        })
    }

    /// Register a request at `now`, issuing a permit if one is left.
    pub fn register_request(&mut self, now: Instant) -> WindowDecision {
        self.roll_over(now);

        if self.issued < self.request_limit {
            self.issued += 1;
            WindowDecision::Admit
        } else {
            WindowDecision::WaitUntil(self.end())
        }
    }

    /// Permits still available at `now`.
    ///
    /// An elapsed window counts as fully available.
    pub fn remaining(&self, now: Instant) -> u32 {
        if self.is_elapsed(now) {
            self.request_limit
        } else {
            self.request_limit - self.issued
        }
    }

    /// Instant at which the current window ends.
    pub fn end(&self) -> Instant {
        self.start + self.duration
    }

    /// Maximum permits per window.
    pub fn request_limit(&self) -> u32 {
        self.request_limit
    }

    /// Window length.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    fn is_elapsed(&self, now: Instant) -> bool {
        now >= self.end()
    }

    fn roll_over(&mut self, now: Instant) {
        if self.is_elapsed(now) {
            self.issued = 0;
            self.start = now;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admits_up_to_limit() {
        let start = Instant::now();
        let mut window = FixedWindow::new(3, Duration::from_secs(1), start).unwrap();

        assert_eq!(window.register_request(start), WindowDecision::Admit);
        assert_eq!(window.register_request(start), WindowDecision::Admit);
        assert_eq!(window.register_request(start), WindowDecision::Admit);
        assert_eq!(
            window.register_request(start),
            WindowDecision::WaitUntil(start + Duration::from_secs(1))
        );
    }

    #[test]
    fn test_instantaneous_burst() {
        let start = Instant::now();
        let mut window = FixedWindow::new(5, Duration::from_secs(1), start).unwrap();

        let admitted = (0..7)
            .filter(|_| window.register_request(start).is_admit())
            .count();

        assert_eq!(admitted, 5);
    }

    #[test]
    fn test_no_rollover_before_end() {
        let start = Instant::now();
        let mut window = FixedWindow::new(1, Duration::from_secs(1), start).unwrap();

        assert!(window.register_request(start).is_admit());
        let almost = start + Duration::from_millis(999);
        assert_eq!(
            window.register_request(almost),
            WindowDecision::WaitUntil(start + Duration::from_secs(1))
        );
    }

    #[test]
    fn test_rollover_starts_window_at_request() {
        let start = Instant::now();
        let mut window = FixedWindow::new(1, Duration::from_secs(1), start).unwrap();
        assert!(window.register_request(start).is_admit());

        // First request after the end starts the next window at that instant
        let later = start + Duration::from_millis(1500);
        assert!(window.register_request(later).is_admit());
        assert_eq!(window.end(), later + Duration::from_secs(1));
        assert_eq!(
            window.register_request(later + Duration::from_millis(900)),
            WindowDecision::WaitUntil(later + Duration::from_secs(1))
        );
    }

    #[test]
    fn test_remaining() {
        let start = Instant::now();
        let mut window = FixedWindow::new(3, Duration::from_secs(60), start).unwrap();
        assert_eq!(window.remaining(start), 3);

        window.register_request(start);
        window.register_request(start);
        assert_eq!(window.remaining(start), 1);

        // Stale window reports full capacity without mutating
        assert_eq!(window.remaining(start + Duration::from_secs(60)), 3);
        assert_eq!(window.remaining(start), 1);
    }

    #[test]
    fn test_invalid_parameters() {
        let now = Instant::now();
        assert_eq!(
            FixedWindow::new(0, Duration::from_secs(1), now).unwrap_err(),
            WindowError::ZeroRequestLimit
        );
        assert_eq!(
            FixedWindow::new(1, Duration::ZERO, now).unwrap_err(),
            WindowError::ZeroWindow
        );
    }

    #[test]
    fn test_accessors() {
        let window = FixedWindow::new(7, Duration::from_secs(60), Instant::now()).unwrap();
        assert_eq!(window.request_limit(), 7);
        assert_eq!(window.duration(), Duration::from_secs(60));
    }
}

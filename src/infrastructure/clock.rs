//! Clock adapters for time operations.
//!
//! # Testing
//!
//! `SystemClock` reads tokio's clock, so tests running with paused time
//! (`#[tokio::test(start_paused = true)]`) see virtual time here as well.
//! See `MockClock` (in `crate::infrastructure::mocks`) for a clock that is
//! advanced by hand.

use crate::application::ports::Clock;
use std::time::Instant;

/// System clock implementation backed by `tokio::time::Instant::now()`.
///
/// Outside a runtime, or without paused time, this is `Instant::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Create a new system clock.
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }
}

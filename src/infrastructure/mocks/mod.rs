//! Mock implementations for testing.
//!
//! This module provides test doubles for the clock and transport ports and a
//! log-capturing tracing layer.

pub mod clock;
pub mod layer;
pub mod transport;

pub use clock::MockClock;
pub use layer::{CapturedEvent, MockCaptureLayer};
pub use transport::{MockTransport, Submission};

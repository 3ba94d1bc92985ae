//! Ports (interfaces) for the application layer.
//!
//! In hexagonal architecture, ports define the interfaces that the
//! application layer needs. Infrastructure adapters implement these ports.

use std::fmt::Debug;
use std::time::Instant;

/// Port for obtaining current time.
///
/// Every time-based transition in the toolkit (circuit reset, window
/// rollover, cache expiry) reads the clock at call time, so swapping this
/// port for a controllable implementation makes the whole toolkit
/// deterministic under test. Infrastructure provides `SystemClock` for
/// production and `MockClock` for tests.
pub trait Clock: Send + Sync + Debug {
    /// Get the current instant.
    fn now(&self) -> Instant;
}

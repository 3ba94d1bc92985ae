//! Infrastructure layer - adapters for the application-layer ports.
//!
//! This layer provides:
//! - Clock adapters (system time vs mock)

pub mod clock;

/// Mock implementations for testing.
///
/// This module is only available when the `test-helpers` feature is enabled,
/// or during test builds. It provides a controllable clock for testing
/// time-driven transitions deterministically.
///
/// To use the mocks in integration tests, add to your `Cargo.toml`:
/// ```toml
/// [dev-dependencies]
/// resilience-toolkit = { version = "*", features = ["test-helpers"] }
/// ```
#[cfg(any(test, feature = "test-helpers"))]
pub mod mocks;

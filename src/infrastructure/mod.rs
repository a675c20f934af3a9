//! Infrastructure layer - external adapters.
//!
//! This layer provides adapters for:
//! - Clock abstraction (system time vs mock)
//! - Storage implementations (sharded maps)

pub mod clock;
pub mod storage;

/// Mock implementations for testing.
///
/// This module is only available when the `test-helpers` feature is
/// enabled, or during test builds. It provides controllable test
/// doubles for testing admission behavior.
///
/// To use these mocks in integration tests, add to your `Cargo.toml`:
/// ```toml
/// [dev-dependencies]
/// keyed-throttle = { version = "*", features = ["test-helpers"] }
/// ```
#[cfg(any(test, feature = "test-helpers"))]
pub mod mocks;

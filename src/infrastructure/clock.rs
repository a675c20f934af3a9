//! Clock adapters for time operations.
//!
//! Provides the SystemClock implementation for production use.
//!
//! # Testing
//!
//! See `MockClock` (in `crate::infrastructure::mocks`) for a
//! controllable test clock. Available with the `test-helpers` feature
//! or in test builds:
//!
//! ```toml
//! [dev-dependencies]
//! keyed-throttle = { version = "*", features = ["test-helpers"] }
//! ```

use std::time::Instant;

use crate::application::ports::Clock;

/// System clock reporting milliseconds on a monotonic timeline.
///
/// Anchored to the instant it was created; `now_millis` is the time
/// elapsed since that epoch and never decreases.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    /// Create a system clock anchored at the current instant.
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        self.epoch
            .elapsed()
            .as_millis()
            .try_into()
            .unwrap_or(u64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_system_clock_advances() {
        let clock = SystemClock::new();
        let t1 = clock.now_millis();
        std::thread::sleep(Duration::from_millis(10));
        let t2 = clock.now_millis();

        assert!(t2 > t1);
    }
}

//! Sliding window counter: an approximate decaying request count.
//!
//! The count decreases by one for every whole window that has elapsed
//! since the window anchor, and the anchor advances by whole windows.
//! This is a deliberately simplified linear decay, not the classical
//! two-window weighted average; callers rely on this exact rule.

use std::sync::RwLock;
use std::time::Duration;

use crate::domain::ConfigError;

/// Configuration for a [`SlidingWindowCounter`].
#[derive(Debug, Clone)]
pub struct SlidingWindowCounterConfig {
    /// Maximum requests allowed within the window
    pub capacity: u64,
    /// Length of the sliding window
    pub window: Duration,
}

impl SlidingWindowCounterConfig {
    /// Create a validated sliding window counter configuration.
    ///
    /// # Errors
    /// Returns [`ConfigError::ZeroPeriod`] if `window` is zero.
    pub fn new(capacity: u64, window: Duration) -> Result<Self, ConfigError> {
        if window.is_zero() {
            return Err(ConfigError::ZeroPeriod);
        }
        Ok(Self { capacity, window })
    }
}

#[derive(Debug)]
struct SlidingWindowCounterState {
    window_start_ms: u64,
    count: u64,
}

/// Approximate decaying request counter.
#[derive(Debug)]
pub struct SlidingWindowCounter {
    capacity: u64,
    window_ms: u64,
    state: RwLock<SlidingWindowCounterState>,
}

impl SlidingWindowCounter {
    /// Create a counter anchored at `now_ms`.
    pub fn new(config: &SlidingWindowCounterConfig, now_ms: u64) -> Self {
        Self {
            capacity: config.capacity,
            window_ms: config.window.as_millis() as u64,
            state: RwLock::new(SlidingWindowCounterState {
                window_start_ms: now_ms,
                count: 0,
            }),
        }
    }

    /// Decrement the count by one per elapsed whole window and advance
    /// the anchor by the same number of windows.
    fn decay(&self, state: &mut SlidingWindowCounterState, now_ms: u64) {
        let elapsed_windows = now_ms.saturating_sub(state.window_start_ms) / self.window_ms;
        if elapsed_windows > 0 {
            state.count = state.count.saturating_sub(elapsed_windows);
            state.window_start_ms += elapsed_windows * self.window_ms;
        }
    }

    /// Admit one request if the decayed count has room.
    pub fn admit(&self, now_ms: u64) -> bool {
        let mut state = self.state.write().expect(
            "sliding window counter lock poisoned - a thread panicked while holding the lock",
        );
        self.decay(&mut state, now_ms);
        if state.count < self.capacity {
            state.count += 1;
            true
        } else {
            false
        }
    }

    /// Decayed request count.
    pub fn count(&self, now_ms: u64) -> u64 {
        let mut state = self.state.write().expect(
            "sliding window counter lock poisoned - a thread panicked while holding the lock",
        );
        self.decay(&mut state, now_ms);
        state.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter(capacity: u64, window_ms: u64) -> SlidingWindowCounter {
        let config =
            SlidingWindowCounterConfig::new(capacity, Duration::from_millis(window_ms)).unwrap();
        SlidingWindowCounter::new(&config, 0)
    }

    #[test]
    fn test_capacity_then_denial() {
        let counter = counter(3, 1_000);

        assert!(counter.admit(0));
        assert!(counter.admit(0));
        assert!(counter.admit(0));
        assert!(!counter.admit(500));
    }

    #[test]
    fn test_linear_decay_one_per_window() {
        let counter = counter(5, 1_000);

        for _ in 0..5 {
            assert!(counter.admit(0));
        }

        // One elapsed window frees exactly one slot, not the whole
        // window's worth.
        assert_eq!(counter.count(1_000), 4);
        assert_eq!(counter.count(3_000), 2);
    }

    #[test]
    fn test_anchor_advances_by_whole_windows() {
        let counter = counter(5, 1_000);

        for _ in 0..5 {
            assert!(counter.admit(0));
        }

        // 1.5 windows elapsed: one window decays, anchor moves to
        // 1_000, and the half window carries to the next observation.
        assert_eq!(counter.count(1_500), 4);
        assert_eq!(counter.count(2_000), 3);
    }

    #[test]
    fn test_count_floors_at_zero() {
        let counter = counter(3, 100);

        assert!(counter.admit(0));
        assert_eq!(counter.count(60_000), 0);
    }

    #[test]
    fn test_admit_after_decay() {
        let counter = counter(1, 1_000);

        assert!(counter.admit(0));
        assert!(!counter.admit(999));
        assert!(counter.admit(1_000));
    }

    #[test]
    fn test_zero_window_rejected() {
        let result = SlidingWindowCounterConfig::new(10, Duration::from_secs(0));
        assert_eq!(result.unwrap_err(), ConfigError::ZeroPeriod);
    }
}

//! Leaky bucket: a drainable backlog with a constant leak rate.
//!
//! Water drains continuously at `leak_rate` units per `leak_period`.
//! The drained amount is truncated toward zero on every pass and the
//! leak anchor moves to the current time, so fractional leakage within
//! a pass is lost rather than carried over. That loss is part of the
//! algorithm's contract; do not round.

use std::sync::RwLock;
use std::time::Duration;

use crate::domain::ConfigError;

/// Configuration for a [`LeakyBucket`].
#[derive(Debug, Clone)]
pub struct LeakyBucketConfig {
    /// Maximum water the bucket can hold
    pub capacity: u64,
    /// Units drained per leak period
    pub leak_rate: f64,
    /// Length of one leak period
    pub leak_period: Duration,
}

impl LeakyBucketConfig {
    /// Create a validated leaky bucket configuration.
    ///
    /// # Errors
    /// Returns [`ConfigError::ZeroPeriod`] if `leak_period` is zero.
    pub fn new(capacity: u64, leak_rate: f64, leak_period: Duration) -> Result<Self, ConfigError> {
        if leak_period.is_zero() {
            return Err(ConfigError::ZeroPeriod);
        }
        Ok(Self {
            capacity,
            leak_rate,
            leak_period,
        })
    }
}

#[derive(Debug)]
struct LeakyBucketState {
    level: u64,
    last_leak_ms: u64,
}

/// Drainable request backlog.
///
/// Admission adds one unit of water; the bucket refuses when full.
#[derive(Debug)]
pub struct LeakyBucket {
    capacity: u64,
    leak_rate: f64,
    leak_period_ms: u64,
    state: RwLock<LeakyBucketState>,
}

impl LeakyBucket {
    /// Create an empty bucket anchored at `now_ms`.
    pub fn new(config: &LeakyBucketConfig, now_ms: u64) -> Self {
        Self {
            capacity: config.capacity,
            leak_rate: config.leak_rate,
            leak_period_ms: config.leak_period.as_millis() as u64,
            state: RwLock::new(LeakyBucketState {
                level: 0,
                last_leak_ms: now_ms,
            }),
        }
    }

    /// Drain water for the elapsed time, truncating toward zero.
    fn leak(&self, state: &mut LeakyBucketState, now_ms: u64) {
        let elapsed = now_ms.saturating_sub(state.last_leak_ms);
        let leaked = (elapsed as f64 / self.leak_period_ms as f64) * self.leak_rate;
        state.level = state.level.saturating_sub(leaked as u64);
        state.last_leak_ms = now_ms;
    }

    /// Admit one unit of work if the bucket has room after leaking.
    pub fn admit(&self, now_ms: u64) -> bool {
        let mut state = self
            .state
            .write()
            .expect("leaky bucket lock poisoned - a thread panicked while holding the lock");
        self.leak(&mut state, now_ms);
        if state.level < self.capacity {
            state.level += 1;
            true
        } else {
            false
        }
    }

    /// Current water level after leaking.
    pub fn level(&self, now_ms: u64) -> u64 {
        let mut state = self
            .state
            .write()
            .expect("leaky bucket lock poisoned - a thread panicked while holding the lock");
        self.leak(&mut state, now_ms);
        state.level
    }

    /// Add water directly, capped at capacity.
    pub fn fill(&self, now_ms: u64, amount: u64) {
        let mut state = self
            .state
            .write()
            .expect("leaky bucket lock poisoned - a thread panicked while holding the lock");
        self.leak(&mut state, now_ms);
        state.level = state.level.saturating_add(amount).min(self.capacity);
    }

    /// Remove water directly, returning the amount actually removed.
    pub fn drain(&self, now_ms: u64, amount: u64) -> u64 {
        let mut state = self
            .state
            .write()
            .expect("leaky bucket lock poisoned - a thread panicked while holding the lock");
        self.leak(&mut state, now_ms);
        let removed = amount.min(state.level);
        state.level -= removed;
        removed
    }

    /// Maximum water the bucket can hold.
    pub fn capacity(&self) -> u64 {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket(capacity: u64, leak_rate: f64, period_ms: u64) -> LeakyBucket {
        let config =
            LeakyBucketConfig::new(capacity, leak_rate, Duration::from_millis(period_ms)).unwrap();
        LeakyBucket::new(&config, 0)
    }

    #[test]
    fn test_denies_when_full() {
        let bucket = bucket(3, 1.0, 1_000);

        assert!(bucket.admit(0));
        assert!(bucket.admit(0));
        assert!(bucket.admit(0));
        assert!(!bucket.admit(0));
    }

    #[test]
    fn test_fill_to_capacity_then_deny() {
        let bucket = bucket(10, 1.0, 1_000);

        bucket.fill(0, 10);
        assert!(!bucket.admit(0));
    }

    #[test]
    fn test_leaks_by_rate_per_period() {
        let bucket = bucket(10, 3.0, 1_000);

        bucket.fill(0, 10);
        assert_eq!(bucket.level(1_000), 7);
        assert_eq!(bucket.level(2_000), 4);
    }

    #[test]
    fn test_fractional_leak_truncates() {
        let bucket = bucket(10, 1.0, 1_000);

        bucket.fill(0, 5);
        // Half a period leaks 0.5, truncated to 0, and the anchor
        // moves: the fraction is lost, not carried.
        assert_eq!(bucket.level(500), 5);
        assert_eq!(bucket.level(999), 5);
        // Each observation restarts the fraction; only a full period
        // between observations drains a unit.
        assert_eq!(bucket.level(1_999), 4);
    }

    #[test]
    fn test_level_never_negative() {
        let bucket = bucket(5, 10.0, 100);

        bucket.fill(0, 5);
        assert_eq!(bucket.level(60_000), 0);
    }

    #[test]
    fn test_drain_returns_amount_removed() {
        let bucket = bucket(10, 1.0, 1_000);

        bucket.fill(0, 4);
        assert_eq!(bucket.drain(0, 3), 3);
        assert_eq!(bucket.drain(0, 5), 1);
        assert_eq!(bucket.level(0), 0);
    }

    #[test]
    fn test_admit_after_leak_frees_room() {
        let bucket = bucket(2, 1.0, 1_000);

        assert!(bucket.admit(0));
        assert!(bucket.admit(0));
        assert!(!bucket.admit(0));
        assert!(bucket.admit(1_000));
    }

    #[test]
    fn test_zero_period_rejected() {
        let result = LeakyBucketConfig::new(10, 1.0, Duration::from_secs(0));
        assert_eq!(result.unwrap_err(), ConfigError::ZeroPeriod);
    }
}

//! Burst bucket: a token pool replenished by a background task.
//!
//! Unlike the token bucket, the foreground path does no refill math at
//! all: tokens only increase when [`BurstBucket::replenish`] runs,
//! normally from the periodic task in
//! [`crate::application::replenisher`]. The pool is a single atomic,
//! so consumers never block each other or the replenisher.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::domain::ConfigError;

/// Configuration for a [`BurstBucket`] and its replenisher.
#[derive(Debug, Clone)]
pub struct BurstConfig {
    /// Tokens added per replenishment tick
    pub refill_rate: u64,
    /// Maximum tokens the pool can hold
    pub burst_capacity: u64,
    /// Replenishment tick length
    pub tick: Duration,
}

impl BurstConfig {
    /// Create a burst configuration with the standard one-second tick.
    pub fn new(refill_rate: u64, burst_capacity: u64) -> Self {
        Self {
            refill_rate,
            burst_capacity,
            tick: Duration::from_secs(1),
        }
    }

    /// Override the replenishment tick.
    ///
    /// # Errors
    /// Returns [`ConfigError::ZeroPeriod`] if `tick` is zero.
    pub fn with_tick(mut self, tick: Duration) -> Result<Self, ConfigError> {
        if tick.is_zero() {
            return Err(ConfigError::ZeroPeriod);
        }
        self.tick = tick;
        Ok(self)
    }
}

/// Atomic token pool with background replenishment.
#[derive(Debug)]
pub struct BurstBucket {
    refill_rate: u64,
    burst_capacity: u64,
    tokens: AtomicU64,
}

impl BurstBucket {
    /// Create a pool at full burst capacity.
    pub fn new(config: &BurstConfig) -> Self {
        Self {
            refill_rate: config.refill_rate,
            burst_capacity: config.burst_capacity,
            tokens: AtomicU64::new(config.burst_capacity),
        }
    }

    /// Take one token if any are available.
    pub fn consume(&self) -> bool {
        self.tokens
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |tokens| {
                tokens.checked_sub(1)
            })
            .is_ok()
    }

    /// Apply one tick's worth of replenishment, capped at the burst
    /// capacity. Returns the number of tokens actually added.
    pub fn replenish(&self) -> u64 {
        let mut added = 0;
        let _ = self
            .tokens
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |tokens| {
                let next = tokens.saturating_add(self.refill_rate).min(self.burst_capacity);
                added = next - tokens;
                Some(next)
            });
        added
    }

    /// Current token count.
    pub fn tokens(&self) -> u64 {
        self.tokens.load(Ordering::Acquire)
    }

    /// Seconds a denied caller should wait before retrying: one tick
    /// when the pool is empty, zero otherwise.
    pub fn retry_after_secs(&self) -> u64 {
        if self.tokens() == 0 {
            1
        } else {
            0
        }
    }

    /// Maximum tokens the pool can hold.
    pub fn burst_capacity(&self) -> u64 {
        self.burst_capacity
    }
}

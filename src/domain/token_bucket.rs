//! Token bucket: a refillable allowance with lazy whole-period refill.
//!
//! The bucket starts full and refills `tokens_per_period` tokens for
//! every complete refill period that has elapsed since the last refill.
//! The refill anchor advances by whole periods only, so fractional
//! elapsed time carries over to the next call instead of drifting.

use std::sync::RwLock;
use std::time::Duration;

use crate::domain::ConfigError;

/// Configuration for a [`TokenBucket`].
#[derive(Debug, Clone)]
pub struct TokenBucketConfig {
    /// Maximum tokens the bucket can hold
    pub capacity: u64,
    /// Tokens added per elapsed refill period
    pub tokens_per_period: u64,
    /// Length of one refill period
    pub refill_period: Duration,
}

impl TokenBucketConfig {
    /// Create a validated token bucket configuration.
    ///
    /// # Errors
    /// Returns [`ConfigError::ZeroPeriod`] if `refill_period` is zero.
    pub fn new(
        capacity: u64,
        tokens_per_period: u64,
        refill_period: Duration,
    ) -> Result<Self, ConfigError> {
        if refill_period.is_zero() {
            return Err(ConfigError::ZeroPeriod);
        }
        Ok(Self {
            capacity,
            tokens_per_period,
            refill_period,
        })
    }
}

#[derive(Debug)]
struct TokenBucketState {
    tokens: u64,
    last_refill_ms: u64,
}

/// Refillable token allowance.
///
/// # Example
/// ```
/// use keyed_throttle::TokenBucketConfig;
/// use keyed_throttle::TokenBucket;
/// use std::time::Duration;
///
/// let config = TokenBucketConfig::new(5, 5, Duration::from_secs(1)).unwrap();
/// let bucket = TokenBucket::new(&config, 0);
///
/// // Starts full: five consumes succeed, the sixth is denied.
/// for _ in 0..5 {
///     assert!(bucket.consume(0));
/// }
/// assert!(!bucket.consume(0));
///
/// // One second later the bucket has refilled.
/// assert!(bucket.consume(1_000));
/// ```
#[derive(Debug)]
pub struct TokenBucket {
    capacity: u64,
    tokens_per_period: u64,
    period_ms: u64,
    state: RwLock<TokenBucketState>,
}

impl TokenBucket {
    /// Create a bucket at full capacity, anchored at `now_ms`.
    pub fn new(config: &TokenBucketConfig, now_ms: u64) -> Self {
        Self {
            capacity: config.capacity,
            tokens_per_period: config.tokens_per_period,
            period_ms: config.refill_period.as_millis() as u64,
            state: RwLock::new(TokenBucketState {
                tokens: config.capacity,
                last_refill_ms: now_ms,
            }),
        }
    }

    /// Add tokens for every whole refill period elapsed since the last
    /// refill. Idempotent within the same period.
    fn refill(&self, state: &mut TokenBucketState, now_ms: u64) {
        let elapsed = now_ms.saturating_sub(state.last_refill_ms);
        let periods = elapsed / self.period_ms;
        if periods > 0 {
            let added = periods.saturating_mul(self.tokens_per_period);
            state.tokens = state.tokens.saturating_add(added).min(self.capacity);
            // Advance by whole periods only; the remainder stays
            // accounted against the next call.
            state.last_refill_ms += periods * self.period_ms;
        }
    }

    /// Consume one token, refilling first. Returns whether a token was
    /// available.
    pub fn consume(&self, now_ms: u64) -> bool {
        let mut state = self
            .state
            .write()
            .expect("token bucket lock poisoned - a thread panicked while holding the lock");
        self.refill(&mut state, now_ms);
        if state.tokens > 0 {
            state.tokens -= 1;
            true
        } else {
            false
        }
    }

    /// Current token count after refill.
    pub fn tokens(&self, now_ms: u64) -> u64 {
        let mut state = self
            .state
            .write()
            .expect("token bucket lock poisoned - a thread panicked while holding the lock");
        self.refill(&mut state, now_ms);
        state.tokens
    }

    /// Manually add tokens, capped at capacity.
    pub fn add_tokens(&self, now_ms: u64, n: u64) {
        let mut state = self
            .state
            .write()
            .expect("token bucket lock poisoned - a thread panicked while holding the lock");
        self.refill(&mut state, now_ms);
        state.tokens = state.tokens.saturating_add(n).min(self.capacity);
    }

    /// Maximum tokens the bucket can hold.
    pub fn capacity(&self) -> u64 {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket(capacity: u64, tokens_per_period: u64, period_ms: u64) -> TokenBucket {
        let config = TokenBucketConfig::new(
            capacity,
            tokens_per_period,
            Duration::from_millis(period_ms),
        )
        .unwrap();
        TokenBucket::new(&config, 0)
    }

    #[test]
    fn test_starts_full_and_denies_when_empty() {
        let bucket = bucket(5, 5, 1_000);

        for _ in 0..5 {
            assert!(bucket.consume(0));
        }
        assert!(!bucket.consume(0));
        assert_eq!(bucket.tokens(0), 0);
    }

    #[test]
    fn test_refill_after_one_period() {
        let bucket = bucket(5, 5, 1_000);

        for _ in 0..5 {
            assert!(bucket.consume(0));
        }
        assert!(!bucket.consume(500));

        // Full period elapsed: refilled to 5, one consumed leaves 4.
        assert!(bucket.consume(1_000));
        assert_eq!(bucket.tokens(1_000), 4);
    }

    #[test]
    fn test_refill_is_idempotent() {
        let bucket = bucket(10, 2, 100);

        for _ in 0..10 {
            assert!(bucket.consume(0));
        }

        assert_eq!(bucket.tokens(250), 4);
        // Second observation at the same instant changes nothing: the
        // 50ms remainder is preserved, not re-counted.
        assert_eq!(bucket.tokens(250), 4);
        // The remainder completes a period at 300.
        assert_eq!(bucket.tokens(300), 6);
    }

    #[test]
    fn test_refill_capped_at_capacity() {
        let bucket = bucket(5, 5, 1_000);

        assert!(bucket.consume(0));
        assert_eq!(bucket.tokens(60_000), 5);
    }

    #[test]
    fn test_add_tokens_capped() {
        let bucket = bucket(10, 1, 1_000);

        for _ in 0..6 {
            assert!(bucket.consume(0));
        }
        bucket.add_tokens(0, 3);
        assert_eq!(bucket.tokens(0), 7);

        bucket.add_tokens(0, 100);
        assert_eq!(bucket.tokens(0), 10);
    }

    #[test]
    fn test_partial_period_does_not_refill() {
        let bucket = bucket(2, 1, 1_000);

        assert!(bucket.consume(0));
        assert!(bucket.consume(0));
        assert!(!bucket.consume(999));
        assert!(bucket.consume(1_000));
    }

    #[test]
    fn test_zero_period_rejected() {
        let result = TokenBucketConfig::new(10, 1, Duration::from_secs(0));
        assert_eq!(result.unwrap_err(), ConfigError::ZeroPeriod);
    }

    #[test]
    fn test_zero_capacity_always_denies() {
        let bucket = bucket(0, 1, 1_000);
        assert!(!bucket.consume(0));
        assert!(!bucket.consume(10_000));
    }
}

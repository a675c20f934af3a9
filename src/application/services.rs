//! Per-algorithm admission services over a keyed registry.
//!
//! Each service wraps a [`KeyedRegistry`] of one algorithm's bucket
//! type and exposes the in-process call surface: `admit(key)` plus the
//! algorithm's auxiliary operations. The capability impls wiring the
//! domain algorithms into the registry live next to their services.

use std::sync::Arc;

use crate::application::error::LimiterError;
use crate::application::metrics::Metrics;
use crate::application::ports::Clock;
use crate::application::registry::{KeyedBucket, KeyedRegistry};
use crate::domain::adaptive::{AdaptiveBucket, AdaptiveConfig};
use crate::domain::ema::{EmaBucket, EmaConfig};
use crate::domain::fixed_window::{FixedWindowConfig, FixedWindowCounter};
use crate::domain::leaky_bucket::{LeakyBucket, LeakyBucketConfig};
use crate::domain::quota::{Quota, QuotaConfig};
use crate::domain::sliding_window_counter::{SlidingWindowCounter, SlidingWindowCounterConfig};
use crate::domain::sliding_window_log::{SlidingWindowLog, SlidingWindowLogConfig};
use crate::domain::token_bucket::{TokenBucket, TokenBucketConfig};

impl KeyedBucket for TokenBucket {
    type Config = TokenBucketConfig;

    fn create(config: &Self::Config, now_ms: u64) -> Self {
        TokenBucket::new(config, now_ms)
    }

    fn admit(&self, now_ms: u64) -> bool {
        self.consume(now_ms)
    }
}

/// Per-key token bucket admission.
#[derive(Debug)]
pub struct TokenBucketLimiter {
    registry: KeyedRegistry<TokenBucket>,
}

impl TokenBucketLimiter {
    /// Create a limiter; each key gets its own bucket on first access.
    pub fn new(config: TokenBucketConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            registry: KeyedRegistry::new(config, clock),
        }
    }

    /// Decide one admission for `key`.
    pub fn admit(&self, key: &str) -> Result<bool, LimiterError> {
        self.registry.admit(key)
    }

    /// Tokens currently available to `key`, creating its bucket if
    /// this is the first contact.
    pub fn tokens(&self, key: &str) -> Result<u64, LimiterError> {
        let bucket = self.registry.get_or_create(key)?;
        Ok(bucket.tokens(self.registry.clock().now_millis()))
    }

    /// Admission metrics across all keys.
    pub fn metrics(&self) -> &Metrics {
        self.registry.metrics()
    }

    /// Number of keys with live state.
    pub fn tracked_keys(&self) -> usize {
        self.registry.len()
    }
}

impl KeyedBucket for LeakyBucket {
    type Config = LeakyBucketConfig;

    fn create(config: &Self::Config, now_ms: u64) -> Self {
        LeakyBucket::new(config, now_ms)
    }

    fn admit(&self, now_ms: u64) -> bool {
        self.admit(now_ms)
    }
}

/// Per-key leaky bucket admission.
#[derive(Debug)]
pub struct LeakyBucketLimiter {
    registry: KeyedRegistry<LeakyBucket>,
}

impl LeakyBucketLimiter {
    /// Create a limiter; each key gets its own bucket on first access.
    pub fn new(config: LeakyBucketConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            registry: KeyedRegistry::new(config, clock),
        }
    }

    /// Decide one admission for `key`.
    pub fn admit(&self, key: &str) -> Result<bool, LimiterError> {
        self.registry.admit(key)
    }

    /// Water level for `key` after draining, creating its bucket if
    /// this is the first contact (a fresh key reports zero).
    pub fn level(&self, key: &str) -> Result<u64, LimiterError> {
        let bucket = self.registry.get_or_create(key)?;
        Ok(bucket.level(self.registry.clock().now_millis()))
    }

    /// Admission metrics across all keys.
    pub fn metrics(&self) -> &Metrics {
        self.registry.metrics()
    }

    /// Number of keys with live state.
    pub fn tracked_keys(&self) -> usize {
        self.registry.len()
    }
}

impl KeyedBucket for FixedWindowCounter {
    type Config = FixedWindowConfig;

    fn create(config: &Self::Config, now_ms: u64) -> Self {
        FixedWindowCounter::new(config, now_ms)
    }

    fn admit(&self, now_ms: u64) -> bool {
        self.admit(now_ms)
    }

    fn reconfigure(&self, config: &Self::Config) {
        self.reconfigure(config);
    }
}

/// Per-key fixed window admission.
#[derive(Debug)]
pub struct FixedWindowLimiter {
    registry: KeyedRegistry<FixedWindowCounter>,
}

impl FixedWindowLimiter {
    /// Create a limiter; each key's window starts at its first access.
    pub fn new(config: FixedWindowConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            registry: KeyedRegistry::new(config, clock),
        }
    }

    /// Decide one admission for `key`.
    pub fn admit(&self, key: &str) -> Result<bool, LimiterError> {
        self.registry.admit(key)
    }

    /// Apply a new capacity and window to existing and future keys.
    pub fn update_configuration(&self, config: FixedWindowConfig) {
        self.registry.update_configuration(config);
    }

    /// Admission metrics across all keys.
    pub fn metrics(&self) -> &Metrics {
        self.registry.metrics()
    }

    /// Number of keys with live state.
    pub fn tracked_keys(&self) -> usize {
        self.registry.len()
    }
}

impl KeyedBucket for SlidingWindowLog {
    type Config = SlidingWindowLogConfig;

    fn create(config: &Self::Config, _now_ms: u64) -> Self {
        SlidingWindowLog::new(config)
    }

    fn admit(&self, now_ms: u64) -> bool {
        self.admit(now_ms)
    }
}

/// Per-key sliding window log admission.
#[derive(Debug)]
pub struct SlidingWindowLogLimiter {
    registry: KeyedRegistry<SlidingWindowLog>,
}

impl SlidingWindowLogLimiter {
    /// Create a limiter; each key gets its own log on first access.
    pub fn new(config: SlidingWindowLogConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            registry: KeyedRegistry::new(config, clock),
        }
    }

    /// Decide one admission for `key`.
    pub fn admit(&self, key: &str) -> Result<bool, LimiterError> {
        self.registry.admit(key)
    }

    /// Admissions still inside `key`'s window, creating its log if
    /// this is the first contact (a fresh key reports zero).
    pub fn size(&self, key: &str) -> Result<u64, LimiterError> {
        let bucket = self.registry.get_or_create(key)?;
        Ok(bucket.len(self.registry.clock().now_millis()))
    }

    /// Admission metrics across all keys.
    pub fn metrics(&self) -> &Metrics {
        self.registry.metrics()
    }

    /// Number of keys with live state.
    pub fn tracked_keys(&self) -> usize {
        self.registry.len()
    }
}

impl KeyedBucket for SlidingWindowCounter {
    type Config = SlidingWindowCounterConfig;

    fn create(config: &Self::Config, now_ms: u64) -> Self {
        SlidingWindowCounter::new(config, now_ms)
    }

    fn admit(&self, now_ms: u64) -> bool {
        self.admit(now_ms)
    }
}

/// Per-key sliding window counter admission.
#[derive(Debug)]
pub struct SlidingWindowCounterLimiter {
    registry: KeyedRegistry<SlidingWindowCounter>,
}

impl SlidingWindowCounterLimiter {
    /// Create a limiter; each key gets its own counter on first access.
    pub fn new(config: SlidingWindowCounterConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            registry: KeyedRegistry::new(config, clock),
        }
    }

    /// Decide one admission for `key`.
    pub fn admit(&self, key: &str) -> Result<bool, LimiterError> {
        self.registry.admit(key)
    }

    /// Admission metrics across all keys.
    pub fn metrics(&self) -> &Metrics {
        self.registry.metrics()
    }

    /// Number of keys with live state.
    pub fn tracked_keys(&self) -> usize {
        self.registry.len()
    }
}

impl KeyedBucket for EmaBucket {
    type Config = EmaConfig;

    fn create(config: &Self::Config, now_ms: u64) -> Self {
        EmaBucket::new(config, now_ms)
    }

    fn admit(&self, now_ms: u64) -> bool {
        self.admit(now_ms)
    }

    fn reconfigure(&self, config: &Self::Config) {
        self.reconfigure(config);
    }
}

/// Per-key EMA admission.
#[derive(Debug)]
pub struct EmaLimiter {
    registry: KeyedRegistry<EmaBucket>,
}

impl EmaLimiter {
    /// Create a limiter; each key gets its own average on first access.
    pub fn new(config: EmaConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            registry: KeyedRegistry::new(config, clock),
        }
    }

    /// Decide one admission for `key`.
    pub fn admit(&self, key: &str) -> Result<bool, LimiterError> {
        self.registry.admit(key)
    }

    /// Apply a new capacity and averaging period to existing and
    /// future keys. Existing instances swap their config snapshot
    /// atomically; in-flight calls finish on the snapshot they read.
    pub fn update_configuration(&self, config: EmaConfig) {
        self.registry.update_configuration(config);
    }

    /// Admission metrics across all keys.
    pub fn metrics(&self) -> &Metrics {
        self.registry.metrics()
    }

    /// Number of keys with live state.
    pub fn tracked_keys(&self) -> usize {
        self.registry.len()
    }
}

impl KeyedBucket for AdaptiveBucket {
    type Config = AdaptiveConfig;

    fn create(config: &Self::Config, _now_ms: u64) -> Self {
        AdaptiveBucket::new(config)
    }

    fn admit(&self, _now_ms: u64) -> bool {
        self.consume()
    }
}

/// Per-key adaptive counter admission.
#[derive(Debug)]
pub struct AdaptiveLimiter {
    registry: KeyedRegistry<AdaptiveBucket>,
}

impl AdaptiveLimiter {
    /// Create a limiter; each key starts at the configured limit.
    pub fn new(config: AdaptiveConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            registry: KeyedRegistry::new(config, clock),
        }
    }

    /// Decide one admission for `key`.
    pub fn admit(&self, key: &str) -> Result<bool, LimiterError> {
        self.registry.admit(key)
    }

    /// Replace the limit for `key`'s existing bucket.
    ///
    /// # Errors
    /// [`LimiterError::UnknownKey`] if the key has no bucket yet; one
    /// is never created by this call.
    pub fn adjust_limit(&self, key: &str, new_limit: u64) -> Result<(), LimiterError> {
        self.existing(key)?.adjust_limit(new_limit);
        Ok(())
    }

    /// Zero the count for `key`'s existing bucket.
    ///
    /// # Errors
    /// [`LimiterError::UnknownKey`] if the key has no bucket yet; one
    /// is never created by this call.
    pub fn reset(&self, key: &str) -> Result<(), LimiterError> {
        self.existing(key)?.reset();
        Ok(())
    }

    /// Admission metrics across all keys.
    pub fn metrics(&self) -> &Metrics {
        self.registry.metrics()
    }

    /// Number of keys with live state.
    pub fn tracked_keys(&self) -> usize {
        self.registry.len()
    }

    fn existing(&self, key: &str) -> Result<Arc<AdaptiveBucket>, LimiterError> {
        if key.is_empty() {
            return Err(LimiterError::InvalidKey);
        }
        self.registry
            .get(key)
            .ok_or_else(|| LimiterError::UnknownKey(key.to_string()))
    }
}

impl KeyedBucket for Quota {
    type Config = QuotaConfig;

    fn create(config: &Self::Config, now_ms: u64) -> Self {
        Quota::new(config, now_ms)
    }

    fn admit(&self, now_ms: u64) -> bool {
        self.consume(now_ms, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::mocks::MockClock;
    use std::time::Duration;

    fn clock() -> (MockClock, Arc<dyn Clock>) {
        let mock = MockClock::new(0);
        let shared: Arc<dyn Clock> = Arc::new(mock.clone());
        (mock, shared)
    }

    #[test]
    fn test_token_bucket_limiter_scenario() {
        let (mock, shared) = clock();
        let config = TokenBucketConfig::new(5, 5, Duration::from_secs(1)).unwrap();
        let limiter = TokenBucketLimiter::new(config, shared);

        for _ in 0..5 {
            assert!(limiter.admit("user-1").unwrap());
        }
        assert!(!limiter.admit("user-1").unwrap());

        mock.advance(Duration::from_secs(1));
        assert!(limiter.admit("user-1").unwrap());
        assert_eq!(limiter.tokens("user-1").unwrap(), 4);
    }

    #[test]
    fn test_leaky_bucket_limiter_level() {
        let (mock, shared) = clock();
        let config = LeakyBucketConfig::new(3, 1.0, Duration::from_secs(1)).unwrap();
        let limiter = LeakyBucketLimiter::new(config, shared);

        assert_eq!(limiter.level("user-1").unwrap(), 0);
        assert!(limiter.admit("user-1").unwrap());
        assert!(limiter.admit("user-1").unwrap());
        assert_eq!(limiter.level("user-1").unwrap(), 2);

        mock.advance(Duration::from_secs(1));
        assert_eq!(limiter.level("user-1").unwrap(), 1);
    }

    #[test]
    fn test_fixed_window_limiter_update_configuration() {
        let (_mock, shared) = clock();
        let config = FixedWindowConfig::new(1, Duration::from_secs(1)).unwrap();
        let limiter = FixedWindowLimiter::new(config, shared);

        assert!(limiter.admit("user-1").unwrap());
        assert!(!limiter.admit("user-1").unwrap());

        let raised = FixedWindowConfig::new(3, Duration::from_secs(1)).unwrap();
        limiter.update_configuration(raised);

        // The existing instance was updated in place.
        assert!(limiter.admit("user-1").unwrap());
        assert!(limiter.admit("user-1").unwrap());
        assert!(!limiter.admit("user-1").unwrap());

        // A new key starts under the new config too.
        assert!(limiter.admit("user-2").unwrap());
        assert!(limiter.admit("user-2").unwrap());
        assert!(limiter.admit("user-2").unwrap());
        assert!(!limiter.admit("user-2").unwrap());
    }

    #[test]
    fn test_sliding_window_log_limiter_size() {
        let (mock, shared) = clock();
        let config = SlidingWindowLogConfig::new(2, Duration::from_secs(1)).unwrap();
        let limiter = SlidingWindowLogLimiter::new(config, shared);

        assert!(limiter.admit("user-1").unwrap());
        assert!(limiter.admit("user-1").unwrap());
        assert!(!limiter.admit("user-1").unwrap());
        assert_eq!(limiter.size("user-1").unwrap(), 2);

        mock.advance(Duration::from_millis(1_001));
        assert_eq!(limiter.size("user-1").unwrap(), 0);
    }

    #[test]
    fn test_sliding_window_counter_limiter_decays() {
        let (mock, shared) = clock();
        let config = SlidingWindowCounterConfig::new(2, Duration::from_secs(1)).unwrap();
        let limiter = SlidingWindowCounterLimiter::new(config, shared);

        assert!(limiter.admit("user-1").unwrap());
        assert!(limiter.admit("user-1").unwrap());
        assert!(!limiter.admit("user-1").unwrap());

        // One elapsed window frees exactly one slot.
        mock.advance(Duration::from_secs(1));
        assert!(limiter.admit("user-1").unwrap());
        assert!(!limiter.admit("user-1").unwrap());
    }

    #[test]
    fn test_ema_limiter_update_configuration() {
        let (mock, shared) = clock();
        let config = EmaConfig::new(100, Duration::from_millis(1)).unwrap();
        let limiter = EmaLimiter::new(config, shared);

        assert!(limiter.admit("user-1").unwrap());
        mock.advance(Duration::from_secs(10));
        assert!(!limiter.admit("user-1").unwrap());

        let relaxed = EmaConfig::new(60_000, Duration::from_millis(1)).unwrap();
        limiter.update_configuration(relaxed);
        mock.advance(Duration::from_millis(1));
        assert!(limiter.admit("user-1").unwrap());
    }

    #[test]
    fn test_adaptive_limiter_adjust_and_reset() {
        let (_mock, shared) = clock();
        let limiter = AdaptiveLimiter::new(AdaptiveConfig::new(2), shared);

        assert!(limiter.admit("user-1").unwrap());
        assert!(limiter.admit("user-1").unwrap());
        assert!(!limiter.admit("user-1").unwrap());

        limiter.adjust_limit("user-1", 4).unwrap();
        assert!(limiter.admit("user-1").unwrap());

        limiter.reset("user-1").unwrap();
        assert!(limiter.admit("user-1").unwrap());
    }

    #[test]
    fn test_adaptive_limiter_unknown_key() {
        let (_mock, shared) = clock();
        let limiter = AdaptiveLimiter::new(AdaptiveConfig::new(2), shared);

        assert_eq!(
            limiter.adjust_limit("ghost", 5),
            Err(LimiterError::UnknownKey("ghost".to_string()))
        );
        assert_eq!(
            limiter.reset("ghost"),
            Err(LimiterError::UnknownKey("ghost".to_string()))
        );
        // The failed calls must not have created state.
        assert_eq!(limiter.tracked_keys(), 0);
    }

    #[test]
    fn test_empty_key_rejected_across_services() {
        let (_mock, shared) = clock();
        let limiter = AdaptiveLimiter::new(AdaptiveConfig::new(2), shared);

        assert_eq!(limiter.admit(""), Err(LimiterError::InvalidKey));
        assert_eq!(limiter.adjust_limit("", 1), Err(LimiterError::InvalidKey));
        assert_eq!(limiter.reset(""), Err(LimiterError::InvalidKey));
    }
}

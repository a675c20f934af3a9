//! Composite limiters: two algorithms behind one admission decision.
//!
//! Two fixed compositions ship with the crate: a circuit breaker in
//! front of a burst pool, and a quota cap layered over per-key token
//! buckets. Evaluation order and short-circuit behavior are part of
//! each composition's contract.

use std::sync::Arc;

use crate::application::error::LimiterError;
use crate::application::metrics::Metrics;
use crate::application::ports::Clock;
use crate::application::registry::KeyedRegistry;
use crate::application::replenisher::{self, ReplenisherHandle};
use crate::domain::burst::{BurstBucket, BurstConfig};
use crate::domain::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
use crate::domain::quota::{Quota, QuotaConfig};
use crate::domain::token_bucket::{TokenBucket, TokenBucketConfig};

/// Burst admission against a single shared token pool.
///
/// The pool is process-wide: keys are identity-checked but all callers
/// draw from the same tokens. Construction spawns the pool's
/// replenisher, so it must happen inside a tokio runtime; call
/// [`shutdown`](BurstLimiter::shutdown) (or drop the limiter) to stop
/// the background task.
#[derive(Debug)]
pub struct BurstLimiter {
    bucket: Arc<BurstBucket>,
    replenisher: ReplenisherHandle,
    metrics: Metrics,
}

impl BurstLimiter {
    /// Create the pool at full capacity and start its replenisher.
    pub fn new(config: BurstConfig) -> Self {
        let bucket = Arc::new(BurstBucket::new(&config));
        let replenisher = replenisher::spawn(Arc::clone(&bucket), config.tick);
        Self {
            bucket,
            replenisher,
            metrics: Metrics::new(),
        }
    }

    /// Decide one admission for `key` against the shared pool.
    pub fn admit(&self, key: &str) -> Result<bool, LimiterError> {
        if key.is_empty() {
            return Err(LimiterError::InvalidKey);
        }
        let allowed = self.bucket.consume();
        self.metrics.record(allowed);
        Ok(allowed)
    }

    /// Tokens currently in the pool.
    pub fn tokens(&self) -> u64 {
        self.bucket.tokens()
    }

    /// Seconds a denied caller should wait before retrying.
    pub fn retry_after_secs(&self) -> u64 {
        self.bucket.retry_after_secs()
    }

    /// Stop the replenisher. The pool keeps its current tokens and
    /// further admissions drain it to zero.
    pub fn shutdown(&self) {
        self.replenisher.stop();
    }

    /// Admission metrics for the pool.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}

/// Circuit breaker in front of a burst pool.
///
/// The breaker is consulted first: while it denies, the pool is left
/// untouched and no failure is recorded. When the breaker admits, the
/// pool's verdict decides the call and feeds back into the breaker as
/// a success or failure.
#[derive(Debug)]
pub struct BreakerLimiter {
    breaker: CircuitBreaker,
    bucket: Arc<BurstBucket>,
    replenisher: ReplenisherHandle,
    clock: Arc<dyn Clock>,
    metrics: Metrics,
}

impl BreakerLimiter {
    /// Create the composition and start the pool's replenisher. Must
    /// be called inside a tokio runtime.
    pub fn new(
        burst_config: BurstConfig,
        breaker_config: CircuitBreakerConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let bucket = Arc::new(BurstBucket::new(&burst_config));
        let replenisher = replenisher::spawn(Arc::clone(&bucket), burst_config.tick);
        Self {
            breaker: CircuitBreaker::new(&breaker_config),
            bucket,
            replenisher,
            clock,
            metrics: Metrics::new(),
        }
    }

    /// Decide one admission for `key`.
    pub fn admit(&self, key: &str) -> Result<bool, LimiterError> {
        if key.is_empty() {
            return Err(LimiterError::InvalidKey);
        }
        let now_ms = self.clock.now_millis();
        if !self.breaker.is_call_allowed(now_ms) {
            self.metrics.record_denied();
            return Ok(false);
        }
        let allowed = self.bucket.consume();
        if allowed {
            self.breaker.record_success();
        } else {
            self.breaker.record_failure(now_ms);
        }
        self.metrics.record(allowed);
        Ok(allowed)
    }

    /// Current breaker state.
    pub fn breaker_state(&self) -> CircuitState {
        self.breaker.state()
    }

    /// Tokens currently in the pool.
    pub fn tokens(&self) -> u64 {
        self.bucket.tokens()
    }

    /// Seconds a denied caller should wait before retrying.
    pub fn retry_after_secs(&self) -> u64 {
        self.bucket.retry_after_secs()
    }

    /// Stop the pool's replenisher.
    pub fn shutdown(&self) {
        self.replenisher.stop();
    }

    /// Admission metrics for the composition.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}

/// Quota cap layered over per-key token buckets.
///
/// Both checks must pass for admission. The quota capacity check runs
/// first, then the token consumption, and the quota usage commits only
/// when both succeeded; a quota pass with a token denial leaves the
/// quota untouched.
#[derive(Debug)]
pub struct QuotaTokenBucketLimiter {
    buckets: KeyedRegistry<TokenBucket>,
    quotas: KeyedRegistry<Quota>,
    metrics: Metrics,
}

impl QuotaTokenBucketLimiter {
    /// Create a limiter; each key gets its own bucket and quota on
    /// first access, sharing one clock.
    pub fn new(
        bucket_config: TokenBucketConfig,
        quota_config: QuotaConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            buckets: KeyedRegistry::new(bucket_config, Arc::clone(&clock)),
            quotas: KeyedRegistry::new(quota_config, clock),
            metrics: Metrics::new(),
        }
    }

    /// Decide one single-unit admission for `key`.
    pub fn admit(&self, key: &str) -> Result<bool, LimiterError> {
        self.consume(key, 1)
    }

    /// Decide an `amount`-unit admission for `key`.
    pub fn consume(&self, key: &str, amount: u64) -> Result<bool, LimiterError> {
        let bucket = self.buckets.get_or_create(key)?;
        let quota = self.quotas.get_or_create(key)?;
        let now_ms = self.buckets.clock().now_millis();
        let allowed = quota.consume_if(now_ms, amount, || bucket.consume(now_ms));
        self.metrics.record(allowed);
        Ok(allowed)
    }

    /// Quota left for `key` in its current period. A key that was
    /// never admitted has no quota state and reports zero.
    pub fn remaining(&self, key: &str) -> Result<u64, LimiterError> {
        if key.is_empty() {
            return Err(LimiterError::InvalidKey);
        }
        match self.quotas.get(key) {
            Some(quota) => Ok(quota.remaining(self.quotas.clock().now_millis())),
            None => Ok(0),
        }
    }

    /// Admission metrics across all keys.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Number of keys with live state.
    pub fn tracked_keys(&self) -> usize {
        self.quotas.len()
    }
}

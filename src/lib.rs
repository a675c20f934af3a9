//! # keyed-throttle
//!
//! Per-key admission control with pluggable rate limiting algorithms.
//!
//! This crate decides, per caller-supplied key (a user or tenant
//! identifier), whether a unit of work may proceed against a
//! time-varying budget. Every algorithm keeps its own mutable state
//! per key, answers safely under concurrent access, and reads an
//! injectable clock so time-based behavior is deterministic in tests.
//!
//! ## Quick Start
//!
//! ```rust
//! use keyed_throttle::{SystemClock, TokenBucketConfig, TokenBucketLimiter};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! // 100 tokens per key, refilling 10 per second.
//! let config = TokenBucketConfig::new(100, 10, Duration::from_secs(1)).unwrap();
//! let limiter = TokenBucketLimiter::new(config, Arc::new(SystemClock::new()));
//!
//! match limiter.admit("tenant-42") {
//!     Ok(true) => { /* proceed */ }
//!     Ok(false) => { /* denied, back off */ }
//!     Err(e) => eprintln!("bad request: {}", e),
//! }
//! ```
//!
//! ## Available Algorithms
//!
//! Per-key services, each wrapping one bucket instance per key:
//!
//! - [`TokenBucketLimiter`]: burst up to capacity, sustained refill rate
//! - [`LeakyBucketLimiter`]: backlog draining at a constant rate
//! - [`FixedWindowLimiter`]: counter reset on a per-key window cadence
//! - [`SlidingWindowLogLimiter`]: exact sliding window over timestamps
//! - [`SlidingWindowCounterLimiter`]: approximate decaying counter
//! - [`EmaLimiter`]: smoothed inter-arrival gap threshold
//! - [`AdaptiveLimiter`]: plain counter with a per-key adjustable limit
//!
//! Composite services:
//!
//! - [`BurstLimiter`]: shared token pool replenished by a background task
//! - [`BreakerLimiter`]: circuit breaker in front of a burst pool
//! - [`QuotaTokenBucketLimiter`]: long-period quota over per-key token buckets
//!
//! ## Algorithm Selection Guide
//!
//! - **Allow controlled bursts**: [`TokenBucketLimiter`]
//! - **Smooth, constant outflow**: [`LeakyBucketLimiter`]
//! - **Simplest bookkeeping**: [`FixedWindowLimiter`]
//! - **Exact window, memory per request**: [`SlidingWindowLogLimiter`]
//! - **Cheap sliding approximation**: [`SlidingWindowCounterLimiter`]
//! - **Limits driven at runtime**: [`AdaptiveLimiter`]
//! - **Protect a flaky downstream**: [`BreakerLimiter`]
//! - **Monthly-style caps over a rate**: [`QuotaTokenBucketLimiter`]
//!
//! ## Keys and Errors
//!
//! A key scopes all state: the first admission check for a key creates
//! its bucket, and every concurrent caller shares that one instance.
//! Denial is a normal result (`Ok(false)`), never an error. Only two
//! things fail: an empty key ([`LimiterError::InvalidKey`], raised
//! before any state is touched) and adjust/reset operations against a
//! key that has no state yet ([`LimiterError::UnknownKey`]).
//!
//! ## Concurrency
//!
//! Operations on the same key are linearized by that key's lock; the
//! critical sections are short read-modify-write sequences with no
//! I/O. Operations on different keys proceed fully in parallel. The
//! registry's get-or-create is atomic per key, so racing first
//! accesses construct exactly one bucket.
//!
//! The burst pool is the exception to lazy time arithmetic: its tokens
//! only increase when its background replenisher fires. The
//! replenisher is owned by the limiter that spawned it and stops on
//! [`BurstLimiter::shutdown`] (or drop); it needs a tokio runtime.
//!
//! ## Deterministic Tests
//!
//! Every service takes an `Arc<dyn Clock>`. Production code uses
//! [`SystemClock`]; tests inject the `MockClock` test double (behind
//! the `test-helpers` feature) and advance time explicitly:
//!
//! ```rust
//! use keyed_throttle::infrastructure::mocks::MockClock;
//! use keyed_throttle::{TokenBucketConfig, TokenBucketLimiter};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let clock = MockClock::new(0);
//! let config = TokenBucketConfig::new(5, 5, Duration::from_secs(1)).unwrap();
//! let limiter = TokenBucketLimiter::new(config, Arc::new(clock.clone()));
//!
//! for _ in 0..5 {
//!     assert!(limiter.admit("user").unwrap());
//! }
//! assert!(!limiter.admit("user").unwrap());
//!
//! clock.advance(Duration::from_secs(1));
//! assert!(limiter.admit("user").unwrap());
//! ```

// Domain layer - pure algorithm state machines
pub mod domain;

// Application layer - registry, services, background tasks
pub mod application;

// Infrastructure layer - clock and storage adapters
pub mod infrastructure;

// Re-export commonly used types for convenience
pub use domain::{
    adaptive::{AdaptiveBucket, AdaptiveConfig},
    burst::{BurstBucket, BurstConfig},
    circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState},
    ema::{EmaBucket, EmaConfig},
    fixed_window::{FixedWindowConfig, FixedWindowCounter},
    leaky_bucket::{LeakyBucket, LeakyBucketConfig},
    quota::{Quota, QuotaConfig},
    sliding_window_counter::{SlidingWindowCounter, SlidingWindowCounterConfig},
    sliding_window_log::{SlidingWindowLog, SlidingWindowLogConfig},
    token_bucket::{TokenBucket, TokenBucketConfig},
    ConfigError,
};

pub use application::{
    composite::{BreakerLimiter, BurstLimiter, QuotaTokenBucketLimiter},
    error::LimiterError,
    metrics::{Metrics, MetricsSnapshot},
    ports::Clock,
    registry::{KeyedBucket, KeyedRegistry},
    replenisher::ReplenisherHandle,
    services::{
        AdaptiveLimiter, EmaLimiter, FixedWindowLimiter, LeakyBucketLimiter,
        SlidingWindowCounterLimiter, SlidingWindowLogLimiter, TokenBucketLimiter,
    },
};

pub use infrastructure::{clock::SystemClock, storage::ShardedMap};

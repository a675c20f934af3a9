//! Circuit breaker: a failure-driven admission state machine.
//!
//! CLOSED admits calls and counts failures; reaching the threshold
//! opens the circuit. OPEN denies calls until the reset timeout has
//! elapsed since the last failure. Recovery is a single probe: the
//! first call that observes the elapsed timeout passes through
//! HALF_OPEN and closes the circuit immediately, regardless of how
//! that call turns out.

use std::sync::RwLock;
use std::time::Duration;
use tracing::{info, warn};

/// Circuit breaker states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Circuit is closed, calls are admitted
    Closed,
    /// Circuit is open, calls are denied
    Open,
    /// Circuit is probing recovery
    HalfOpen,
}

/// Configuration for a [`CircuitBreaker`].
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Failures before the circuit opens
    pub failure_threshold: u64,
    /// Time to wait after the last failure before probing recovery
    pub reset_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    failure_count: u64,
    last_failure_ms: u64,
}

/// Failure-driven state machine gating admission.
#[derive(Debug)]
pub struct CircuitBreaker {
    failure_threshold: u64,
    reset_timeout_ms: u64,
    state: RwLock<BreakerState>,
}

impl CircuitBreaker {
    /// Create a closed breaker.
    pub fn new(config: &CircuitBreakerConfig) -> Self {
        Self {
            failure_threshold: config.failure_threshold,
            reset_timeout_ms: config.reset_timeout.as_millis() as u64,
            state: RwLock::new(BreakerState {
                state: CircuitState::Closed,
                failure_count: 0,
                last_failure_ms: 0,
            }),
        }
    }

    /// Whether a call may proceed.
    ///
    /// Classifies under the shared lock first; only a state transition
    /// takes the exclusive lock, re-validating the timeout after the
    /// upgrade since another thread may have transitioned in between.
    pub fn is_call_allowed(&self, now_ms: u64) -> bool {
        {
            let state = self
                .state
                .read()
                .expect("circuit breaker lock poisoned - a thread panicked while holding the lock");
            match state.state {
                CircuitState::Closed => return true,
                CircuitState::Open => {
                    if now_ms.saturating_sub(state.last_failure_ms) <= self.reset_timeout_ms {
                        return false;
                    }
                }
                CircuitState::HalfOpen => {}
            }
        }

        let mut state = self
            .state
            .write()
            .expect("circuit breaker lock poisoned - a thread panicked while holding the lock");
        match state.state {
            CircuitState::Closed => true,
            CircuitState::Open => {
                if now_ms.saturating_sub(state.last_failure_ms) > self.reset_timeout_ms {
                    // Single-probe recovery: this call passes through
                    // HALF_OPEN and closes the circuit, whatever its
                    // own outcome ends up being.
                    state.state = CircuitState::HalfOpen;
                    Self::close(&mut state);
                    true
                } else {
                    false
                }
            }
            CircuitState::HalfOpen => {
                Self::close(&mut state);
                true
            }
        }
    }

    /// Record a failed call. Reaching the failure threshold opens the
    /// circuit and stamps the failure time.
    pub fn record_failure(&self, now_ms: u64) {
        let mut state = self
            .state
            .write()
            .expect("circuit breaker lock poisoned - a thread panicked while holding the lock");
        state.failure_count += 1;
        if state.failure_count >= self.failure_threshold {
            if state.state != CircuitState::Open {
                warn!(failures = state.failure_count, "circuit breaker opened");
            }
            state.state = CircuitState::Open;
            state.last_failure_ms = now_ms;
        }
    }

    /// Record a successful call: closes the circuit and zeroes the
    /// failure count from any state.
    pub fn record_success(&self) {
        let mut state = self
            .state
            .write()
            .expect("circuit breaker lock poisoned - a thread panicked while holding the lock");
        state.state = CircuitState::Closed;
        state.failure_count = 0;
    }

    /// Current state.
    pub fn state(&self) -> CircuitState {
        self.state
            .read()
            .expect("circuit breaker lock poisoned - a thread panicked while holding the lock")
            .state
    }

    /// Consecutive failures recorded since the last success or close.
    pub fn failure_count(&self) -> u64 {
        self.state
            .read()
            .expect("circuit breaker lock poisoned - a thread panicked while holding the lock")
            .failure_count
    }

    fn close(state: &mut BreakerState) {
        state.state = CircuitState::Closed;
        state.failure_count = 0;
        info!("circuit breaker closed");
    }
}

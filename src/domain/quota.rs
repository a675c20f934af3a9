//! Quota: a coarse usage cap over a long period.
//!
//! Designed to sit above a short-horizon limiter: the combined check
//! runs inside [`Quota::consume_if`] so quota usage only commits when
//! the whole admission succeeds.

use std::sync::RwLock;
use std::time::Duration;

use crate::domain::ConfigError;

/// Configuration for a [`Quota`].
#[derive(Debug, Clone)]
pub struct QuotaConfig {
    /// Maximum usage per period
    pub max_quota: u64,
    /// Length of the quota period
    pub period: Duration,
}

impl QuotaConfig {
    /// Create a validated quota configuration.
    ///
    /// # Errors
    /// Returns [`ConfigError::ZeroPeriod`] if `period` is zero.
    pub fn new(max_quota: u64, period: Duration) -> Result<Self, ConfigError> {
        if period.is_zero() {
            return Err(ConfigError::ZeroPeriod);
        }
        Ok(Self { max_quota, period })
    }
}

#[derive(Debug)]
struct QuotaState {
    period_start_ms: u64,
    used: u64,
}

/// Coarse usage cap with periodic reset.
#[derive(Debug)]
pub struct Quota {
    max_quota: u64,
    period_ms: u64,
    state: RwLock<QuotaState>,
}

impl Quota {
    /// Create an unused quota whose period starts at `now_ms`.
    pub fn new(config: &QuotaConfig, now_ms: u64) -> Self {
        Self {
            max_quota: config.max_quota,
            period_ms: config.period.as_millis() as u64,
            state: RwLock::new(QuotaState {
                period_start_ms: now_ms,
                used: 0,
            }),
        }
    }

    /// Start a fresh period if the current one has fully elapsed.
    fn roll(&self, state: &mut QuotaState, now_ms: u64) {
        if now_ms.saturating_sub(state.period_start_ms) >= self.period_ms {
            state.period_start_ms = now_ms;
            state.used = 0;
        }
    }

    /// Consume `amount` of quota if it fits in the current period.
    pub fn consume(&self, now_ms: u64, amount: u64) -> bool {
        self.consume_if(now_ms, amount, || true)
    }

    /// Consume `amount` of quota only if it fits *and* `grant` agrees.
    ///
    /// The capacity check, the `grant` call, and the commit all run
    /// under this quota's exclusive lock: a passing capacity check
    /// followed by a failing grant leaves the usage untouched, and two
    /// racing callers can never jointly commit past the cap.
    pub fn consume_if(&self, now_ms: u64, amount: u64, grant: impl FnOnce() -> bool) -> bool {
        let mut state = self
            .state
            .write()
            .expect("quota lock poisoned - a thread panicked while holding the lock");
        self.roll(&mut state, now_ms);
        if state.used.saturating_add(amount) > self.max_quota {
            return false;
        }
        if !grant() {
            return false;
        }
        state.used += amount;
        true
    }

    /// Quota left in the current period. Read-only: an elapsed period
    /// reports the full quota without resetting state.
    pub fn remaining(&self, now_ms: u64) -> u64 {
        let state = self
            .state
            .read()
            .expect("quota lock poisoned - a thread panicked while holding the lock");
        if now_ms.saturating_sub(state.period_start_ms) >= self.period_ms {
            self.max_quota
        } else {
            self.max_quota - state.used
        }
    }

    /// Maximum usage per period.
    pub fn max_quota(&self) -> u64 {
        self.max_quota
    }
}

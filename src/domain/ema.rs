//! EMA limiter: a smoothed estimate of the inter-arrival gap.
//!
//! Each call folds the elapsed time since the previous call into an
//! exponential moving average and admits while that average stays at
//! or below the configured capacity (in milliseconds). The average
//! tracks the gap between requests, not request volume, so a caller
//! that slows down can raise its average past capacity and be denied.
//! That inversion is the algorithm's documented contract; it must not
//! be "corrected" to a volume-based rule.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::domain::ConfigError;

/// Configuration for an [`EmaBucket`].
///
/// The smoothing factor is derived from the averaging period:
/// `alpha = 2 / (period_ms + 1)`.
#[derive(Debug, Clone)]
pub struct EmaConfig {
    /// Admission threshold for the smoothed gap, in milliseconds
    pub capacity: u64,
    /// Period over which the average is smoothed
    pub averaging_period: Duration,
}

impl EmaConfig {
    /// Create a validated EMA configuration.
    ///
    /// # Errors
    /// Returns [`ConfigError::ZeroPeriod`] if `averaging_period` is zero.
    pub fn new(capacity: u64, averaging_period: Duration) -> Result<Self, ConfigError> {
        if averaging_period.is_zero() {
            return Err(ConfigError::ZeroPeriod);
        }
        Ok(Self {
            capacity,
            averaging_period,
        })
    }

    /// Smoothing factor derived from the averaging period.
    pub fn alpha(&self) -> f64 {
        2.0 / (self.averaging_period.as_millis() as f64 + 1.0)
    }
}

#[derive(Debug)]
struct EmaState {
    average: f64,
    last_request_ms: u64,
}

/// Smoothed inter-arrival gap limiter.
///
/// The configuration is held as an atomically swappable snapshot and
/// read once at the start of each operation, so a concurrent update
/// never exposes a half-applied configuration to an in-flight call.
#[derive(Debug)]
pub struct EmaBucket {
    config: RwLock<Arc<EmaConfig>>,
    state: RwLock<EmaState>,
}

impl EmaBucket {
    /// Create a bucket with a zero average anchored at `now_ms`.
    pub fn new(config: &EmaConfig, now_ms: u64) -> Self {
        Self {
            config: RwLock::new(Arc::new(config.clone())),
            state: RwLock::new(EmaState {
                average: 0.0,
                last_request_ms: now_ms,
            }),
        }
    }

    /// Fold the elapsed gap into the average and admit while the
    /// average stays within capacity.
    pub fn admit(&self, now_ms: u64) -> bool {
        let config = self.config_snapshot();
        let mut state = self
            .state
            .write()
            .expect("ema bucket lock poisoned - a thread panicked while holding the lock");
        let elapsed = now_ms.saturating_sub(state.last_request_ms) as f64;
        state.average += config.alpha() * (elapsed - state.average);
        state.last_request_ms = now_ms;
        state.average <= config.capacity as f64
    }

    /// Current smoothed inter-arrival average in milliseconds.
    pub fn average(&self) -> f64 {
        self.state
            .read()
            .expect("ema bucket lock poisoned - a thread panicked while holding the lock")
            .average
    }

    /// Swap in a new configuration snapshot. In-flight operations keep
    /// the snapshot they read at entry.
    pub fn reconfigure(&self, config: &EmaConfig) {
        let mut snapshot = self
            .config
            .write()
            .expect("ema config lock poisoned - a thread panicked while holding the lock");
        *snapshot = Arc::new(config.clone());
    }

    fn config_snapshot(&self) -> Arc<EmaConfig> {
        self.config
            .read()
            .expect("ema config lock poisoned - a thread panicked while holding the lock")
            .clone()
    }
}

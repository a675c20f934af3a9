//! Fixed window counter: a request count reset on a per-key cadence.
//!
//! Windows are not aligned to any global clock grid. A counter's first
//! window starts wherever its key was first seen and re-anchors at the
//! current time whenever the window times out.

use std::sync::RwLock;
use std::time::Duration;

use crate::domain::ConfigError;

/// Configuration for a [`FixedWindowCounter`].
#[derive(Debug, Clone)]
pub struct FixedWindowConfig {
    /// Maximum requests allowed within one window
    pub capacity: u64,
    /// Length of the window
    pub window: Duration,
}

impl FixedWindowConfig {
    /// Create a validated fixed window configuration.
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
struct FixedWindowState {
    capacity: u64,
    window_ms: u64,
    window_start_ms: u64,
    count: u64,
}

/// Request counter over an unaligned fixed window.
///
/// Capacity and window length live inside the locked state so a
/// configuration update can mutate existing instances in place.
#[derive(Debug)]
pub struct FixedWindowCounter {
    state: RwLock<FixedWindowState>,
}

impl FixedWindowCounter {
    /// Create a counter whose first window starts at `now_ms`.
    pub fn new(config: &FixedWindowConfig, now_ms: u64) -> Self {
        Self {
            state: RwLock::new(FixedWindowState {
                capacity: config.capacity,
                window_ms: config.window.as_millis() as u64,
                window_start_ms: now_ms,
                count: 0,
            }),
        }
    }

    /// Re-anchor the window if it has timed out. The comparison is
    /// strictly greater-than: a request landing exactly on the window
    /// boundary still belongs to the old window.
    fn roll(state: &mut FixedWindowState, now_ms: u64) {
        if now_ms.saturating_sub(state.window_start_ms) > state.window_ms {
            state.window_start_ms = now_ms;
            state.count = 0;
        }
    }

    /// Admit one request if the current window has room.
    pub fn admit(&self, now_ms: u64) -> bool {
        let mut state = self
            .state
            .write()
            .expect("fixed window lock poisoned - a thread panicked while holding the lock");
        Self::roll(&mut state, now_ms);
        if state.count < state.capacity {
            state.count += 1;
            true
        } else {
            false
        }
    }

    /// Request count in the current window.
    pub fn count(&self, now_ms: u64) -> u64 {
        let mut state = self
            .state
            .write()
            .expect("fixed window lock poisoned - a thread panicked while holding the lock");
        Self::roll(&mut state, now_ms);
        state.count
    }

    /// Replace capacity and window length in place. The in-flight
    /// count is not clamped; a lowered capacity denies requests until
    /// the window next resets.
    pub fn reconfigure(&self, config: &FixedWindowConfig) {
        let mut state = self
            .state
            .write()
            .expect("fixed window lock poisoned - a thread panicked while holding the lock");
        state.capacity = config.capacity;
        state.window_ms = config.window.as_millis() as u64;
    }
}

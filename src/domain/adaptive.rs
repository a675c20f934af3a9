//! Adaptive bucket: a plain counter against a mutable limit.
//!
//! The only time-free algorithm in the family. Lowering the limit does
//! not clamp an already-high count; the count may transiently exceed
//! the limit until the next mutating call that clamps (`add`/`set`).

use std::sync::RwLock;

/// Configuration for an [`AdaptiveBucket`].
#[derive(Debug, Clone)]
pub struct AdaptiveConfig {
    /// Initial admission limit
    pub initial_limit: u64,
}

impl AdaptiveConfig {
    /// Create an adaptive bucket configuration.
    pub fn new(initial_limit: u64) -> Self {
        Self { initial_limit }
    }
}

#[derive(Debug)]
struct AdaptiveState {
    limit: u64,
    count: u64,
}

/// Counter with an adjustable limit.
#[derive(Debug)]
pub struct AdaptiveBucket {
    state: RwLock<AdaptiveState>,
}

impl AdaptiveBucket {
    /// Create an empty bucket with the configured limit.
    pub fn new(config: &AdaptiveConfig) -> Self {
        Self {
            state: RwLock::new(AdaptiveState {
                limit: config.initial_limit,
                count: 0,
            }),
        }
    }

    /// Consume one slot if the count is below the limit.
    pub fn consume(&self) -> bool {
        let mut state = self
            .state
            .write()
            .expect("adaptive bucket lock poisoned - a thread panicked while holding the lock");
        if state.count < state.limit {
            state.count += 1;
            true
        } else {
            false
        }
    }

    /// Replace the limit. The current count is left as-is, so it may
    /// exceed a lowered limit until a clamping call runs.
    pub fn adjust_limit(&self, new_limit: u64) {
        let mut state = self
            .state
            .write()
            .expect("adaptive bucket lock poisoned - a thread panicked while holding the lock");
        state.limit = new_limit;
    }

    /// Zero the count.
    pub fn reset(&self) {
        let mut state = self
            .state
            .write()
            .expect("adaptive bucket lock poisoned - a thread panicked while holding the lock");
        state.count = 0;
    }

    /// Add to the count, clamping at the limit.
    pub fn add(&self, value: u64) {
        let mut state = self
            .state
            .write()
            .expect("adaptive bucket lock poisoned - a thread panicked while holding the lock");
        state.count = state.count.saturating_add(value).min(state.limit);
    }

    /// Remove from the count, flooring at zero.
    pub fn remove(&self, value: u64) {
        let mut state = self
            .state
            .write()
            .expect("adaptive bucket lock poisoned - a thread panicked while holding the lock");
        state.count = state.count.saturating_sub(value);
    }

    /// Current count.
    pub fn count(&self) -> u64 {
        self.state
            .read()
            .expect("adaptive bucket lock poisoned - a thread panicked while holding the lock")
            .count
    }

    /// Current limit.
    pub fn limit(&self) -> u64 {
        self.state
            .read()
            .expect("adaptive bucket lock poisoned - a thread panicked while holding the lock")
            .limit
    }
}

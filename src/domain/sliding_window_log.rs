//! Sliding window log: an exact sliding window over admission timestamps.
//!
//! Every admission records its timestamp; entries strictly older than
//! the window are evicted before each decision. Exact but unbounded in
//! work: cost grows with the request rate inside the window.

use std::collections::VecDeque;
use std::sync::RwLock;
use std::time::Duration;

use crate::domain::ConfigError;

/// Configuration for a [`SlidingWindowLog`].
#[derive(Debug, Clone)]
pub struct SlidingWindowLogConfig {
    /// Maximum admissions retained within the window
    pub capacity: u64,
    /// Length of the sliding window
    pub window: Duration,
}

impl SlidingWindowLogConfig {
    /// Create a validated sliding window log configuration.
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

/// Exact sliding window over admission timestamps.
///
/// Newest timestamps sit at the front of the log, oldest at the back.
#[derive(Debug)]
pub struct SlidingWindowLog {
    capacity: u64,
    window_ms: u64,
    log: RwLock<VecDeque<u64>>,
}

impl SlidingWindowLog {
    /// Create an empty log.
    pub fn new(config: &SlidingWindowLogConfig) -> Self {
        Self {
            capacity: config.capacity,
            window_ms: config.window.as_millis() as u64,
            log: RwLock::new(VecDeque::new()),
        }
    }

    /// Evict timestamps strictly older than the window from the back.
    fn evict(&self, log: &mut VecDeque<u64>, now_ms: u64) {
        while let Some(&oldest) = log.back() {
            if now_ms.saturating_sub(oldest) > self.window_ms {
                log.pop_back();
            } else {
                break;
            }
        }
    }

    /// Admit one request, recording its timestamp, if the window has
    /// room after eviction.
    pub fn admit(&self, now_ms: u64) -> bool {
        let mut log = self
            .log
            .write()
            .expect("sliding window log lock poisoned - a thread panicked while holding the lock");
        self.evict(&mut log, now_ms);
        if (log.len() as u64) < self.capacity {
            log.push_front(now_ms);
            true
        } else {
            false
        }
    }

    /// Number of admissions still inside the window.
    pub fn len(&self, now_ms: u64) -> u64 {
        let mut log = self
            .log
            .write()
            .expect("sliding window log lock poisoned - a thread panicked while holding the lock");
        self.evict(&mut log, now_ms);
        log.len() as u64
    }

    /// Whether no admissions remain inside the window.
    pub fn is_empty(&self, now_ms: u64) -> bool {
        self.len(now_ms) == 0
    }
}

//! Observability metrics for admission decisions.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Metrics tracking admission statistics.
///
/// All counters use atomic operations for thread-safe updates and can
/// be queried at any time. Cloning shares the underlying counters.
#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug)]
struct MetricsInner {
    /// Total number of admitted requests
    admitted: AtomicU64,
    /// Total number of denied requests
    denied: AtomicU64,
}

impl Metrics {
    /// Create a new metrics tracker.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                admitted: AtomicU64::new(0),
                denied: AtomicU64::new(0),
            }),
        }
    }

    /// Record an admitted request.
    pub(crate) fn record_admitted(&self) {
        self.inner.admitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a denied request.
    pub(crate) fn record_denied(&self) {
        self.inner.denied.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an admission outcome.
    pub(crate) fn record(&self, admitted: bool) {
        if admitted {
            self.record_admitted();
        } else {
            self.record_denied();
        }
    }

    /// Total admitted requests.
    pub fn admitted(&self) -> u64 {
        self.inner.admitted.load(Ordering::Relaxed)
    }

    /// Total denied requests.
    pub fn denied(&self) -> u64 {
        self.inner.denied.load(Ordering::Relaxed)
    }

    /// Get a point-in-time snapshot.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            admitted: self.admitted(),
            denied: self.denied(),
        }
    }

    /// Reset all counters to zero.
    pub fn reset(&self) {
        self.inner.admitted.store(0, Ordering::Relaxed);
        self.inner.denied.store(0, Ordering::Relaxed);
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time snapshot of admission metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Total admitted requests
    pub admitted: u64,
    /// Total denied requests
    pub denied: u64,
}

impl MetricsSnapshot {
    /// Ratio of denied requests to total requests (0.0 to 1.0).
    /// Returns 0.0 when no requests have been processed.
    pub fn denial_rate(&self) -> f64 {
        let total = self.admitted.saturating_add(self.denied);
        if total == 0 {
            0.0
        } else {
            self.denied as f64 / total as f64
        }
    }
}

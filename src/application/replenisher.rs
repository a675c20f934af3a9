//! Background replenishment for burst token pools.
//!
//! One task per pool, firing once per fixed tick for the lifetime of
//! the owning limiter. The task is owned: stopping the limiter (or
//! just dropping the handle) aborts it, so a discarded limiter never
//! leaves a tick loop running.

use std::panic;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, warn};

use crate::domain::burst::BurstBucket;

/// Handle to a running replenisher task.
#[derive(Debug)]
pub struct ReplenisherHandle {
    handle: JoinHandle<()>,
}

impl ReplenisherHandle {
    /// Stop the task. Idempotent; the pool keeps its current tokens.
    pub fn stop(&self) {
        self.handle.abort();
    }

    /// Whether the task is still running.
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for ReplenisherHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Spawn the periodic replenishment task for `bucket`.
///
/// Must be called from within a tokio runtime. The first
/// replenishment lands one full tick after the spawn, matching a pool
/// that starts at full burst capacity.
pub(crate) fn spawn(bucket: Arc<BurstBucket>, tick: Duration) -> ReplenisherHandle {
    let handle = tokio::spawn(async move {
        let mut ticker = interval(tick);
        // interval yields immediately on its first tick; consume it so
        // replenishment starts one period in.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            // A failing tick is logged and skipped; the task keeps its
            // cadence.
            match panic::catch_unwind(panic::AssertUnwindSafe(|| bucket.replenish())) {
                Ok(added) => {
                    if added > 0 {
                        debug!(added, tokens = bucket.tokens(), "replenished burst tokens");
                    }
                }
                Err(_) => warn!("burst replenishment tick panicked"),
            }
        }
    });
    ReplenisherHandle { handle }
}

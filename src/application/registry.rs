//! Keyed registry: one bucket instance per caller key.
//!
//! The registry lazily creates a bucket on the first admission check
//! for a key and shares that one instance with every concurrent
//! caller. Creation rides on the storage adapter's atomic
//! insert-if-absent, so racing first accesses construct exactly one
//! bucket and observe the same instance. Instances live for the
//! process lifetime; there is no eviction.

use std::sync::{Arc, RwLock};

use tracing::info;

use crate::application::error::LimiterError;
use crate::application::metrics::Metrics;
use crate::application::ports::Clock;
use crate::infrastructure::storage::ShardedMap;

/// Capability interface for an algorithm that can live in a
/// [`KeyedRegistry`].
///
/// Composition seam for the per-key services: a registry is generic
/// over anything that can be created from a config snapshot and asked
/// for an admission decision at a point in time.
pub trait KeyedBucket: Send + Sync + 'static {
    /// Configuration the registry hands to every new instance.
    type Config: Clone + Send + Sync + 'static;

    /// Construct a fresh instance anchored at `now_ms`.
    fn create(config: &Self::Config, now_ms: u64) -> Self;

    /// Decide one admission at `now_ms`.
    fn admit(&self, now_ms: u64) -> bool;

    /// Apply a new configuration to this existing instance, in place.
    /// Algorithms with immutable parameters ignore the call.
    fn reconfigure(&self, _config: &Self::Config) {}
}

/// Concurrent map from key to a shared bucket instance.
pub struct KeyedRegistry<B: KeyedBucket> {
    buckets: ShardedMap<String, Arc<B>>,
    config: RwLock<Arc<B::Config>>,
    clock: Arc<dyn Clock>,
    metrics: Metrics,
}

impl<B: KeyedBucket> KeyedRegistry<B> {
    /// Create an empty registry. Buckets materialize on first access.
    pub fn new(config: B::Config, clock: Arc<dyn Clock>) -> Self {
        Self {
            buckets: ShardedMap::new(),
            config: RwLock::new(Arc::new(config)),
            clock,
            metrics: Metrics::new(),
        }
    }

    /// Run one admission decision for `key`, creating its bucket on
    /// first access.
    ///
    /// # Errors
    /// Returns [`LimiterError::InvalidKey`] for an empty key, before
    /// any state is touched.
    pub fn admit(&self, key: &str) -> Result<bool, LimiterError> {
        let bucket = self.get_or_create(key)?;
        let allowed = bucket.admit(self.clock.now_millis());
        self.metrics.record(allowed);
        Ok(allowed)
    }

    /// Fetch the bucket for `key`, constructing it if absent. Racing
    /// first accesses agree on a single instance.
    pub fn get_or_create(&self, key: &str) -> Result<Arc<B>, LimiterError> {
        if key.is_empty() {
            return Err(LimiterError::InvalidKey);
        }
        let config = self
            .config
            .read()
            .expect("registry config lock poisoned - a thread panicked while holding the lock")
            .clone();
        let now_ms = self.clock.now_millis();
        Ok(self
            .buckets
            .get_or_insert_with(key.to_string(), || Arc::new(B::create(&config, now_ms))))
    }

    /// Fetch the bucket for `key` without creating one.
    pub fn get(&self, key: &str) -> Option<Arc<B>> {
        self.buckets.get(key)
    }

    /// Swap the configuration for future instances and apply it to
    /// every existing instance in place.
    ///
    /// The config write guard is held across the whole sweep, so no
    /// bucket can be created from the stale snapshot mid-update and
    /// callers already holding an instance keep using it uninterrupted.
    pub fn update_configuration(&self, new_config: B::Config) {
        let mut config = self
            .config
            .write()
            .expect("registry config lock poisoned - a thread panicked while holding the lock");
        *config = Arc::new(new_config);
        let snapshot = Arc::clone(&config);
        self.buckets
            .for_each(|_, bucket| bucket.reconfigure(&snapshot));
        info!(instances = self.buckets.len(), "limiter configuration updated");
    }

    /// The clock shared by every bucket in this registry.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Admission metrics across all keys.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Number of keys with a live bucket.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Whether no key has a bucket yet.
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

impl<B: KeyedBucket> std::fmt::Debug for KeyedRegistry<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyedRegistry")
            .field("instances", &self.buckets.len())
            .finish()
    }
}

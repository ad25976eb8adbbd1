//! # Fixed-Ring Cache
//!
//! A [`FixedRing`] behind the cache contract. New keys are written at the
//! ring's write index, overwriting the oldest *physical* slot; reads never
//! reorder anything. Cheaper than LRU and predictable, at the cost of evicting
//! hot keys as readily as cold ones.
//!
//! ```text
//!   capacity 2:  hydrate A, B, C
//!
//!     [0] A  [1] B   next_write = 0
//!     [0] C  [1] B   next_write = 1   (A overwritten, however often it was read)
//! ```
//!
//! The ring mutex is held only while scanning or writing. Same-key callers
//! are serialised by a per-key lock instead, so an open handle for one key
//! never blocks lookups of another.

use std::fmt;
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use crate::ds::{FixedRing, KeyedLock};
use crate::error::InvariantError;
use crate::lookup::CacheLookup;
#[cfg(feature = "metrics")]
use crate::metrics::{
    CacheMetricsSnapshot, LookupMetrics, LookupMetricsRecorder, MetricsReset,
    MetricsSnapshotProvider,
};
use crate::traits::Cache;

/// Capacity used when a non-positive capacity is requested.
pub const DEFAULT_RING_CAPACITY: usize = 50;

struct RingShared<V> {
    ring: Mutex<FixedRing<Arc<str>, V>>,
    locks: KeyedLock,
    #[cfg(feature = "metrics")]
    metrics: LookupMetrics,
}

impl<V> RingShared<V> {
    fn store(&self, key: Arc<str>, value: V) {
        let displaced = self.ring.lock().insert(key, value);
        #[cfg(feature = "metrics")]
        {
            self.metrics.record_hydration();
            self.metrics.record_evictions(u64::from(displaced.is_some()));
        }
        if let Some((old, _)) = displaced {
            debug!(key = %old, "ring slot overwritten");
        }
    }
}

/// Circular-buffer cache implementing [`Cache`].
pub struct RingCache<V> {
    shared: Arc<RingShared<V>>,
}

impl<V> RingCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Creates a ring with `capacity` slots. A capacity of 0 falls back to
    /// [`DEFAULT_RING_CAPACITY`].
    pub fn new(capacity: usize) -> Self {
        let capacity = if capacity == 0 {
            DEFAULT_RING_CAPACITY
        } else {
            capacity
        };
        Self {
            shared: Arc::new(RingShared {
                ring: Mutex::new(FixedRing::new(capacity)),
                locks: KeyedLock::new(),
                #[cfg(feature = "metrics")]
                metrics: LookupMetrics::new(),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.shared.ring.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.ring.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.shared.ring.lock().capacity()
    }

    /// Whether `key` currently occupies a slot. No side effects.
    pub fn contains(&self, key: &str) -> bool {
        self.shared.ring.lock().contains(key)
    }

    pub fn clear(&self) {
        self.shared.ring.lock().clear();
    }

    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.shared.ring.lock().check_invariants()
    }

    fn downgrade(&self) -> Weak<RingShared<V>> {
        Arc::downgrade(&self.shared)
    }
}

#[async_trait]
impl<V> Cache<V> for RingCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn lookup(&self, key: &str) -> CacheLookup<V> {
        #[cfg(feature = "metrics")]
        self.shared.metrics.record_lookup();

        let guard = self.shared.locks.acquire(key).await;
        let value = self.shared.ring.lock().get(key).cloned();

        #[cfg(feature = "metrics")]
        if value.is_some() {
            self.shared.metrics.record_hit();
        } else {
            self.shared.metrics.record_miss();
        }

        let key: Arc<str> = Arc::from(key);
        let store_key = Arc::clone(&key);
        let weak = self.downgrade();
        CacheLookup::new(key, value)
            .with_hydrate(move |value| {
                if let Some(shared) = weak.upgrade() {
                    shared.store(store_key, value);
                }
            })
            .with_release(move || drop(guard))
    }
}

impl<V> Clone for RingCache<V> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<V> Default for RingCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(DEFAULT_RING_CAPACITY)
    }
}

impl<V> fmt::Debug for RingCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ring = self.shared.ring.lock();
        f.debug_struct("RingCache")
            .field("len", &ring.len())
            .field("capacity", &ring.capacity())
            .field("next_write", &ring.next_write())
            .finish()
    }
}

#[cfg(feature = "metrics")]
impl<V> MetricsSnapshotProvider<CacheMetricsSnapshot> for RingCache<V> {
    fn snapshot(&self) -> CacheMetricsSnapshot {
        let (len, capacity) = {
            let ring = self.shared.ring.lock();
            (ring.len(), ring.capacity())
        };
        self.shared.metrics.snapshot(len, capacity)
    }
}

#[cfg(feature = "metrics")]
impl<V> MetricsReset for RingCache<V> {
    fn reset_metrics(&self) {
        self.shared.metrics.reset_metrics();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn capacity_two_evicts_first_written() {
        let cache = RingCache::new(2);
        cache.lookup("spinda").await.hydrate(1);
        cache.lookup("lillipup").await.hydrate(2);
        // reading spinda does not protect it
        assert!(cache.lookup("spinda").await.is_hit());
        cache.lookup("pidove").await.hydrate(3);

        assert!(!cache.contains("spinda"));
        assert!(cache.contains("lillipup"));
        assert!(cache.contains("pidove"));
        cache.check_invariants().unwrap();
    }

    #[tokio::test]
    async fn rehydrating_present_key_updates_in_place() {
        let cache = RingCache::new(2);
        cache.lookup("a").await.hydrate(1);
        cache.lookup("b").await.hydrate(2);
        cache.lookup("a").await.hydrate(10);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.lookup("a").await.into_value(), Some(10));
    }

    #[tokio::test]
    async fn zero_capacity_falls_back_to_default() {
        let cache = RingCache::<u8>::new(0);
        assert_eq!(cache.capacity(), DEFAULT_RING_CAPACITY);
    }

    #[tokio::test]
    async fn open_handle_does_not_block_other_keys() {
        let cache = RingCache::<u32>::new(4);
        let _held = cache.lookup("a").await;
        let other = tokio::time::timeout(Duration::from_secs(1), cache.lookup("b")).await;
        assert!(other.is_ok());
    }

    #[cfg(feature = "metrics")]
    #[tokio::test]
    async fn metrics_count_overwrites() {
        let cache = RingCache::new(1);
        cache.lookup("a").await.hydrate(1);
        cache.lookup("b").await.hydrate(2);
        let snap = cache.snapshot();
        assert_eq!(snap.evictions, 1);
        assert_eq!(snap.misses, 2);
        assert_eq!(snap.cache_len, 1);
    }
}

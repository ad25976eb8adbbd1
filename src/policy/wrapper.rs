//! # Store Adapter
//!
//! [`WrapperCache`] turns a plain get/put store (an external client, a shared
//! map, anything implementing [`BackingStore`]) into a [`Cache`], adding the
//! same per-key exclusivity the other strategies have. Storage, eviction and
//! expiry stay entirely with the wrapped store.
//!
//! ```
//! use std::collections::HashMap;
//! use std::sync::Arc;
//!
//! use parking_lot::Mutex;
//! use restcache::policy::wrapper::WrapperCache;
//! use restcache::traits::Cache;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let map = Arc::new(Mutex::new(HashMap::<String, u32>::new()));
//! let cache = WrapperCache::new(
//!     {
//!         let map = Arc::clone(&map);
//!         move |key: &str| map.lock().get(key).copied()
//!     },
//!     {
//!         let map = Arc::clone(&map);
//!         move |key: &str, value: u32| {
//!             map.lock().insert(key.to_owned(), value);
//!         }
//!     },
//! );
//!
//! cache.lookup("https://catalog.test/api/v2/item/1/").await.hydrate(7);
//! assert_eq!(map.lock().get("https://catalog.test/api/v2/item/1/"), Some(&7));
//! # }
//! ```

use std::fmt;
use std::sync::{Arc, Weak};

use async_trait::async_trait;

use crate::ds::KeyedLock;
use crate::lookup::CacheLookup;
#[cfg(feature = "metrics")]
use crate::metrics::{
    CacheMetricsSnapshot, LookupMetrics, LookupMetricsRecorder, MetricsReset,
    MetricsSnapshotProvider,
};
use crate::traits::{BackingStore, Cache};

/// A [`BackingStore`] made of two closures.
pub struct FnStore<G, P> {
    get: G,
    put: P,
}

impl<G, P> FnStore<G, P> {
    pub fn new(get: G, put: P) -> Self {
        Self { get, put }
    }
}

impl<V, G, P> BackingStore<V> for FnStore<G, P>
where
    G: Fn(&str) -> Option<V> + Send + Sync,
    P: Fn(&str, V) + Send + Sync,
{
    fn get(&self, key: &str) -> Option<V> {
        (self.get)(key)
    }

    fn put(&self, key: &str, value: V) {
        (self.put)(key, value)
    }
}

impl<G, P> fmt::Debug for FnStore<G, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnStore").finish_non_exhaustive()
    }
}

struct WrapperShared<V> {
    store: Arc<dyn BackingStore<V>>,
    locks: KeyedLock,
    #[cfg(feature = "metrics")]
    metrics: LookupMetrics,
}

impl<V> WrapperShared<V> {
    fn store(&self, key: &str, value: V) {
        self.store.put(key, value);
        #[cfg(feature = "metrics")]
        self.metrics.record_hydration();
    }
}

/// Adapter from a [`BackingStore`] to [`Cache`].
pub struct WrapperCache<V> {
    shared: Arc<WrapperShared<V>>,
}

impl<V> WrapperCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Wraps a getter and a setter. The key passed to both is the raw lookup
    /// key, query string included.
    pub fn new<G, P>(get: G, put: P) -> Self
    where
        G: Fn(&str) -> Option<V> + Send + Sync + 'static,
        P: Fn(&str, V) + Send + Sync + 'static,
    {
        Self::from_store(Arc::new(FnStore::new(get, put)))
    }

    /// Wraps an existing store.
    pub fn from_store(store: Arc<dyn BackingStore<V>>) -> Self {
        Self {
            shared: Arc::new(WrapperShared {
                store,
                locks: KeyedLock::new(),
                #[cfg(feature = "metrics")]
                metrics: LookupMetrics::new(),
            }),
        }
    }

    fn downgrade(&self) -> Weak<WrapperShared<V>> {
        Arc::downgrade(&self.shared)
    }
}

#[async_trait]
impl<V> Cache<V> for WrapperCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn lookup(&self, key: &str) -> CacheLookup<V> {
        #[cfg(feature = "metrics")]
        self.shared.metrics.record_lookup();

        let guard = self.shared.locks.acquire(key).await;
        let value = self.shared.store.get(key);

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
                    shared.store(&store_key, value);
                }
            })
            .with_release(move || drop(guard))
    }
}

impl<V> Clone for WrapperCache<V> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<V> fmt::Debug for WrapperCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WrapperCache")
            .field("locks", &self.shared.locks)
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "metrics")]
impl<V> MetricsSnapshotProvider<CacheMetricsSnapshot> for WrapperCache<V> {
    /// Size gauges are zero: the wrapped store owns its own size.
    fn snapshot(&self) -> CacheMetricsSnapshot {
        self.shared.metrics.snapshot(0, 0)
    }
}

#[cfg(feature = "metrics")]
impl<V> MetricsReset for WrapperCache<V> {
    fn reset_metrics(&self) {
        self.shared.metrics.reset_metrics();
    }
}

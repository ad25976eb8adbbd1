//! # Cache Contract
//!
//! Every strategy in [`crate::policy`] implements one transactional contract:
//!
//! ```text
//!   lookup(key) ──► CacheLookup ──┬── hit:  value() ──► close()
//!                                 │
//!                                 └── miss: fetch elsewhere ──► hydrate(v)
//!                                                     or on error ──► close()
//! ```
//!
//! `lookup` never fails: a miss is a property of the returned handle, not an
//! error. While a handle is open, the strategies that coordinate (everything
//! except [`NullCache`](crate::policy::none::NullCache)) hold that key
//! exclusively, so a concurrent `lookup` of the same key waits and then
//! observes whatever the first caller hydrated.
//!
//! ## Trait Summary
//!
//! | Trait             | Purpose                                             |
//! |-------------------|-----------------------------------------------------|
//! | [`Cache`]         | Async lookup returning a one-shot [`CacheLookup`]   |
//! | [`BackingStore`]  | Plain get/put store adapted by `WrapperCache`       |
//!
//! ## Strategies
//!
//! | Strategy       | Storage          | Eviction          | TTL | Per-key lock |
//! |----------------|------------------|-------------------|-----|--------------|
//! | `NullCache`    | none             | -                 | no  | no           |
//! | `RingCache`    | fixed slot array | slot rotation     | no  | yes          |
//! | `LruCache`     | map + list       | least recent      | yes | yes          |
//! | `WrapperCache` | caller's store   | caller's store    | -   | yes          |
//!
//! ## Example Usage
//!
//! ```
//! use restcache::policy::lru::LruCache;
//! use restcache::traits::{Cache, SharedCache};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let cache: SharedCache<String> = std::sync::Arc::new(LruCache::new(100));
//!
//! let mut lookup = cache.lookup("https://catalog.test/api/v2/item/1/").await;
//! assert!(!lookup.is_hit());
//! lookup.hydrate("potion".to_string());
//!
//! let lookup = cache.lookup("https://catalog.test/api/v2/item/1/").await;
//! assert_eq!(lookup.into_value().as_deref(), Some("potion"));
//! # }
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use crate::lookup::CacheLookup;

/// A cache keyed by request identity holding values of type `V`.
#[async_trait]
pub trait Cache<V>: Send + Sync
where
    V: Send + 'static,
{
    /// Opens a lookup for `key`.
    ///
    /// May wait while another handle for the same key is open. Dropping the
    /// returned future gives up the wait without side effects.
    async fn lookup(&self, key: &str) -> CacheLookup<V>;
}

/// A cache behind a shared, type-erased pointer.
pub type SharedCache<V> = Arc<dyn Cache<V>>;

#[async_trait]
impl<V, C> Cache<V> for Arc<C>
where
    V: Send + 'static,
    C: Cache<V> + ?Sized,
{
    async fn lookup(&self, key: &str) -> CacheLookup<V> {
        (**self).lookup(key).await
    }
}

#[async_trait]
impl<V, C> Cache<V> for Box<C>
where
    V: Send + 'static,
    C: Cache<V> + ?Sized,
{
    async fn lookup(&self, key: &str) -> CacheLookup<V> {
        (**self).lookup(key).await
    }
}

/// A simple key/value store with no notion of in-flight requests.
///
/// [`WrapperCache`](crate::policy::wrapper::WrapperCache) turns one of these
/// into a [`Cache`]. Persistence, eviction and expiry are entirely the store's
/// business.
pub trait BackingStore<V>: Send + Sync {
    fn get(&self, key: &str) -> Option<V>;

    fn put(&self, key: &str, value: V);
}

impl<V, S> BackingStore<V> for Arc<S>
where
    S: BackingStore<V> + ?Sized,
{
    fn get(&self, key: &str) -> Option<V> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: V) {
        (**self).put(key, value)
    }
}

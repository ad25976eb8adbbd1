//! Unified cache builder for all strategies.
//!
//! Collects the options every strategy might need and hands out either a
//! concrete cache (`build_lru`, `build_ring`, `build_wrapper`) or a
//! type-erased [`SharedCache`] chosen at runtime (`try_build`).
//!
//! ## Options
//!
//! | Option          | Default                  | Honoured by | Notes                          |
//! |-----------------|--------------------------|-------------|--------------------------------|
//! | `capacity`      | per policy (500 / 50)    | LRU, ring   | 0 falls back to the default    |
//! | `ttl`           | none                     | LRU         | zero means no expiry           |
//! | `expiry_delay`  | one week                 | LRU         | zero sweeps on every lookup    |
//! | `clock`         | [`SystemClock`]          | LRU         |                                |
//! | `skip_if`       | none                     | LRU         | matching keys are never cached |
//!
//! `try_build` rejects options the chosen policy would ignore; the concrete
//! `build_*` methods ignore them silently.
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//!
//! use restcache::builder::{CacheBuilder, CachePolicy};
//!
//! let cache = CacheBuilder::new(100)
//!     .ttl(Duration::from_secs(300))
//!     .skip_if(|key| key.contains("?offset="))
//!     .try_build::<String>(CachePolicy::Lru)
//!     .unwrap();
//! # let _ = cache;
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::clock::{Clock, SystemClock};
use crate::error::ConfigError;
use crate::policy::lru::{DEFAULT_EXPIRY_DELAY, LruCache, SkipFn};
use crate::policy::none::NullCache;
use crate::policy::ring::RingCache;
use crate::policy::wrapper::WrapperCache;
use crate::traits::{BackingStore, SharedCache};

/// Strategies selectable at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachePolicy {
    /// Always miss.
    #[default]
    None,
    /// Fixed ring, slot-rotation eviction.
    Ring,
    /// Least recently used, optional TTL.
    Lru,
}

impl fmt::Display for CachePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CachePolicy::None => "none",
            CachePolicy::Ring => "ring",
            CachePolicy::Lru => "lru",
        })
    }
}

/// Builder for creating cache instances.
#[derive(Clone)]
pub struct CacheBuilder {
    capacity: usize,
    ttl: Option<Duration>,
    expiry_delay: Option<Duration>,
    clock: Option<Arc<dyn Clock>>,
    skip: Option<SkipFn>,
}

impl CacheBuilder {
    /// Create a new cache builder with the specified capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            ttl: None,
            expiry_delay: None,
            clock: None,
            skip: None,
        }
    }

    /// Entries expire this long after they are hydrated. Zero disables
    /// expiry.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = (!ttl.is_zero()).then_some(ttl);
        self
    }

    /// Minimum time between expiry sweeps.
    pub fn expiry_delay(mut self, delay: Duration) -> Self {
        self.expiry_delay = Some(delay);
        self
    }

    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    /// Keys matching `predicate` bypass the cache: always a miss, never
    /// stored, no per-key wait.
    pub fn skip_if<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.skip = Some(Arc::new(predicate));
        self
    }

    pub fn build_lru<V>(self) -> LruCache<V>
    where
        V: Clone + Send + Sync + 'static,
    {
        LruCache::with_parts(
            self.capacity,
            self.ttl,
            self.expiry_delay.unwrap_or(DEFAULT_EXPIRY_DELAY),
            self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            self.skip,
        )
    }

    /// Builds a ring cache. Only the capacity is used.
    pub fn build_ring<V>(self) -> RingCache<V>
    where
        V: Clone + Send + Sync + 'static,
    {
        RingCache::new(self.capacity)
    }

    /// Wraps `store`. No option applies.
    pub fn build_wrapper<V>(self, store: Arc<dyn BackingStore<V>>) -> WrapperCache<V>
    where
        V: Clone + Send + Sync + 'static,
    {
        WrapperCache::from_store(store)
    }

    /// Builds the cache selected by `policy` behind a [`SharedCache`].
    ///
    /// # Errors
    ///
    /// [`ConfigError`] when an option is set that `policy` does not support,
    /// or when an expiry delay is set without a TTL.
    pub fn try_build<V>(self, policy: CachePolicy) -> Result<SharedCache<V>, ConfigError>
    where
        V: Clone + Send + Sync + 'static,
    {
        self.validate(policy)?;
        let cache: SharedCache<V> = match policy {
            CachePolicy::None => Arc::new(NullCache),
            CachePolicy::Ring => Arc::new(self.build_ring::<V>()),
            CachePolicy::Lru => Arc::new(self.build_lru::<V>()),
        };
        Ok(cache)
    }

    fn validate(&self, policy: CachePolicy) -> Result<(), ConfigError> {
        if policy != CachePolicy::Lru {
            let unsupported = [
                ("ttl", self.ttl.is_some()),
                ("expiry_delay", self.expiry_delay.is_some()),
                ("clock", self.clock.is_some()),
                ("skip_if", self.skip.is_some()),
            ];
            if let Some((name, _)) = unsupported.iter().find(|(_, set)| *set) {
                return Err(ConfigError::new(format!(
                    "{name} is only supported by the lru policy, not {policy}"
                )));
            }
        }
        if self.expiry_delay.is_some() && self.ttl.is_none() {
            return Err(ConfigError::new("expiry_delay has no effect without a ttl"));
        }
        Ok(())
    }
}

impl fmt::Debug for CacheBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheBuilder")
            .field("capacity", &self.capacity)
            .field("ttl", &self.ttl)
            .field("expiry_delay", &self.expiry_delay)
            .field("clock", &self.clock.is_some())
            .field("skip", &self.skip.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::policy::lru::DEFAULT_LRU_CAPACITY;
    use crate::policy::ring::DEFAULT_RING_CAPACITY;
    use crate::traits::Cache;

    #[tokio::test]
    async fn test_all_policies_basic_ops() {
        for policy in [CachePolicy::Ring, CachePolicy::Lru] {
            let cache = CacheBuilder::new(10).try_build::<String>(policy).unwrap();
            let mut lookup = cache.lookup("wooper").await;
            assert!(!lookup.is_hit(), "{policy}");
            lookup.hydrate("ground".to_string());
            let lookup = cache.lookup("wooper").await;
            assert_eq!(lookup.value().map(String::as_str), Some("ground"), "{policy}");
        }

        let none = CacheBuilder::new(10).try_build::<String>(CachePolicy::None).unwrap();
        none.lookup("wooper").await.hydrate("ground".to_string());
        assert!(!none.lookup("wooper").await.is_hit());
    }

    #[test]
    fn test_zero_capacity_defaults() {
        assert_eq!(CacheBuilder::new(0).build_lru::<u8>().capacity(), DEFAULT_LRU_CAPACITY);
        assert_eq!(CacheBuilder::new(0).build_ring::<u8>().capacity(), DEFAULT_RING_CAPACITY);
    }

    #[test]
    fn test_lru_options_applied() {
        let cache = CacheBuilder::new(7)
            .ttl(Duration::from_secs(60))
            .expiry_delay(Duration::ZERO)
            .clock(ManualClock::new())
            .build_lru::<u8>();
        assert_eq!(cache.capacity(), 7);
        assert_eq!(cache.ttl(), Some(Duration::from_secs(60)));
        assert_eq!(cache.expiry_delay(), Duration::ZERO);
    }

    #[test]
    fn test_rejects_lru_only_options() {
        let err = CacheBuilder::new(10)
            .ttl(Duration::from_secs(1))
            .try_build::<u8>(CachePolicy::Ring)
            .err()
            .unwrap();
        assert_eq!(err.message(), "ttl is only supported by the lru policy, not ring");

        let err = CacheBuilder::new(10)
            .skip_if(|_| true)
            .try_build::<u8>(CachePolicy::None)
            .err()
            .unwrap();
        assert!(err.message().starts_with("skip_if"));
    }

    #[test]
    fn test_rejects_delay_without_ttl() {
        let err = CacheBuilder::new(10)
            .expiry_delay(Duration::ZERO)
            .try_build::<u8>(CachePolicy::Lru)
            .err()
            .unwrap();
        assert!(err.message().contains("without a ttl"));
    }

    #[test]
    fn test_zero_ttl_is_unset() {
        assert!(
            CacheBuilder::new(10)
                .ttl(Duration::ZERO)
                .try_build::<u8>(CachePolicy::Ring)
                .is_ok()
        );
    }
}

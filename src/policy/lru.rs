//! # Least Recently Used (LRU) Cache
//!
//! Hashmap + arena-backed recency list, with optional per-entry TTL and
//! per-key single-flight coordination.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────────────┐
//!   │                            LruCache<V>                                   │
//!   │                                                                          │
//!   │   Arc<LruShared<V>>  (clones share everything below)                     │
//!   │                                                                          │
//!   │   ┌──────────────────────────┐   ┌────────────────────────────────────┐  │
//!   │   │ KeyedLock                │   │ parking_lot::Mutex<LruCore<V>>     │  │
//!   │   │ one open handle per key  │   │ held for O(1) map/list work only   │  │
//!   │   └──────────────────────────┘   └────────────────────────────────────┘  │
//!   │   clock: Arc<dyn Clock>    skip: Option<SkipFn>    expiry_delay          │
//!   └──────────────────────────────────────────────────────────────────────────┘
//!
//!   ┌──────────────────────────────────────────────────────────────────────────┐
//!   │                            LruCore<V>                                    │
//!   │                                                                          │
//!   │   index: FxHashMap<Arc<str>, SlotId>                                     │
//!   │                  │                                                       │
//!   │                  ▼                                                       │
//!   │   list: IntrusiveList<Entry<V>>                                          │
//!   │     youngest ──► [A] ◄──► [B] ◄──► [C] ◄── oldest                        │
//!   │                                                                          │
//!   │   Entry { key: Arc<str>, value: V, expires_at: Option<Instant> }         │
//!   └──────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Lookup Flow
//!
//! ```text
//!   lookup(key)
//!     1. skip predicate matches ──► detached miss (no lock, never stored)
//!     2. acquire per-key lock (waits while another handle for key is open)
//!     3. core lock: live entry ──► promote to youngest, hit
//!                   expired entry ──► remove, miss
//!                   absent ──► miss
//!     4. core lock again: throttled expiry sweep
//!     5. return handle; hydrate stores at youngest and evicts from oldest
//!        until len <= capacity; hydrate/close/drop releases the key
//! ```
//!
//! ## Expiry
//!
//! With a TTL set, an entry expires once more than `ttl` has passed since it
//! was hydrated; promotion does not extend it. A TTL too large to add to the
//! current instant never expires. Expired entries are removed in three places:
//!
//! | Where              | When                                                  |
//! |--------------------|-------------------------------------------------------|
//! | access             | the entry itself is looked up                         |
//! | throttled sweep    | inside `lookup`, at most once per `expiry_delay`      |
//! | `purge_expired`    | whenever the owner calls it                           |
//!
//! The sweep runs inline on the calling task. It is O(n) under the core lock,
//! so the default delay is long (one week) and the per-access check carries
//! correctness; the sweep only bounds memory held by cold expired entries.
//!
//! ## Thread Safety
//!
//! - `LruCore`: not synchronised, single owner.
//! - `LruCache`: `Send + Sync`, cheap to clone.

use std::fmt;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::clock::{Clock, SystemClock};
use crate::ds::{IntrusiveList, KeyedLock, SlotId};
use crate::error::InvariantError;
use crate::lookup::CacheLookup;
#[cfg(feature = "metrics")]
use crate::metrics::{
    CacheMetricsSnapshot, LookupMetrics, LookupMetricsRecorder, MetricsReset,
    MetricsSnapshotProvider,
};
use crate::traits::Cache;

/// Capacity used when a non-positive capacity is requested.
pub const DEFAULT_LRU_CAPACITY: usize = 500;

/// Minimum time between two expiry sweeps unless configured otherwise.
pub const DEFAULT_EXPIRY_DELAY: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Predicate selecting keys that bypass the cache entirely.
pub type SkipFn = Arc<dyn Fn(&str) -> bool + Send + Sync>;

struct Entry<V> {
    key: Arc<str>,
    value: V,
    expires_at: Option<Instant>,
}

impl<V> Entry<V> {
    #[inline]
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now > at)
    }
}

/// Outcome of [`LruCore::probe`].
#[derive(Debug, PartialEq, Eq)]
pub enum Probe<'a, V> {
    /// Live entry, now the youngest.
    Hit(&'a V),
    /// An entry existed but had expired; it has been removed.
    Expired,
    Absent,
}

/// Single-threaded LRU core.
///
/// Owns the index and the recency list and keeps their key sets identical.
/// Time is passed in explicitly so the core stays deterministic.
pub struct LruCore<V> {
    index: FxHashMap<Arc<str>, SlotId>,
    list: IntrusiveList<Entry<V>>,
    capacity: usize,
    ttl: Option<Duration>,
    last_sweep: Option<Instant>,
}

impl<V> LruCore<V> {
    /// Creates a core holding at most `capacity` entries and no TTL.
    ///
    /// A capacity of 0 gives a core that stores nothing.
    ///
    /// ```
    /// use std::time::Instant;
    ///
    /// use restcache::policy::lru::LruCore;
    ///
    /// let mut core = LruCore::new(2);
    /// let now = Instant::now();
    /// core.insert("a".into(), 1, now);
    /// core.insert("b".into(), 2, now);
    /// core.get("a", now);
    /// core.insert("c".into(), 3, now);
    /// assert!(!core.contains("b"));
    /// ```
    pub fn new(capacity: usize) -> Self {
        Self {
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            list: IntrusiveList::with_capacity(capacity),
            capacity,
            ttl: None,
            last_sweep: None,
        }
    }

    /// Creates a core whose entries expire `ttl` after insertion. A zero TTL
    /// disables expiry.
    pub fn with_ttl(capacity: usize, ttl: Duration) -> Self {
        let mut core = Self::new(capacity);
        core.ttl = (!ttl.is_zero()).then_some(ttl);
        core
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.list.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// When the last sweep ran, if ever.
    pub fn last_sweep(&self) -> Option<Instant> {
        self.last_sweep
    }

    /// Structural presence; ignores expiry and does not promote.
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Looks `key` up, promoting a live entry and dropping an expired one.
    pub fn probe(&mut self, key: &str, now: Instant) -> Probe<'_, V> {
        let Some(&id) = self.index.get(key) else {
            return Probe::Absent;
        };
        let expired = self.list.get(id).is_some_and(|entry| entry.is_expired(now));
        if expired {
            self.unlink(id);
            return Probe::Expired;
        }
        self.list.move_to_front(id);
        match self.list.get(id) {
            Some(entry) => Probe::Hit(&entry.value),
            None => Probe::Absent,
        }
    }

    /// Returns the live value for `key`, promoting it.
    pub fn get(&mut self, key: &str, now: Instant) -> Option<&V> {
        match self.probe(key, now) {
            Probe::Hit(value) => Some(value),
            Probe::Expired | Probe::Absent => None,
        }
    }

    /// Returns the live value for `key` without touching recency.
    pub fn peek(&self, key: &str, now: Instant) -> Option<&V> {
        let id = *self.index.get(key)?;
        self.list
            .get(id)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| &entry.value)
    }

    /// Stores `value` as the youngest entry, replacing any existing entry for
    /// `key`, then evicts from the oldest end until `len <= capacity`.
    ///
    /// Returns the number of entries evicted.
    pub fn insert(&mut self, key: Arc<str>, value: V, now: Instant) -> usize {
        if self.capacity == 0 {
            return 0;
        }
        if let Some(&id) = self.index.get(&*key) {
            self.unlink(id);
        }
        // a deadline past the end of `Instant` never expires
        let expires_at = self.ttl.and_then(|ttl| now.checked_add(ttl));
        let id = self.list.push_front(Entry {
            key: Arc::clone(&key),
            value,
            expires_at,
        });
        self.index.insert(key, id);
        self.evict_to_capacity()
    }

    pub fn remove(&mut self, key: &str) -> Option<V> {
        let id = *self.index.get(key)?;
        self.unlink(id)
    }

    /// Removes every entry that has expired at `now`. Returns how many.
    pub fn purge_expired(&mut self, now: Instant) -> usize {
        if self.ttl.is_none() {
            return 0;
        }
        let expired: Vec<SlotId> = self
            .list
            .iter_entries()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(id, _)| id)
            .collect();
        for &id in &expired {
            self.unlink(id);
        }
        expired.len()
    }

    /// Runs [`purge_expired`](Self::purge_expired) unless the TTL is unset or
    /// a sweep already ran less than `delay` ago.
    ///
    /// Returns `None` when skipped, otherwise the number of entries removed.
    pub fn sweep(&mut self, now: Instant, delay: Duration) -> Option<usize> {
        self.ttl?;
        if let Some(last) = self.last_sweep {
            if now.saturating_duration_since(last) < delay {
                return None;
            }
        }
        self.last_sweep = Some(now);
        Some(self.purge_expired(now))
    }

    /// Changes the capacity and evicts down to it. Returns how many entries
    /// were evicted.
    pub fn set_capacity(&mut self, capacity: usize) -> usize {
        self.capacity = capacity;
        self.evict_to_capacity()
    }

    pub fn clear(&mut self) {
        self.index.clear();
        self.list.clear();
    }

    /// Keys from youngest to oldest.
    pub fn keys_by_recency(&self) -> Vec<Arc<str>> {
        self.list.iter().map(|entry| Arc::clone(&entry.key)).collect()
    }

    /// Position of `key` in recency order (0 = youngest).
    pub fn recency_rank(&self, key: &str) -> Option<usize> {
        self.list.iter().position(|entry| &*entry.key == key)
    }

    /// Checks that index and list hold the same keys, that the list links are
    /// sound, and that `len <= capacity`.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.list.check_links()?;
        if self.index.len() != self.list.len() {
            return Err(InvariantError::new(format!(
                "index holds {} keys but list holds {}",
                self.index.len(),
                self.list.len()
            )));
        }
        for (id, entry) in self.list.iter_entries() {
            match self.index.get(&*entry.key) {
                Some(&mapped) if mapped == id => {},
                Some(&mapped) => {
                    return Err(InvariantError::new(format!(
                        "key {:?} maps to {:?} but lives at {:?}",
                        entry.key, mapped, id
                    )));
                },
                None => {
                    return Err(InvariantError::new(format!(
                        "list entry {:?} missing from index",
                        entry.key
                    )));
                },
            }
        }
        if self.len() > self.capacity {
            return Err(InvariantError::new(format!(
                "len {} exceeds capacity {}",
                self.len(),
                self.capacity
            )));
        }
        Ok(())
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        if let Err(err) = self.check_invariants() {
            panic!("lru invariant violated: {err}");
        }
    }

    /// Removes the entry at `id` from both list and index.
    fn unlink(&mut self, id: SlotId) -> Option<V> {
        let entry = self.list.remove(id)?;
        self.index.remove(&*entry.key);
        Some(entry.value)
    }

    fn evict_to_capacity(&mut self) -> usize {
        let mut evicted = 0;
        while self.list.len() > self.capacity {
            let Some(entry) = self.list.pop_back() else {
                break;
            };
            self.index.remove(&*entry.key);
            trace!(key = %entry.key, "evicted oldest entry");
            evicted += 1;
        }
        evicted
    }
}

impl<V> fmt::Debug for LruCore<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCore")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .field("ttl", &self.ttl)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// LruCache
// ---------------------------------------------------------------------------

struct LruShared<V> {
    core: Mutex<LruCore<V>>,
    locks: KeyedLock,
    clock: Arc<dyn Clock>,
    skip: Option<SkipFn>,
    expiry_delay: Duration,
    #[cfg(feature = "metrics")]
    metrics: LookupMetrics,
}

impl<V> LruShared<V> {
    fn store(&self, key: Arc<str>, value: V) {
        let now = self.clock.now();
        let evicted = self.core.lock().insert(Arc::clone(&key), value, now);
        #[cfg(feature = "metrics")]
        {
            self.metrics.record_hydration();
            self.metrics.record_evictions(evicted as u64);
        }
        if evicted > 0 {
            debug!(key = %key, evicted, "hydrate evicted oldest entries");
        }
    }

    fn sweep(&self, now: Instant) {
        let removed = self.core.lock().sweep(now, self.expiry_delay);
        if let Some(removed) = removed {
            #[cfg(feature = "metrics")]
            {
                self.metrics.record_sweep();
                self.metrics.record_expirations(removed as u64);
            }
            debug!(expired = removed, "expiry sweep finished");
        }
    }
}

/// Shared LRU cache implementing [`Cache`].
///
/// ```
/// use restcache::policy::lru::LruCache;
/// use restcache::traits::Cache;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let cache = LruCache::new(3);
/// let mut lookup = cache.lookup("https://catalog.test/api/v2/item/1/").await;
/// lookup.hydrate(String::from("potion"));
///
/// let lookup = cache.lookup("https://catalog.test/api/v2/item/1/").await;
/// assert_eq!(lookup.value().map(String::as_str), Some("potion"));
/// # }
/// ```
pub struct LruCache<V> {
    shared: Arc<LruShared<V>>,
}

impl<V> LruCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Creates a cache with no TTL. A capacity of 0 falls back to
    /// [`DEFAULT_LRU_CAPACITY`].
    pub fn new(capacity: usize) -> Self {
        Self::with_parts(capacity, None, DEFAULT_EXPIRY_DELAY, Arc::new(SystemClock), None)
    }

    pub(crate) fn with_parts(
        capacity: usize,
        ttl: Option<Duration>,
        expiry_delay: Duration,
        clock: Arc<dyn Clock>,
        skip: Option<SkipFn>,
    ) -> Self {
        let capacity = if capacity == 0 {
            DEFAULT_LRU_CAPACITY
        } else {
            capacity
        };
        let core = match ttl {
            Some(ttl) => LruCore::with_ttl(capacity, ttl),
            None => LruCore::new(capacity),
        };
        Self {
            shared: Arc::new(LruShared {
                core: Mutex::new(core),
                locks: KeyedLock::new(),
                clock,
                skip,
                expiry_delay,
                #[cfg(feature = "metrics")]
                metrics: LookupMetrics::new(),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.shared.core.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.core.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.shared.core.lock().capacity()
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.shared.core.lock().ttl()
    }

    pub fn expiry_delay(&self) -> Duration {
        self.shared.expiry_delay
    }

    /// Whether a live entry for `key` exists. Does not promote, does not wait
    /// on the per-key lock.
    pub fn contains(&self, key: &str) -> bool {
        let now = self.shared.clock.now();
        self.shared.core.lock().peek(key, now).is_some()
    }

    /// Changes the capacity, evicting oldest entries as needed. A capacity of
    /// 0 empties the cache and stops it storing anything.
    pub fn resize(&self, capacity: usize) {
        let evicted = self.shared.core.lock().set_capacity(capacity);
        #[cfg(feature = "metrics")]
        self.shared.metrics.record_evictions(evicted as u64);
        debug!(capacity, evicted, "lru cache resized");
    }

    /// Removes every expired entry now, ignoring the sweep throttle. Returns
    /// how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.shared.clock.now();
        let removed = self.shared.core.lock().purge_expired(now);
        #[cfg(feature = "metrics")]
        self.shared.metrics.record_expirations(removed as u64);
        removed
    }

    pub fn clear(&self) {
        self.shared.core.lock().clear();
    }

    /// Keys from youngest to oldest.
    pub fn keys_by_recency(&self) -> Vec<Arc<str>> {
        self.shared.core.lock().keys_by_recency()
    }

    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.shared.core.lock().check_invariants()
    }

    fn downgrade(&self) -> Weak<LruShared<V>> {
        Arc::downgrade(&self.shared)
    }
}

#[async_trait]
impl<V> Cache<V> for LruCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn lookup(&self, key: &str) -> CacheLookup<V> {
        let shared = &self.shared;
        #[cfg(feature = "metrics")]
        shared.metrics.record_lookup();

        if shared.skip.as_ref().is_some_and(|skip| skip(key)) {
            trace!(key, "skip predicate matched, bypassing cache");
            #[cfg(feature = "metrics")]
            {
                shared.metrics.record_skip();
                shared.metrics.record_miss();
            }
            return CacheLookup::miss(key);
        }

        let guard = shared.locks.acquire(key).await;
        let key: Arc<str> = Arc::from(key);
        let now = shared.clock.now();

        let (value, expired) = {
            let mut core = shared.core.lock();
            match core.probe(&key, now) {
                Probe::Hit(value) => (Some(value.clone()), false),
                Probe::Expired => (None, true),
                Probe::Absent => (None, false),
            }
        };
        if expired {
            trace!(key = %key, "entry expired on access");
            #[cfg(feature = "metrics")]
            shared.metrics.record_expirations(1);
        }

        shared.sweep(now);

        #[cfg(feature = "metrics")]
        if value.is_some() {
            shared.metrics.record_hit();
        } else {
            shared.metrics.record_miss();
        }

        let weak = self.downgrade();
        let store_key = Arc::clone(&key);
        CacheLookup::new(key, value)
            .with_hydrate(move |value| {
                if let Some(shared) = weak.upgrade() {
                    shared.store(store_key, value);
                }
            })
            .with_release(move || drop(guard))
    }
}

impl<V> Clone for LruCache<V> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<V> Default for LruCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(DEFAULT_LRU_CAPACITY)
    }
}

impl<V> fmt::Debug for LruCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCache")
            .field("core", &*self.shared.core.lock())
            .field("expiry_delay", &self.shared.expiry_delay)
            .field("skip", &self.shared.skip.is_some())
            .field("locks", &self.shared.locks)
            .finish()
    }
}

#[cfg(feature = "metrics")]
impl<V> MetricsSnapshotProvider<CacheMetricsSnapshot> for LruCache<V> {
    fn snapshot(&self) -> CacheMetricsSnapshot {
        let (len, capacity) = {
            let core = self.shared.core.lock();
            (core.len(), core.capacity())
        };
        self.shared.metrics.snapshot(len, capacity)
    }
}

#[cfg(feature = "metrics")]
impl<V> MetricsReset for LruCache<V> {
    fn reset_metrics(&self) {
        self.shared.metrics.reset_metrics();
    }
}

// ==============================================
// SHARED CONFORMANCE SUITE (integration)
// ==============================================
//
// Every coordinating strategy runs the same contract checks. The wrapper is
// exercised over a bounded FIFO store so the capacity checks apply to it too.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use restcache::policy::lru::LruCache;
use restcache::policy::ring::RingCache;
use restcache::policy::wrapper::WrapperCache;
use restcache::traits::{BackingStore, Cache, SharedCache};

const ITEM: &str = "https://catalog.test/api/v2/item/132/";

/// Get/put store holding at most `capacity` keys, dropping the first written.
struct BoundedStore {
    capacity: usize,
    state: Mutex<(HashMap<String, String>, VecDeque<String>)>,
}

impl BoundedStore {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new((HashMap::new(), VecDeque::new())),
        }
    }
}

impl BackingStore<String> for BoundedStore {
    fn get(&self, key: &str) -> Option<String> {
        self.state.lock().0.get(key).cloned()
    }

    fn put(&self, key: &str, value: String) {
        let mut state = self.state.lock();
        let (map, order) = &mut *state;
        if map.insert(key.to_owned(), value).is_none() {
            order.push_back(key.to_owned());
            while order.len() > self.capacity {
                if let Some(oldest) = order.pop_front() {
                    map.remove(&oldest);
                }
            }
        }
    }
}

fn key(i: usize) -> String {
    format!("https://catalog.test/api/v2/item/{i}/")
}

async fn fill(cache: &SharedCache<String>, keys: impl Iterator<Item = String>) {
    for k in keys {
        let mut lookup = cache.lookup(&k).await;
        assert!(!lookup.is_hit(), "{k} unexpectedly cached");
        lookup.hydrate(format!("value of {k}"));
    }
}

macro_rules! conformance_suite {
    ($name:ident, $make:expr) => {
        mod $name {
            use super::*;

            fn make(capacity: usize) -> SharedCache<String> {
                let make: fn(usize) -> SharedCache<String> = $make;
                make(capacity)
            }

            #[tokio::test]
            async fn unseen_keys_miss() {
                let cache = make(4);
                for i in 0..10 {
                    let lookup = cache.lookup(&key(i)).await;
                    assert!(!lookup.is_hit());
                    assert!(lookup.value().is_none());
                }
            }

            #[tokio::test]
            async fn hydrated_key_hits_with_value() {
                let cache = make(4);
                cache.lookup(ITEM).await.hydrate("master-ball".to_string());
                let lookup = cache.lookup(ITEM).await;
                assert!(lookup.is_hit());
                assert_eq!(lookup.value().map(String::as_str), Some("master-ball"));
            }

            #[tokio::test]
            async fn only_first_hydrate_takes_effect() {
                let cache = make(4);
                let mut lookup = cache.lookup(ITEM).await;
                lookup.hydrate("first".to_string());
                lookup.hydrate("second".to_string());
                drop(lookup);
                let lookup = cache.lookup(ITEM).await;
                assert_eq!(lookup.into_value().as_deref(), Some("first"));
            }

            #[tokio::test]
            async fn hydrate_after_close_has_no_effect() {
                let cache = make(4);
                let mut lookup = cache.lookup(ITEM).await;
                lookup.close();
                lookup.hydrate("late".to_string());
                assert!(!cache.lookup(ITEM).await.is_hit());
            }

            #[tokio::test]
            async fn exactly_capacity_keys_all_hit() {
                let n = 8;
                let cache = make(n);
                fill(&cache, (0..n).map(key)).await;
                for i in 0..n {
                    let lookup = cache.lookup(&key(i)).await;
                    assert!(lookup.is_hit(), "key {i} missing");
                    assert_eq!(lookup.into_value(), Some(format!("value of {}", key(i))));
                }
            }

            #[tokio::test]
            async fn overflow_misses_exactly_m_minus_n() {
                let (n, m) = (4, 11);
                let cache = make(n);
                fill(&cache, (0..m).map(key)).await;

                let mut misses = 0;
                for i in 0..m {
                    let mut lookup = cache.lookup(&key(i)).await;
                    if !lookup.is_hit() {
                        misses += 1;
                    }
                    lookup.close();
                }
                assert_eq!(misses, m - n);
            }

            #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
            async fn concurrent_lookups_fetch_once() {
                let cache = make(4);
                let fetches = Arc::new(AtomicUsize::new(0));

                let tasks: Vec<_> = (0..100)
                    .map(|_| {
                        let cache = Arc::clone(&cache);
                        let fetches = Arc::clone(&fetches);
                        tokio::spawn(async move {
                            let mut lookup = cache.lookup(ITEM).await;
                            if let Some(value) = lookup.value().cloned() {
                                lookup.close();
                                return value;
                            }
                            let n = fetches.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(5)).await;
                            let value = format!("fetch-{n}");
                            lookup.hydrate(value.clone());
                            value
                        })
                    })
                    .collect();

                for task in tasks {
                    assert_eq!(task.await.unwrap(), "fetch-0");
                }
                assert_eq!(fetches.load(Ordering::SeqCst), 1);
            }
        }
    };
}

conformance_suite!(lru, |capacity| Arc::new(LruCache::<String>::new(capacity)));
conformance_suite!(ring, |capacity| Arc::new(RingCache::<String>::new(capacity)));
conformance_suite!(wrapper, |capacity| {
    let store: Arc<dyn BackingStore<String>> = Arc::new(BoundedStore::new(capacity));
    Arc::new(WrapperCache::<String>::from_store(store))
});

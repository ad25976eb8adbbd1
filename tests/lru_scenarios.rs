// ==============================================
// LRU AND RING SCENARIOS (integration)
// ==============================================
//
// Recency order, expiry sweeps and the skip predicate as seen from the
// public lookup API.

use std::time::Duration;

use restcache::builder::CacheBuilder;
use restcache::clock::ManualClock;
use restcache::policy::lru::LruCache;
use restcache::policy::ring::RingCache;
use restcache::traits::Cache;

async fn hydrate<C: Cache<String>>(cache: &C, key: &str, value: &str) {
    let mut lookup = cache.lookup(key).await;
    lookup.hydrate(value.to_string());
}

async fn is_cached<C: Cache<String>>(cache: &C, key: &str) -> bool {
    let mut lookup = cache.lookup(key).await;
    let hit = lookup.is_hit();
    lookup.close();
    hit
}

mod recency {
    use super::*;

    #[tokio::test]
    async fn rehydrated_key_survives_and_oldest_goes() {
        let cache = LruCache::new(3);
        hydrate(&cache, "wooper", "ground").await;
        hydrate(&cache, "dragalge", "poison").await;

        // Re-hydrating refreshes the value and makes wooper the youngest.
        let mut lookup = cache.lookup("wooper").await;
        assert!(lookup.is_hit());
        lookup.hydrate("water".to_string());

        hydrate(&cache, "miltank", "normal").await;
        assert_eq!(
            cache
                .keys_by_recency()
                .iter()
                .map(|k| k.to_string())
                .collect::<Vec<_>>(),
            vec!["miltank", "wooper", "dragalge"]
        );

        hydrate(&cache, "necrozma", "psychic").await;

        assert!(!is_cached(&cache, "dragalge").await);
        assert!(is_cached(&cache, "miltank").await);
        assert!(is_cached(&cache, "necrozma").await);
        let lookup = cache.lookup("wooper").await;
        assert_eq!(lookup.into_value().as_deref(), Some("water"));
        cache.check_invariants().unwrap();
    }

    #[tokio::test]
    async fn hit_promotes_entry() {
        let cache = LruCache::new(3);
        hydrate(&cache, "A", "a").await;
        hydrate(&cache, "B", "b").await;
        assert!(is_cached(&cache, "A").await);
        hydrate(&cache, "C", "c").await;
        hydrate(&cache, "D", "d").await;

        assert_eq!(
            cache
                .keys_by_recency()
                .iter()
                .map(|k| k.to_string())
                .collect::<Vec<_>>(),
            vec!["D", "C", "A"]
        );
        assert!(!cache.contains("B"));
    }

    #[tokio::test]
    async fn resize_to_zero_stores_nothing() {
        let cache = LruCache::new(3);
        hydrate(&cache, "A", "a").await;
        cache.resize(0);
        assert!(cache.is_empty());
        hydrate(&cache, "B", "b").await;
        assert!(cache.is_empty());
        assert!(!is_cached(&cache, "B").await);
    }
}

mod expiry {
    use super::*;

    #[tokio::test]
    async fn sweep_removes_stale_entries_on_any_lookup() {
        let clock = ManualClock::new();
        let cache = CacheBuilder::new(10)
            .ttl(Duration::from_secs(60))
            .expiry_delay(Duration::ZERO)
            .clock(clock.clone())
            .build_lru::<String>();

        hydrate(&cache, "https://catalog.test/api/v2/item/1/", "potion").await;
        hydrate(&cache, "https://catalog.test/api/v2/item/2/", "antidote").await;
        assert_eq!(cache.len(), 2);

        clock.advance(Duration::from_secs(60 * 60));
        assert!(!is_cached(&cache, "https://catalog.test/api/v2/item/3/").await);
        assert_eq!(cache.len(), 0);
        assert!(!is_cached(&cache, "https://catalog.test/api/v2/item/1/").await);
    }

    #[tokio::test]
    async fn lazy_expiry_without_sweep() {
        let clock = ManualClock::new();
        let cache = CacheBuilder::new(10)
            .ttl(Duration::from_secs(60))
            .clock(clock.clone())
            .build_lru::<String>();

        // The first lookup uses up the initial sweep; the default delay keeps
        // later sweeps away.
        hydrate(&cache, "A", "a").await;
        hydrate(&cache, "B", "b").await;
        clock.advance(Duration::from_secs(61));

        assert!(!is_cached(&cache, "A").await);
        assert_eq!(cache.len(), 1, "B is stale but not yet swept");
        assert!(!cache.contains("B"));
        assert_eq!(cache.purge_expired(), 1);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn entry_within_ttl_hits() {
        let clock = ManualClock::new();
        let cache = CacheBuilder::new(10)
            .ttl(Duration::from_secs(60))
            .clock(clock.clone())
            .build_lru::<String>();
        hydrate(&cache, "A", "a").await;
        clock.advance(Duration::from_secs(59));
        assert!(is_cached(&cache, "A").await);
    }
}

mod skip {
    use super::*;

    const PAGE: &str = "https://catalog.test/api/v2/item?offset=20&limit=20";

    #[tokio::test]
    async fn matching_keys_are_never_stored() {
        let cache = CacheBuilder::new(10)
            .skip_if(|key| key.contains("?offset="))
            .build_lru::<String>();

        hydrate(&cache, PAGE, "page two").await;
        assert!(cache.is_empty());
        assert!(!is_cached(&cache, PAGE).await);

        hydrate(&cache, "https://catalog.test/api/v2/item/1/", "potion").await;
        assert!(is_cached(&cache, "https://catalog.test/api/v2/item/1/").await);
    }

    #[tokio::test]
    async fn matching_keys_do_not_wait() {
        let cache = CacheBuilder::new(10)
            .skip_if(|key| key.contains("?offset="))
            .build_lru::<String>();

        let _held = cache.lookup(PAGE).await;
        let second = tokio::time::timeout(Duration::from_millis(50), cache.lookup(PAGE)).await;
        assert!(second.is_ok());
    }
}

mod ring {
    use super::*;

    #[tokio::test]
    async fn third_insert_overwrites_first() {
        let cache = RingCache::new(2);
        hydrate(&cache, "A", "a").await;
        hydrate(&cache, "B", "b").await;
        hydrate(&cache, "C", "c").await;

        assert!(!is_cached(&cache, "A").await);
        assert!(is_cached(&cache, "B").await);
        assert!(is_cached(&cache, "C").await);
        assert_eq!(cache.len(), 2);
        cache.check_invariants().unwrap();
    }

    #[tokio::test]
    async fn hits_do_not_protect_entries() {
        let cache = RingCache::new(2);
        hydrate(&cache, "A", "a").await;
        hydrate(&cache, "B", "b").await;
        assert!(is_cached(&cache, "A").await);
        hydrate(&cache, "C", "c").await;
        assert!(!cache.contains("A"));
    }
}

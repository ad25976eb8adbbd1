//! Read-through request path.
//!
//! The glue between a request layer and a [`Cache`]: every fetch goes through
//! a lookup, and every lookup is resolved exactly once.
//!
//! ```text
//!   get(key)
//!     lookup(key) ──► hit  ──► close ──► Ok(value)
//!                 └─► miss ──► fetcher.fetch(key)
//!                                ├─ Ok(v)  ──► hydrate(v) ──► Ok(v)
//!                                └─ Err(e) ──► close ──────► Err(e)   (never cached)
//! ```
//!
//! If the returned future is dropped mid-fetch, the open handle is dropped
//! with it and the key is released for the next caller.

use std::fmt;
use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;
use tracing::{debug, trace};

use crate::policy::none::NullCache;
use crate::traits::Cache;

/// Fetches the value for a key from upstream on a miss.
#[async_trait]
pub trait Fetcher<V>: Send + Sync {
    type Error: Send;

    async fn fetch(&self, key: &str) -> Result<V, Self::Error>;
}

/// [`Fetcher`] backed by an async closure taking the key by value.
pub struct FnFetcher<F> {
    f: F,
}

impl<F> FnFetcher<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<V, E, F, Fut> Fetcher<V> for FnFetcher<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<V, E>> + Send,
    V: Send,
    E: Send,
{
    type Error = E;

    async fn fetch(&self, key: &str) -> Result<V, E> {
        (self.f)(key.to_owned()).await
    }
}

impl<F> fmt::Debug for FnFetcher<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnFetcher").finish_non_exhaustive()
    }
}

/// Serves `key` from `cache`, falling back to `fetcher` on a miss and
/// hydrating the cache with the fetched value. Fetch errors are returned and
/// never cached.
pub async fn load_through<V, C, F>(cache: &C, key: &str, fetcher: &F) -> Result<V, F::Error>
where
    V: Clone + Send + 'static,
    C: Cache<V> + ?Sized,
    F: Fetcher<V> + ?Sized,
{
    let mut lookup = cache.lookup(key).await;
    if let Some(value) = lookup.value().cloned() {
        lookup.close();
        trace!(key, "served from cache");
        return Ok(value);
    }

    match fetcher.fetch(key).await {
        Ok(value) => {
            lookup.hydrate(value.clone());
            Ok(value)
        },
        Err(err) => {
            lookup.close();
            debug!(key, "fetch failed, nothing cached");
            Err(err)
        },
    }
}

/// A fetcher bound to a cache.
///
/// Defaults to [`NullCache`], i.e. every `get` goes upstream.
///
/// ```
/// use restcache::policy::lru::LruCache;
/// use restcache::read_through::{FnFetcher, ReadThrough};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let fetcher = FnFetcher::new(|key: String| async move {
///     Ok::<_, std::io::Error>(format!("body of {key}"))
/// });
/// let client = ReadThrough::with_cache(fetcher, LruCache::new(100));
///
/// let body = client.get("https://catalog.test/api/v2/item/1/").await.unwrap();
/// assert_eq!(body, "body of https://catalog.test/api/v2/item/1/");
/// # }
/// ```
pub struct ReadThrough<V, F, C = NullCache> {
    fetcher: F,
    cache: C,
    _value: PhantomData<fn() -> V>,
}

impl<V, F> ReadThrough<V, F, NullCache> {
    /// Uncached: every `get` calls the fetcher.
    pub fn new(fetcher: F) -> Self {
        Self::with_cache(fetcher, NullCache)
    }
}

impl<V, F, C> ReadThrough<V, F, C> {
    pub fn with_cache(fetcher: F, cache: C) -> Self {
        Self {
            fetcher,
            cache,
            _value: PhantomData,
        }
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }
}

impl<V, F, C> ReadThrough<V, F, C>
where
    V: Clone + Send + 'static,
    F: Fetcher<V>,
    C: Cache<V>,
{
    pub async fn get(&self, key: &str) -> Result<V, F::Error> {
        load_through(&self.cache, key, &self.fetcher).await
    }
}

impl<V, F, C: fmt::Debug> fmt::Debug for ReadThrough<V, F, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadThrough")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

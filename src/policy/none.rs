//! Always-miss cache.
//!
//! [`NullCache`] satisfies [`Cache`] for every value type without storing
//! anything or coordinating anything, so callers can turn caching off
//! without branching their call sites.

use async_trait::async_trait;

use crate::lookup::CacheLookup;
use crate::traits::Cache;

/// Cache that never hits. Hydrate and close are no-ops; concurrent lookups of
/// the same key do not wait on each other.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCache;

#[async_trait]
impl<V> Cache<V> for NullCache
where
    V: Send + 'static,
{
    async fn lookup(&self, key: &str) -> CacheLookup<V> {
        CacheLookup::miss(key)
    }
}

//! restcache: single-flight response caches for REST catalog clients.
//!
//! Every cache implements one contract, [`traits::Cache`]: `lookup` a key,
//! get back a [`lookup::CacheLookup`], and resolve it exactly once with
//! `hydrate` (store a freshly fetched value) or `close` (store nothing).
//! While a handle is open its key is held, so concurrent requests for the
//! same resource cost one upstream fetch.
//!
//! | Strategy                          | Module            |
//! |-----------------------------------|-------------------|
//! | always miss                       | [`policy::none`]  |
//! | fixed ring                        | [`policy::ring`]  |
//! | LRU with TTL and skip predicate   | [`policy::lru`]   |
//! | adapter over a get/put store      | [`policy::wrapper`] |
//!
//! [`read_through`] wires a cache to an upstream fetcher.

pub mod builder;
pub mod clock;
pub mod ds;
pub mod error;
pub mod lookup;
pub mod policy;
pub mod read_through;

#[cfg(feature = "metrics")]
pub mod metrics;

pub mod prelude;
pub mod traits;

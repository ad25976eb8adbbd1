//! Error types for restcache.
//!
//! The cache contract itself is infallible: lookups, hydrations and closes
//! never fail, and a miss is reported through the lookup handle rather than
//! an error. The two types here cover the edges around that contract.
//!
//! ## Key Components
//!
//! - [`ConfigError`]: returned when a [`CacheBuilder`](crate::builder::CacheBuilder)
//!   is asked to build a policy with options that policy cannot honour (e.g. a
//!   TTL on a ring cache).
//! - [`InvariantError`]: returned by `check_invariants` when the lookup map and
//!   eviction list (or the ring slots) disagree.
//!
//! ## Example Usage
//!
//! ```
//! use std::time::Duration;
//!
//! use restcache::builder::{CacheBuilder, CachePolicy};
//! use restcache::error::ConfigError;
//!
//! let err: ConfigError = CacheBuilder::new(16)
//!     .ttl(Duration::from_secs(60))
//!     .try_build::<String>(CachePolicy::Ring)
//!     .err()
//!     .unwrap();
//! assert!(err.to_string().contains("ttl"));
//! ```

use std::fmt;

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when internal cache invariants are violated.
///
/// Produced by `check_invariants` on
/// [`LruCore`](crate::policy::lru::LruCore) and
/// [`FixedRing`](crate::ds::fixed_ring::FixedRing). Carries a human-readable
/// description of which invariant failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvariantError {}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when cache options are inconsistent with the chosen policy.
///
/// Produced by [`CacheBuilder::try_build`](crate::builder::CacheBuilder::try_build).
/// Non-positive capacities are not an error: every policy falls back to its
/// documented default instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ConfigError {}

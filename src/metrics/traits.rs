//! # Metrics Traits
//!
//! Recording, snapshotting and export are separate, small traits so that
//! cache code only ever writes counters and monitoring code only ever reads
//! them.
//!
//! ```text
//!   ┌─────────────────────────────┐
//!   │    LookupMetricsRecorder    │   written by the caches, &self only
//!   │  lookup/hit/miss/skip       │
//!   │  hydration/eviction/expiry  │
//!   └──────────────┬──────────────┘
//!                  │
//!   Consumption (decoupled from recording):
//!   ┌──────────────────────────────┐    ┌──────────────────────────────┐
//!   │ MetricsSnapshotProvider<S>   │    │ MetricsExporter<S>           │
//!   │ (bench/test)                 │    │ (production monitoring)      │
//!   └──────────────────────────────┘    └──────────────────────────────┘
//! ```
//!
//! Recorders take `&self`: every cache is shared across tasks and the
//! counters live outside the cache-wide lock.

/// Counters shared by every coordinating cache.
pub trait LookupMetricsRecorder {
    fn record_lookup(&self);
    fn record_hit(&self);
    fn record_miss(&self);
    /// A lookup bypassed by the skip predicate. Also counted as a miss.
    fn record_skip(&self);
    fn record_hydration(&self);
    fn record_evictions(&self, count: u64);
    fn record_expirations(&self, count: u64);
    fn record_sweep(&self);
}

/// Snapshot provider for bench/testing.
pub trait MetricsSnapshotProvider<S> {
    fn snapshot(&self) -> S;
}

/// Reset metrics between tests or benchmark iterations.
pub trait MetricsReset {
    fn reset_metrics(&self);
}

/// Export/publish metrics to production monitoring backends.
pub trait MetricsExporter<S> {
    fn export(&self, snapshot: &S);
}

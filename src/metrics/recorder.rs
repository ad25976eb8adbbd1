//! Atomic lookup counters.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::metrics::snapshot::CacheMetricsSnapshot;
use crate::metrics::traits::{LookupMetricsRecorder, MetricsReset};

/// Per-cache counters. Relaxed ordering: the counters are observational and
/// never synchronise anything.
#[derive(Debug, Default)]
pub struct LookupMetrics {
    lookups: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    skipped: AtomicU64,
    hydrations: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
    sweeps: AtomicU64,
}

impl LookupMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads every counter; `cache_len` and `capacity` are gauges supplied by
    /// the owning cache.
    pub fn snapshot(&self, cache_len: usize, capacity: usize) -> CacheMetricsSnapshot {
        CacheMetricsSnapshot {
            lookups: self.lookups.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            hydrations: self.hydrations.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            sweeps: self.sweeps.load(Ordering::Relaxed),
            cache_len,
            capacity,
        }
    }
}

impl LookupMetricsRecorder for LookupMetrics {
    #[inline]
    fn record_lookup(&self) {
        self.lookups.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    fn record_skip(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    fn record_hydration(&self) {
        self.hydrations.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    fn record_evictions(&self, count: u64) {
        if count > 0 {
            self.evictions.fetch_add(count, Ordering::Relaxed);
        }
    }

    #[inline]
    fn record_expirations(&self, count: u64) {
        if count > 0 {
            self.expirations.fetch_add(count, Ordering::Relaxed);
        }
    }

    #[inline]
    fn record_sweep(&self) {
        self.sweeps.fetch_add(1, Ordering::Relaxed);
    }
}

impl MetricsReset for LookupMetrics {
    fn reset_metrics(&self) {
        for counter in [
            &self.lookups,
            &self.hits,
            &self.misses,
            &self.skipped,
            &self.hydrations,
            &self.evictions,
            &self.expirations,
            &self.sweeps,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

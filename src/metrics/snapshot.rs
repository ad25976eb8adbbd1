/// Point-in-time copy of a cache's counters plus size gauges.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheMetricsSnapshot {
    pub lookups: u64,
    pub hits: u64,
    pub misses: u64,
    pub skipped: u64, // bypassed by the skip predicate, also counted in misses

    pub hydrations: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub sweeps: u64,

    // gauges captured at snapshot time
    pub cache_len: usize,
    pub capacity: usize,
}

impl CacheMetricsSnapshot {
    /// Hit rate in `0.0..=1.0`; zero before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_rate_handles_empty_and_mixed() {
        assert_eq!(CacheMetricsSnapshot::default().hit_rate(), 0.0);
        let snap = CacheMetricsSnapshot {
            hits: 3,
            misses: 1,
            ..Default::default()
        };
        assert!((snap.hit_rate() - 0.75).abs() < f64::EPSILON);
    }
}

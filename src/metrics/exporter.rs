use std::io::Write;

use parking_lot::Mutex;

use crate::metrics::snapshot::CacheMetricsSnapshot;
use crate::metrics::traits::MetricsExporter;

/// Prometheus text exporter for cache metrics snapshots.
///
/// This exporter writes in the Prometheus text exposition format so it can be
/// scraped by Prometheus or forwarded to an OpenTelemetry collector. Write
/// errors are dropped; metrics never fail the caller.
#[derive(Debug)]
pub struct PrometheusTextExporter<W: Write + Send + Sync> {
    prefix: String,
    writer: Mutex<W>,
}

impl<W: Write + Send + Sync> PrometheusTextExporter<W> {
    pub fn new(prefix: impl Into<String>, writer: W) -> Self {
        Self {
            prefix: prefix.into(),
            writer: Mutex::new(writer),
        }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    fn write_metric(&self, kind: &str, name: &str, value: u64) {
        let mut writer = self.writer.lock();
        let _ = writeln!(writer, "# TYPE {} {}", name, kind);
        let _ = writeln!(writer, "{} {}", name, value);
    }

    fn write_counter(&self, suffix: &str, value: u64) {
        self.write_metric("counter", &self.metric_name(suffix), value);
    }

    fn write_gauge(&self, suffix: &str, value: u64) {
        self.write_metric("gauge", &self.metric_name(suffix), value);
    }

    fn metric_name(&self, suffix: &str) -> String {
        if self.prefix.is_empty() {
            suffix.to_string()
        } else {
            format!("{}_{}", self.prefix, suffix)
        }
    }
}

impl<W: Write + Send + Sync> MetricsExporter<CacheMetricsSnapshot> for PrometheusTextExporter<W> {
    fn export(&self, snapshot: &CacheMetricsSnapshot) {
        self.write_counter("lookups_total", snapshot.lookups);
        self.write_counter("hits_total", snapshot.hits);
        self.write_counter("misses_total", snapshot.misses);
        self.write_counter("skipped_total", snapshot.skipped);
        self.write_counter("hydrations_total", snapshot.hydrations);
        self.write_counter("evictions_total", snapshot.evictions);
        self.write_counter("expirations_total", snapshot.expirations);
        self.write_counter("sweeps_total", snapshot.sweeps);
        self.write_gauge("cache_len", snapshot.cache_len as u64);
        self.write_gauge("capacity", snapshot.capacity as u64);
    }
}

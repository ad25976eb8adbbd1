pub mod exporter;
pub mod recorder;
pub mod snapshot;
pub mod traits;

pub use exporter::PrometheusTextExporter;
pub use recorder::LookupMetrics;
pub use snapshot::CacheMetricsSnapshot;
pub use traits::{LookupMetricsRecorder, MetricsExporter, MetricsReset, MetricsSnapshotProvider};

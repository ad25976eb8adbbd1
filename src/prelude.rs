pub use crate::builder::{CacheBuilder, CachePolicy};
pub use crate::clock::{Clock, ManualClock, SystemClock};
pub use crate::error::{ConfigError, InvariantError};
pub use crate::lookup::{CacheLookup, LookupState};
#[cfg(feature = "metrics")]
pub use crate::metrics::{CacheMetricsSnapshot, MetricsSnapshotProvider};
pub use crate::policy::lru::{LruCache, LruCore};
pub use crate::policy::none::NullCache;
pub use crate::policy::ring::RingCache;
pub use crate::policy::wrapper::{FnStore, WrapperCache};
pub use crate::read_through::{FnFetcher, Fetcher, ReadThrough, load_through};
pub use crate::traits::{BackingStore, Cache, SharedCache};

pub mod config;
pub mod error;
pub mod logging;
pub mod observability;
pub mod storage;

pub use self::config::{ConfigStore, Configurable};
pub use error::{Error, Result};
pub use observability::{InMemoryMetrics, MetricsSink, NoopMetrics};
pub use storage::{KeyValueStore, SharedStore, StorageConfig};

// Convenience re-exports: use counter_signals::prelude::*;
pub use crate::App;

pub use crate::core::logging::{LogConfig, init_logging};
pub use crate::core::{ConfigStore, Configurable, Error, KeyValueStore, Result};

pub use crate::counter::{Counter, IncrementMode};
pub use crate::server::{AppState, Server, ServerConfig};

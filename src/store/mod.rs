use std::sync::Arc;

use crate::core::error::Result;
use crate::core::storage::{Backend, SharedStore, StorageConfig};

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Open the backend selected by `[storage] backend`.
pub async fn open(config: &StorageConfig) -> Result<SharedStore> {
    let store: SharedStore = match config.backend {
        Backend::Sqlite => Arc::new(SqliteStore::open(config).await?),
        Backend::Memory => {
            tracing::warn!("Using in-memory storage; the count is lost on exit");
            Arc::new(MemoryStore::new())
        }
    };
    Ok(store)
}

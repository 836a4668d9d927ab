use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::core::error::{Error, Result};
use crate::core::storage::{KeyValueStore, parse_integer};

/// In-memory store for tests and throwaway runs.
///
/// Nothing is persisted; values vanish with the process.
#[derive(Default)]
pub struct MemoryStore {
    values: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).map(|v| v.value().clone()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn increment(&self, key: &str, delta: i64) -> Result<i64> {
        // The entry guard holds the shard lock for the whole read-modify-write.
        match self.values.entry(key.to_string()) {
            Entry::Occupied(mut entry) => {
                let current = parse_integer(key, entry.get())?;
                let next = current.checked_add(delta).ok_or_else(|| Error::Overflow {
                    key: key.to_string(),
                })?;
                entry.insert(next.to_string());
                Ok(next)
            }
            Entry::Vacant(entry) => {
                entry.insert(delta.to_string());
                Ok(delta)
            }
        }
    }
}

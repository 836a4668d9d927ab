//! Key-value storage contract.
//!
//! Handlers only see [`KeyValueStore`], so SQLite and the in-memory map are
//! interchangeable.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::core::config::Configurable;
use crate::core::error::{Error, Result};

#[async_trait]
pub trait KeyValueStore: Send + Sync + 'static {
    /// Read the value stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Insert or replace the value stored under `key`.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Add `delta` to the integer stored under `key` in one atomic step and
    /// return the new value. A missing key counts as zero.
    async fn increment(&self, key: &str, delta: i64) -> Result<i64>;

    /// Release the backing resource.
    async fn close(&self) {}
}

pub type SharedStore = Arc<dyn KeyValueStore>;

/// Parse a stored value as an integer.
///
/// Only canonical decimal text is accepted (no sign prefix `+`, no padding,
/// no leading zeros), matching what the SQLite increment guard accepts.
pub fn parse_integer(key: &str, value: &str) -> Result<i64> {
    value
        .parse::<i64>()
        .ok()
        .filter(|n| n.to_string() == value)
        .ok_or_else(|| Error::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Sqlite,
    Memory,
}

/// `[storage]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: Backend,
    /// Database file, relative to the working directory
    pub path: PathBuf,
    pub max_connections: u32,
    /// Use write-ahead logging instead of the rollback journal
    pub wal: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Sqlite,
            path: PathBuf::from("persist/sqlite.db"),
            max_connections: 5,
            wal: false,
        }
    }
}

impl Configurable for StorageConfig {
    const PREFIX: &'static str = "storage";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ConfigStore;

    #[test]
    fn parses_integers_and_rejects_garbage() {
        assert_eq!(parse_integer("count", "5").unwrap(), 5);
        assert_eq!(parse_integer("count", "-3").unwrap(), -3);
        assert_eq!(parse_integer("count", "0").unwrap(), 0);
        for raw in ["five", "", "05", "+5", " 5", "5 ", "-0", "1e3"] {
            assert!(
                matches!(parse_integer("count", raw), Err(Error::InvalidValue { .. })),
                "{raw:?}"
            );
        }
    }

    #[test]
    fn storage_section_defaults() {
        let config: StorageConfig = ConfigStore::empty().get().unwrap();
        assert_eq!(config.backend, Backend::Sqlite);
        assert_eq!(config.path, PathBuf::from("persist/sqlite.db"));

        let store = ConfigStore::parse("[storage]\nbackend = \"memory\"\n").unwrap();
        let config: StorageConfig = store.get().unwrap();
        assert_eq!(config.backend, Backend::Memory);
        assert_eq!(config.max_connections, 5);
    }
}

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use crate::core::error::{Error, Result};
use crate::core::storage::{KeyValueStore, StorageConfig, parse_integer};

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS key_value (
    key TEXT NOT NULL PRIMARY KEY,
    value,
    UNIQUE(key)
)";

const SELECT_VALUE: &str = "SELECT CAST(value AS TEXT) FROM key_value WHERE key = ?";

const UPSERT_VALUE: &str = "INSERT OR REPLACE INTO key_value (key, value) VALUES (?, ?)";

// The update is skipped (no row returned) when the stored value is not a
// canonical integer or the addition would leave the i64 range.
const INCREMENT_VALUE: &str = "INSERT INTO key_value (key, value) VALUES (?1, CAST(?2 AS TEXT))
    ON CONFLICT(key) DO UPDATE
        SET value = CAST(CAST(key_value.value AS INTEGER) + ?2 AS TEXT)
        WHERE CAST(CAST(key_value.value AS INTEGER) AS TEXT) = CAST(key_value.value AS TEXT)
          AND typeof(CAST(key_value.value AS INTEGER) + ?2) = 'integer'
    RETURNING CAST(value AS INTEGER)";

/// Key-value store on a SQLite file.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) the database file and its table.
    pub async fn open(config: &StorageConfig) -> Result<Self> {
        if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let journal_mode = if config.wal {
            SqliteJournalMode::Wal
        } else {
            SqliteJournalMode::Delete
        };
        let options = SqliteConnectOptions::new()
            .filename(&config.path)
            .create_if_missing(true)
            .journal_mode(journal_mode);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.create_table().await?;
        info!(
            path = %config.path.display(),
            max_connections = config.max_connections,
            wal = config.wal,
            "Opened SQLite store"
        );
        Ok(store)
    }

    /// A private in-memory database on a single pinned connection.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.create_table().await?;
        Ok(store)
    }

    async fn create_table(&self) -> Result<()> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let value = sqlx::query_scalar::<_, Option<String>>(SELECT_VALUE)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value.flatten())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(UPSERT_VALUE)
            .bind(key)
            .bind(value)
            .execute(&self.pool)
            .await?;
        debug!(key, value, "Stored value");
        Ok(())
    }

    async fn increment(&self, key: &str, delta: i64) -> Result<i64> {
        let updated = sqlx::query_scalar::<_, i64>(INCREMENT_VALUE)
            .bind(key)
            .bind(delta)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(value) = updated {
            debug!(key, value, "Incremented value");
            return Ok(value);
        }

        // Update was refused; report why.
        let current = self.get(key).await?.unwrap_or_default();
        parse_integer(key, &current)?;
        Err(Error::Overflow {
            key: key.to_string(),
        })
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("SQLite store closed");
    }
}

//! Read and increment the stored count.

use serde::Deserialize;
use tracing::{debug, warn};

use crate::core::config::Configurable;
use crate::core::error::{Error, Result};
use crate::core::storage::{SharedStore, parse_integer};
use crate::counter::signals::Signals;

/// Key the count is stored under.
pub const COUNT_KEY: &str = "count";

/// How a `PUT /count` derives the new value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncrementMode {
    /// The store adds one to its own value in a single statement.
    #[default]
    Atomic,
    /// The new value is the client's `count` signal plus one.
    ///
    /// Two clients holding the same count both write the same result, so
    /// concurrent increments can be lost.
    ClientEcho,
}

impl IncrementMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncrementMode::Atomic => "atomic",
            IncrementMode::ClientEcho => "client_echo",
        }
    }
}

/// `[counter]` section
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CounterConfig {
    pub mode: IncrementMode,
}

impl Configurable for CounterConfig {
    const PREFIX: &'static str = "counter";
}

pub struct Counter {
    store: SharedStore,
    mode: IncrementMode,
}

impl Counter {
    pub fn new(store: SharedStore, mode: IncrementMode) -> Self {
        if mode == IncrementMode::ClientEcho {
            warn!("Counter trusts client-sent counts; concurrent increments may be lost");
        }
        Self { store, mode }
    }

    pub fn mode(&self) -> IncrementMode {
        self.mode
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// The stored count, or `None` before the first increment.
    pub async fn current(&self) -> Result<Option<i64>> {
        self.store
            .get(COUNT_KEY)
            .await?
            .map(|value| parse_integer(COUNT_KEY, &value))
            .transpose()
    }

    /// Increment the count and return the new value.
    pub async fn increment(&self, signals: &Signals) -> Result<i64> {
        match self.mode {
            IncrementMode::Atomic => {
                let next = self.store.increment(COUNT_KEY, 1).await?;
                if let Some(client) = signals.count {
                    if client.checked_add(1) != Some(next) {
                        debug!(client_count = client, count = next, "Client count was stale");
                    }
                }
                Ok(next)
            }
            IncrementMode::ClientEcho => {
                let client = signals.count.ok_or(Error::MissingSignal(COUNT_KEY))?;
                let next = client.checked_add(1).ok_or_else(|| Error::Overflow {
                    key: COUNT_KEY.to_string(),
                })?;
                self.store.set(COUNT_KEY, &next.to_string()).await?;
                Ok(next)
            }
        }
    }
}

//! Structured logging setup.

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use serde::Deserialize;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::DefaultFields, time::ChronoLocal},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
};

use crate::core::config::Configurable;

/// `[log]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive used when `RUST_LOG` is not set
    pub level: String,
    /// Emit JSON lines instead of human readable output
    pub json: bool,
    /// Also write logs to daily rolling files in this directory
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info,tower_http=debug".to_string(),
            json: false,
            directory: None,
            file_prefix: "counter-signals.log".to_string(),
        }
    }
}

impl Configurable for LogConfig {
    const PREFIX: &'static str = "log";
}

/// Install the global subscriber.
///
/// The returned guard flushes the file writer on drop and must be held for
/// the lifetime of the process.
pub fn init_logging(config: &LogConfig) -> Result<Option<WorkerGuard>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let (writer, guard) = match &config.directory {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, &config.file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };

    let installed = if config.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_current_span(true))
            .with(file_layer(writer))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_timer(ChronoLocal::rfc_3339()))
            .with(file_layer(writer))
            .try_init()
    };
    installed.map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))?;

    tracing::info!(
        level = %config.level,
        json = config.json,
        directory = ?config.directory,
        "Logging initialized"
    );
    Ok(guard)
}

fn file_layer<S>(
    writer: Option<NonBlocking>,
) -> Option<fmt::Layer<S, DefaultFields, fmt::format::Format, NonBlocking>>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    writer.map(|w| fmt::layer().with_ansi(false).with_writer(w))
}

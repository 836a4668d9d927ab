//! Application assembly.
//!
//! Reads every configuration section, opens the store and hands the owned
//! resources to the server. Nothing lives in process-global state.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::core::config::ConfigStore;
use crate::core::error::Result;
use crate::core::observability::{
    InMemoryMetrics, MetricsConfig, MetricsSink, NoopMetrics, spawn_metrics_log_reporter,
};
use crate::core::storage::StorageConfig;
use crate::counter::{Counter, CounterConfig, ViewConfig};
use crate::server::{AppState, Server, ServerConfig};
use crate::store;

pub struct App {
    server_config: ServerConfig,
    state: AppState,
    metrics: Option<Arc<InMemoryMetrics>>,
    report_interval: Duration,
}

impl App {
    /// Build the application from configuration.
    pub async fn from_config(config: &ConfigStore) -> Result<Self> {
        let server_config: ServerConfig = config.get()?;
        let storage: StorageConfig = config.get()?;
        let counter_config: CounterConfig = config.get()?;
        let view: ViewConfig = config.get()?;
        let metrics_config: MetricsConfig = config.get()?;

        let store = store::open(&storage).await?;
        let counter = Counter::new(store, counter_config.mode);

        let metrics = metrics_config
            .enabled
            .then(|| Arc::new(InMemoryMetrics::new()));
        let sink: Arc<dyn MetricsSink> = match &metrics {
            Some(metrics) => metrics.clone(),
            None => Arc::new(NoopMetrics),
        };

        info!(
            backend = ?storage.backend,
            mode = counter.mode().as_str(),
            metrics = metrics_config.enabled,
            "Application configured"
        );

        Ok(Self {
            server_config,
            state: AppState {
                counter: Arc::new(counter),
                view: Arc::new(view),
                metrics: sink,
            },
            metrics,
            report_interval: Duration::from_secs(metrics_config.report_interval_secs),
        })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn metrics(&self) -> Option<&Arc<InMemoryMetrics>> {
        self.metrics.as_ref()
    }

    /// Run the server until shutdown.
    pub async fn run(self) -> Result<()> {
        let reporter = match &self.metrics {
            Some(metrics) if !self.report_interval.is_zero() => Some(spawn_metrics_log_reporter(
                metrics.clone(),
                self.report_interval,
            )),
            _ => None,
        };

        let result = Server::new(self.server_config, self.state).run().await;

        if let Some(reporter) = reporter {
            reporter.abort();
        }
        result
    }
}

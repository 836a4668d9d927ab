use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use dashmap::DashMap;
use serde::Deserialize;
use tokio::task::JoinHandle;

use crate::core::config::Configurable;

pub type Labels<'a> = &'a [(&'a str, &'a str)];

pub const PAGE_RENDERS_TOTAL: &str = "count_page_renders_total";
pub const INCREMENTS_TOTAL: &str = "count_increments_total";
pub const ERRORS_TOTAL: &str = "count_errors_total";
pub const INCREMENT_DURATION_MS: &str = "count_increment_duration_ms";

/// `[metrics]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    /// Seconds between log reports; 0 disables the reporter
    pub report_interval_secs: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            report_interval_secs: 60,
        }
    }
}

impl Configurable for MetricsConfig {
    const PREFIX: &'static str = "metrics";
}

pub trait MetricsSink: Send + Sync + 'static {
    fn incr_counter(&self, name: &str, value: u64, labels: Labels<'_>);
    fn observe_duration_ms(&self, name: &str, duration_ms: u64, labels: Labels<'_>);
}

#[derive(Default)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn incr_counter(&self, _name: &str, _value: u64, _labels: Labels<'_>) {}

    fn observe_duration_ms(&self, _name: &str, _duration_ms: u64, _labels: Labels<'_>) {}
}

#[derive(Default)]
pub struct InMemoryMetrics {
    counters: DashMap<String, u64>,
    duration_sum_ms: DashMap<String, u64>,
    duration_count: DashMap<String, u64>,
}

impl InMemoryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counter(&self, name: &str, labels: Labels<'_>) -> u64 {
        self.counters
            .get(&format_metric_key(name, labels))
            .map_or(0, |v| *v.value())
    }

    /// Sum and sample count of a duration series.
    pub fn duration(&self, name: &str, labels: Labels<'_>) -> (u64, u64) {
        let key = format_metric_key(name, labels);
        let sum = self.duration_sum_ms.get(&key).map_or(0, |v| *v.value());
        let count = self.duration_count.get(&key).map_or(0, |v| *v.value());
        (sum, count)
    }

    fn log_report(&self) {
        let mut counters: Vec<_> = self
            .counters
            .iter()
            .map(|entry| format!("{}={}", entry.key(), entry.value()))
            .collect();
        counters.sort();

        let mut durations: Vec<_> = self
            .duration_sum_ms
            .iter()
            .map(|entry| {
                let count = self.duration_count.get(entry.key()).map_or(0, |v| *v.value());
                format!("{} sum_ms={} count={}", entry.key(), entry.value(), count)
            })
            .collect();
        durations.sort();

        if !counters.is_empty() {
            tracing::info!(?counters, "metrics.counters");
        }
        if !durations.is_empty() {
            tracing::info!(?durations, "metrics.durations");
        }
    }
}

impl MetricsSink for InMemoryMetrics {
    fn incr_counter(&self, name: &str, value: u64, labels: Labels<'_>) {
        let key = format_metric_key(name, labels);
        self.counters
            .entry(key)
            .and_modify(|v| *v = v.saturating_add(value))
            .or_insert(value);
    }

    fn observe_duration_ms(&self, name: &str, duration_ms: u64, labels: Labels<'_>) {
        let key = format_metric_key(name, labels);

        self.duration_sum_ms
            .entry(key.clone())
            .and_modify(|v| *v = v.saturating_add(duration_ms))
            .or_insert(duration_ms);

        self.duration_count
            .entry(key)
            .and_modify(|v| *v = v.saturating_add(1))
            .or_insert(1);
    }
}

pub fn spawn_metrics_log_reporter(
    metrics: Arc<InMemoryMetrics>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            metrics.log_report();
        }
    })
}

pub fn format_metric_key(name: &str, labels: Labels<'_>) -> String {
    if labels.is_empty() {
        return name.to_string();
    }

    let mut labels_vec: Vec<_> = labels.iter().map(|(k, v)| (*k, *v)).collect();
    labels_vec.sort_by(|a, b| a.0.cmp(b.0));

    let mut out = String::with_capacity(name.len() + labels_vec.len() * 12);
    out.push_str(name);
    out.push('{');

    for (idx, (k, v)) in labels_vec.iter().enumerate() {
        if idx > 0 {
            out.push(',');
        }
        out.push_str(k);
        out.push('=');
        out.push_str(v);
    }

    out.push('}');
    out
}

pub fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

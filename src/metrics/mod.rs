/*!
 * # Metrics Module
 *
 * In-process metrics for the billing service.
 *
 * Counters, gauges and histograms live in a global [`MetricsRegistry`] and are
 * exposed as:
 * - Prometheus text format at `/metrics`
 * - JSON format at `/metrics/json`
 */

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use dashmap::DashMap;
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::error;

pub const INVOICES_CREATED_TOTAL: &str = "invoices_created_total";
pub const IMPORT_LINES_SUCCESS_TOTAL: &str = "invoice_import_lines_success_total";
pub const IMPORT_LINES_FAILED_TOTAL: &str = "invoice_import_lines_failed_total";
pub const IMPORT_LINE_DURATION_SECONDS: &str = "invoice_import_line_duration_seconds";
pub const IMPORT_FILES_TOTAL: &str = "invoice_import_files_total";
pub const IMPORT_DURATION_SECONDS: &str = "invoice_import_duration_seconds";

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Failed to export metrics: {0}")]
    ExportError(String),
}

impl IntoResponse for MetricsError {
    fn into_response(self) -> Response {
        error!("{}", self);
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Counter {
    value: Arc<AtomicU64>,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_by(&self, value: u64) {
        self.value.fetch_add(value, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Stores an `f64` as its bit pattern.
#[derive(Debug, Clone, Default)]
pub struct Gauge {
    bits: Arc<AtomicU64>,
}

impl Gauge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, value: f64) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
    }

    pub fn get(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }
}

#[derive(Debug, Clone, Default)]
pub struct Histogram {
    sum_bits: Arc<AtomicU64>,
    count: Arc<AtomicU64>,
}

impl Histogram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&self, value: f64) {
        let _ = self
            .sum_bits
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |bits| {
                Some((f64::from_bits(bits) + value).to_bits())
            });
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn observe_duration(&self, duration: Duration) {
        self.observe(duration.as_secs_f64());
    }

    pub fn get_count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn get_sum(&self) -> f64 {
        f64::from_bits(self.sum_bits.load(Ordering::Relaxed))
    }
}

#[derive(Debug, Default)]
pub struct MetricsRegistry {
    counters: DashMap<String, Counter>,
    gauges: DashMap<String, Gauge>,
    histograms: DashMap<String, Histogram>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create_counter(&self, name: &str) -> Counter {
        self.counters
            .entry(name.to_string())
            .or_insert_with(Counter::new)
            .clone()
    }

    pub fn get_or_create_gauge(&self, name: &str) -> Gauge {
        self.gauges
            .entry(name.to_string())
            .or_insert_with(Gauge::new)
            .clone()
    }

    pub fn get_or_create_histogram(&self, name: &str) -> Histogram {
        self.histograms
            .entry(name.to_string())
            .or_insert_with(Histogram::new)
            .clone()
    }

    /// Prometheus text exposition, metric families sorted by name.
    pub fn export_metrics(&self) -> Result<String, MetricsError> {
        use std::fmt::Write;

        let mut output = String::new();
        let write_err = |e: std::fmt::Error| MetricsError::ExportError(e.to_string());

        let mut counters: Vec<(String, u64)> = self
            .counters
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().get()))
            .collect();
        counters.sort();
        for (name, value) in counters {
            writeln!(output, "# TYPE {} counter", name).map_err(write_err)?;
            writeln!(output, "{} {}", name, value).map_err(write_err)?;
        }

        let mut gauges: Vec<(String, f64)> = self
            .gauges
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().get()))
            .collect();
        gauges.sort_by(|a, b| a.0.cmp(&b.0));
        for (name, value) in gauges {
            writeln!(output, "# TYPE {} gauge", name).map_err(write_err)?;
            writeln!(output, "{} {}", name, value).map_err(write_err)?;
        }

        let mut histograms: Vec<(String, u64, f64)> = self
            .histograms
            .iter()
            .map(|entry| {
                (
                    entry.key().clone(),
                    entry.value().get_count(),
                    entry.value().get_sum(),
                )
            })
            .collect();
        histograms.sort_by(|a, b| a.0.cmp(&b.0));
        for (name, count, sum) in histograms {
            writeln!(output, "# TYPE {} histogram", name).map_err(write_err)?;
            writeln!(output, "{}_count {}", name, count).map_err(write_err)?;
            writeln!(output, "{}_sum {}", name, sum).map_err(write_err)?;
        }

        Ok(output)
    }

    pub fn export_metrics_json(&self) -> serde_json::Value {
        let mut counters = serde_json::Map::new();
        for entry in self.counters.iter() {
            counters.insert(entry.key().clone(), json!(entry.value().get()));
        }

        let mut gauges = serde_json::Map::new();
        for entry in self.gauges.iter() {
            gauges.insert(entry.key().clone(), json!(entry.value().get()));
        }

        let mut histograms = serde_json::Map::new();
        for entry in self.histograms.iter() {
            histograms.insert(
                entry.key().clone(),
                json!({
                    "count": entry.value().get_count(),
                    "sum": entry.value().get_sum(),
                }),
            );
        }

        json!({
            "counters": counters,
            "gauges": gauges,
            "histograms": histograms,
        })
    }
}

// Global metrics registry
lazy_static::lazy_static! {
    pub static ref METRICS: MetricsRegistry = MetricsRegistry::new();
}

/// Handles on the billing counters so hot paths skip the registry lookup.
pub struct BillingMetrics {
    pub invoices_created: Counter,
    pub import_lines_success: Counter,
    pub import_lines_failed: Counter,
    pub import_line_duration: Histogram,
    pub import_files: Counter,
    pub import_duration: Histogram,
}

impl BillingMetrics {
    pub fn new() -> Self {
        Self {
            invoices_created: METRICS.get_or_create_counter(INVOICES_CREATED_TOTAL),
            import_lines_success: METRICS.get_or_create_counter(IMPORT_LINES_SUCCESS_TOTAL),
            import_lines_failed: METRICS.get_or_create_counter(IMPORT_LINES_FAILED_TOTAL),
            import_line_duration: METRICS.get_or_create_histogram(IMPORT_LINE_DURATION_SECONDS),
            import_files: METRICS.get_or_create_counter(IMPORT_FILES_TOTAL),
            import_duration: METRICS.get_or_create_histogram(IMPORT_DURATION_SECONDS),
        }
    }

    pub fn record_invoice_created(&self) {
        self.invoices_created.inc();
    }

    pub fn record_import_line(&self, succeeded: bool, elapsed: Duration) {
        if succeeded {
            self.import_lines_success.inc();
        } else {
            self.import_lines_failed.inc();
        }
        self.import_line_duration.observe_duration(elapsed);
    }

    pub fn record_import_file(&self, elapsed: Duration) {
        self.import_files.inc();
        self.import_duration.observe_duration(elapsed);
    }
}

impl Default for BillingMetrics {
    fn default() -> Self {
        Self::new()
    }
}

lazy_static::lazy_static! {
    pub static ref BILLING_METRICS: BillingMetrics = BillingMetrics::new();
}

/// `GET /metrics`
pub async fn metrics_handler() -> Result<Response, MetricsError> {
    let body = METRICS.export_metrics()?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response())
}

/// `GET /metrics/json`
pub async fn metrics_json_handler() -> Json<serde_json::Value> {
    Json(METRICS.export_metrics_json())
}

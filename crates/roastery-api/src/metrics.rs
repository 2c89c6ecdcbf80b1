//! Prometheus metrics registry
//!
//! HTTP request metrics are recorded by the metrics middleware; operation
//! metrics by [`crate::operation::track`].

use lazy_static::lazy_static;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use std::time::Duration;

const LATENCY_BUCKETS: &[f64] = &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0];

lazy_static! {
    /// Registry backing the `/metrics` endpoint
    pub static ref REGISTRY: Registry = {
        let registry = Registry::new_custom(Some("roastery".to_string()), None)
            .unwrap_or_else(|_| Registry::new());
        for collector in collectors() {
            if let Err(e) = registry.register(collector) {
                tracing::warn!(error = %e, "Failed to register metric");
            }
        }
        register_process_collector(&registry);
        registry
    };

    static ref HTTP_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("http_requests_total", "HTTP requests by method, endpoint and status"),
        &["method", "endpoint", "status"],
    )
    .unwrap();

    static ref HTTP_REQUEST_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new("http_request_duration_seconds", "HTTP request latency")
            .buckets(LATENCY_BUCKETS.to_vec()),
        &["method", "endpoint"],
    )
    .unwrap();

    static ref OPERATIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("operations_total", "Service operations by name, kind and outcome"),
        &["name", "kind", "outcome"],
    )
    .unwrap();

    static ref OPERATION_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new("operation_duration_seconds", "Service operation latency")
            .buckets(LATENCY_BUCKETS.to_vec()),
        &["name", "kind"],
    )
    .unwrap();

    static ref UPTIME_SECONDS: IntGauge =
        IntGauge::new("uptime_seconds", "Time since server start").unwrap();
}

fn collectors() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(HTTP_REQUESTS_TOTAL.clone()),
        Box::new(HTTP_REQUEST_DURATION.clone()),
        Box::new(OPERATIONS_TOTAL.clone()),
        Box::new(OPERATION_DURATION.clone()),
        Box::new(UPTIME_SECONDS.clone()),
    ]
}

#[cfg(target_os = "linux")]
fn register_process_collector(registry: &Registry) {
    let collector = prometheus::process_collector::ProcessCollector::for_self();
    if let Err(e) = registry.register(Box::new(collector)) {
        tracing::warn!(error = %e, "Failed to register process metrics");
    }
}

#[cfg(not(target_os = "linux"))]
fn register_process_collector(_registry: &Registry) {}

/// Record a completed HTTP request
pub fn record_http_request(method: &str, endpoint: &str, status: u16, elapsed: Duration) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, endpoint, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION
        .with_label_values(&[method, endpoint])
        .observe(elapsed.as_secs_f64());
}

/// Count an operation outcome
pub fn record_operation(name: &str, kind: &str, success: bool) {
    let outcome = if success { "success" } else { "error" };
    OPERATIONS_TOTAL
        .with_label_values(&[name, kind, outcome])
        .inc();
}

/// Record operation latency
pub fn record_operation_time(name: &str, kind: &str, elapsed: Duration) {
    OPERATION_DURATION
        .with_label_values(&[name, kind])
        .observe(elapsed.as_secs_f64());
}

/// Render all metrics in the Prometheus text format
pub fn render(uptime_secs: u64) -> Result<String, prometheus::Error> {
    UPTIME_SECONDS.set(i64::try_from(uptime_secs).unwrap_or(i64::MAX));

    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&REGISTRY.gather(), &mut buffer)?;

    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

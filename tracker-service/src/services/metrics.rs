//! Metrics module for tracker-service.
//! Provides Prometheus metrics for tracked LLM usage and persistence, plus
//! the recorder behind the shared HTTP metrics middleware.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;
use prometheus::{
    histogram_opts, opts, register_counter_vec, register_histogram_vec, register_int_counter_vec,
    CounterVec, Encoder, HistogramVec, IntCounterVec, TextEncoder,
};
use std::sync::OnceLock;

/// Database query duration histogram
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        histogram_opts!(
            "tracker_db_query_duration_seconds",
            "Database query duration"
        ),
        &["operation"]
    )
    .expect("Failed to register DB_QUERY_DURATION")
});

/// Tracking requests by provider and outcome
pub static TRACKED_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Tokens reported by provider and direction
pub static TOKENS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Computed cost by provider and currency
pub static USAGE_COST_TOTAL: OnceLock<CounterVec> = OnceLock::new();

/// Error counter for alerting
pub static ERRORS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Recorder for `metrics` facade calls (HTTP request counters and latency).
static HTTP_METRICS_HANDLE: OnceLock<Option<PrometheusHandle>> = OnceLock::new();

/// Initialize all metrics. Safe to call more than once.
pub fn init_metrics() {
    TRACKED_REQUESTS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "tracker_tracked_requests_total",
                "Total tracking requests by provider and status"
            ),
            &["provider", "status"]
        )
        .expect("Failed to register TRACKED_REQUESTS_TOTAL")
    });

    TOKENS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "tracker_tokens_total",
                "Total tokens tracked by provider and kind"
            ),
            &["provider", "kind"]
        )
        .expect("Failed to register TOKENS_TOTAL")
    });

    USAGE_COST_TOTAL.get_or_init(|| {
        register_counter_vec!(
            opts!(
                "tracker_usage_cost_total",
                "Total computed usage cost by provider and currency"
            ),
            &["provider", "currency"]
        )
        .expect("Failed to register USAGE_COST_TOTAL")
    });

    ERRORS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!("tracker_errors_total", "Total errors by type for alerting"),
            &["error_type", "endpoint"]
        )
        .expect("Failed to register ERRORS_TOTAL")
    });

    HTTP_METRICS_HANDLE.get_or_init(|| match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!(error = %e, "HTTP metrics recorder not installed");
            None
        }
    });

    // Force initialization of lazy statics
    let _ = &*DB_QUERY_DURATION;
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    let mut output = String::from_utf8(buffer).unwrap_or_default();
    if let Some(handle) = HTTP_METRICS_HANDLE.get().and_then(Option::as_ref) {
        output.push_str(&handle.render());
    }
    output
}

/// Record the outcome of a tracking request.
pub fn record_tracked_request(provider: &str, status: &str) {
    if let Some(counter) = TRACKED_REQUESTS_TOTAL.get() {
        counter.with_label_values(&[provider, status]).inc();
    }
}

/// Record prompt and completion token counts.
pub fn record_usage_tokens(provider: &str, prompt_tokens: u64, completion_tokens: u64) {
    if let Some(counter) = TOKENS_TOTAL.get() {
        counter
            .with_label_values(&[provider, "prompt"])
            .inc_by(prompt_tokens);
        counter
            .with_label_values(&[provider, "completion"])
            .inc_by(completion_tokens);
    }
}

/// Record a computed cost.
pub fn record_usage_cost(provider: &str, currency: &str, amount: f64) {
    if let Some(counter) = USAGE_COST_TOTAL.get() {
        counter
            .with_label_values(&[provider, currency])
            .inc_by(amount.abs());
    }
}

/// Record an error for alerting.
pub fn record_error(error_type: &str, endpoint: &str) {
    if let Some(counter) = ERRORS_TOTAL.get() {
        counter.with_label_values(&[error_type, endpoint]).inc();
    }
}

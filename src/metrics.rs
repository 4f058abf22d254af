//! Prometheus metrics for request accounting.
//!
//! The binary installs the Prometheus recorder; without it every call here
//! is a no-op, which keeps tests and library users recorder-free.

use std::time::Instant;

use axum::http::StatusCode;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::debug;

// === Metric Name Constants ===

/// HTTP requests counter metric name.
pub const METRIC_HTTP_REQUESTS: &str = "http_requests_total";
/// HTTP request latency metric name.
pub const METRIC_HTTP_REQUEST_LATENCY: &str = "http_request_duration_ms";
/// Unmatched requests counter metric name.
pub const METRIC_HTTP_NOT_FOUND: &str = "http_not_found_total";

/// Path label used for requests that matched no route.
pub const UNMATCHED_PATH: &str = "<unmatched>";

/// Install the global Prometheus recorder and return its render handle.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Initialize all metric descriptions.
/// Call this once at startup, after the recorder is installed.
pub fn init_metrics() {
    describe_counter!(METRIC_HTTP_REQUESTS, "Total number of HTTP requests served");
    describe_histogram!(
        METRIC_HTTP_REQUEST_LATENCY,
        "HTTP request latency in milliseconds"
    );
    describe_counter!(
        METRIC_HTTP_NOT_FOUND,
        "Total number of requests that matched no route"
    );

    debug!("Metrics initialized");
}

/// Record one served request.
pub fn record_http_request(method: &str, path: &str, status: StatusCode, start: Instant) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    let labels = [
        ("method", method.to_string()),
        ("path", path.to_string()),
        ("status", status.as_u16().to_string()),
    ];

    counter!(METRIC_HTTP_REQUESTS, &labels).increment(1);
    histogram!(METRIC_HTTP_REQUEST_LATENCY, &labels).record(latency_ms);
}

/// Increment the unmatched requests counter.
pub fn inc_not_found() {
    counter!(METRIC_HTTP_NOT_FOUND).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_without_recorder_is_noop() {
        init_metrics();
        record_http_request("GET", "/health", StatusCode::OK, Instant::now());
        inc_not_found();
    }

    #[test]
    fn local_recorder_renders_request_counter() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            record_http_request("GET", "/health", StatusCode::OK, Instant::now());
        });

        let rendered = handle.render();
        assert!(rendered.contains(METRIC_HTTP_REQUESTS));
        assert!(rendered.contains("path=\"/health\""));
        assert!(rendered.contains("status=\"200\""));
    }
}

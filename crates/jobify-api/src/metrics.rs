//! Prometheus metrics for the API server.

use std::sync::LazyLock;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use regex::Regex;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "jobify_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "jobify_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "jobify_http_requests_in_flight";

    // Auth metrics
    pub const AUTH_FAILURES_TOTAL: &str = "jobify_auth_failures_total";
    pub const RATE_LIMIT_HITS_TOTAL: &str = "jobify_rate_limit_hits_total";

    // Storage metrics
    pub const DB_UNAVAILABLE_TOTAL: &str = "jobify_db_unavailable_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a rejected credential.
pub fn record_auth_failure(reason: &str) {
    let labels = [("reason", reason.to_string())];
    counter!(names::AUTH_FAILURES_TOTAL, &labels).increment(1);
}

/// Record a rate limit hit.
pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", sanitize_path(endpoint))];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

/// Record a request turned away because the store could not be reached.
pub fn record_db_unavailable() {
    counter!(names::DB_UNAVAILABLE_TOTAL).increment(1);
}

static OBJECT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-fA-F]{24}$").expect("valid object id regex"));

/// Collapse ids so path labels stay low-cardinality.
fn sanitize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| if OBJECT_ID.is_match(segment) { ":id" } else { segment })
        .collect::<Vec<_>>()
        .join("/")
}

/// Metrics middleware for recording HTTP request metrics.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);
    let response = next.run(request).await;
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    record_http_request(&method, &path, response.status().as_u16(), start.elapsed().as_secs_f64());

    response
}

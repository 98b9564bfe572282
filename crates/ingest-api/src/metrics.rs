//! Prometheus metrics for the API server.

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "ingest_api_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "ingest_api_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "ingest_api_http_requests_in_flight";

    // Job queue metrics, observed from this process's view of the queue.
    pub const QUEUE_LENGTH: &str = "ingest_api_queue_length";
    pub const QUEUE_DLQ_LENGTH: &str = "ingest_api_queue_dlq_length";
    pub const UPLOADS_INITIATED_TOTAL: &str = "ingest_api_uploads_initiated_total";
    pub const UPLOADS_COMPLETED_TOTAL: &str = "ingest_api_uploads_completed_total";

    // Rate limiting metrics
    pub const RATE_LIMIT_HITS_TOTAL: &str = "ingest_api_rate_limit_hits_total";
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

/// Update queue length gauge.
pub fn set_queue_length(length: u64) {
    gauge!(names::QUEUE_LENGTH).set(length as f64);
}

/// Update DLQ length gauge.
pub fn set_dlq_length(length: u64) {
    gauge!(names::QUEUE_DLQ_LENGTH).set(length as f64);
}

/// Record an `init_upload` call.
pub fn record_upload_initiated() {
    counter!(names::UPLOADS_INITIATED_TOTAL).increment(1);
}

/// Record a `complete_upload` call that enqueued a pipeline task.
pub fn record_upload_completed() {
    counter!(names::UPLOADS_COMPLETED_TOTAL).increment(1);
}

/// Record rate limit hit.
pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", endpoint.to_string())];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

/// Replace path segments that vary per request (video IDs) with a fixed
/// placeholder so the `path` label doesn't blow up metric cardinality.
fn sanitize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if segment.len() == 36 && segment.chars().filter(|c| *c == '-').count() == 4 {
                ":video_id"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    // Increment in-flight counter
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    // Decrement in-flight counter
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_path_replaces_video_id_segment() {
        assert_eq!(
            sanitize_path("/api/videos/550e8400-e29b-41d4-a716-446655440000/status"),
            "/api/videos/:video_id/status"
        );
        assert_eq!(sanitize_path("/api/videos"), "/api/videos");
    }
}

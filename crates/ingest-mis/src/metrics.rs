//! Prometheus metrics for the Model Inference Service.

use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder; returns a handle used to render `/metrics`.
pub fn init_metrics() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder")
}

pub mod names {
    pub const REQUESTS_TOTAL: &str = "mis_requests_total";
    pub const REQUEST_DURATION_SECONDS: &str = "mis_request_duration_seconds";
    pub const REQUESTS_IN_FLIGHT: &str = "mis_requests_in_flight";
}

/// Metrics middleware: counts and times every request by route and status.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::REQUESTS_IN_FLIGHT).increment(1.0);
    let response = next.run(request).await;
    gauge!(names::REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let labels = [("path", path), ("status", status.to_string())];

    counter!(names::REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::REQUEST_DURATION_SECONDS, &labels).record(start.elapsed().as_secs_f64());

    response
}

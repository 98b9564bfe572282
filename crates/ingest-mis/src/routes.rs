//! Router wiring for the Model Inference Service.

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::metrics::metrics_middleware;
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/transcribe", post(handlers::transcribe))
        .route("/embed/text", post(handlers::embed_text))
        .route("/embed/image", post(handlers::embed_image))
        .route("/detect_faces", post(handlers::detect_faces))
        .route("/health", get(handlers::health))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub fn metrics_route(handle: metrics_exporter_prometheus::PrometheusHandle) -> Router {
    Router::new().route(
        "/metrics",
        get(move || {
            let handle = handle.clone();
            async move { handle.render() }
        }),
    )
}

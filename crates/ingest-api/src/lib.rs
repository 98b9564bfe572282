//! Upload Control Plane HTTP API.
//!
//! Exposes the client-facing surface of the indexing pipeline: presigned
//! upload init/complete, read-only video and job-status lookups, delegated
//! OIDC authentication, rate limiting, security headers, and Prometheus
//! metrics.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod security;
pub mod services;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::UserService;
pub use state::AppState;

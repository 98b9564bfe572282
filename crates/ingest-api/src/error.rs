//! Upload Control Plane error taxonomy.
//!
//! Mirrors [`ingest_models::DomainError`] at the HTTP boundary, plus the
//! purely transport-level variants (`Unauthorized`, `RateLimited`) that
//! have no place in the domain taxonomy. Every dependency error from the
//! Metadata Store, Object Store Gateway, or Job Queue folds into
//! `DependencyUnavailable` — the client never sees which collaborator
//! failed, only that one did.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ingest_models::DomainError;
use serde::Serialize;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not found")]
    NotFound,

    #[error("not ready: {0}")]
    NotReady(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("rate limited")]
    RateLimited,

    #[error("dependency unavailable: {0}")]
    DependencyUnavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn not_ready(msg: impl Into<String>) -> Self {
        Self::NotReady(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidInput(_) => "INVALID_INPUT",
            ApiError::NotFound => "NOT_FOUND",
            ApiError::NotReady(_) => "NOT_READY",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::RateLimited => "RATE_LIMITED",
            ApiError::DependencyUnavailable(_) => "DEPENDENCY_UNAVAILABLE",
            ApiError::Internal(_) => "INTERNAL",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::NotReady(_) => StatusCode::CONFLICT,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::DependencyUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Fold the shared domain taxonomy onto the HTTP boundary. `DurationExceeded`
/// and `InvalidMedia` never reach the API — they are pipeline-only outcomes
/// recorded on `Video.error_text` and observed through `get_status` — but are
/// mapped defensively rather than panicking, in case a caller ever routes one
/// here.
impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::InvalidInput(m) => ApiError::InvalidInput(m),
            DomainError::NotFound => ApiError::NotFound,
            DomainError::NotReady(m) => ApiError::NotReady(m),
            DomainError::Conflict(m) => ApiError::Conflict(m),
            DomainError::DurationExceeded(m) | DomainError::InvalidMedia(m) => {
                ApiError::Conflict(m)
            }
            DomainError::DependencyUnavailable(m) => ApiError::DependencyUnavailable(m),
            DomainError::Internal(m) => ApiError::Internal(m),
        }
    }
}

impl From<ingest_db::DbError> for ApiError {
    fn from(e: ingest_db::DbError) -> Self {
        match e {
            ingest_db::DbError::NotFound(_) => ApiError::NotFound,
            ingest_db::DbError::Conflict(m) => ApiError::Conflict(m),
            e @ (ingest_db::DbError::Migration(_) | ingest_db::DbError::Config(_)) => {
                ApiError::Internal(e.to_string())
            }
            e @ ingest_db::DbError::Sql(_) if e.is_retryable() => {
                ApiError::DependencyUnavailable(e.to_string())
            }
            e => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<ingest_storage::StorageError> for ApiError {
    fn from(e: ingest_storage::StorageError) -> Self {
        match e {
            ingest_storage::StorageError::NotFound(_) => ApiError::NotReady(
                "object not yet present in the uploads bucket".to_string(),
            ),
            e => ApiError::DependencyUnavailable(e.to_string()),
        }
    }
}

impl From<ingest_queue::QueueError> for ApiError {
    fn from(e: ingest_queue::QueueError) -> Self {
        ApiError::DependencyUnavailable(e.to_string())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    code: &'static str,
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        // Never expose raw dependency diagnostics to the client.
        let detail = match &self {
            ApiError::Internal(_) | ApiError::DependencyUnavailable(_) => {
                "An internal error occurred".to_string()
            }
            _ => self.to_string(),
        };

        (status, Json(ErrorResponse { code, detail })).into_response()
    }
}

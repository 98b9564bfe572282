//! MIS error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

pub type MisResult<T> = Result<T, MisError>;

#[derive(Debug, Error)]
pub enum MisError {
    #[error("required model missing from cache: {0}")]
    ModelNotFound(String),

    #[error("failed to load model {0}: {1}")]
    ModelLoad(String, String),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

impl IntoResponse for MisError {
    fn into_response(self) -> Response {
        let status = match self {
            MisError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            MisError::ModelNotFound(_) | MisError::ModelLoad(_, _) | MisError::Inference(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = ErrorResponse {
            detail: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

//! MIS client error types.

use thiserror::Error;

pub type MisResult<T> = Result<T, MisError>;

#[derive(Debug, Error)]
pub enum MisError {
    #[error("model inference service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("timeout after {0} seconds")]
    Timeout(u64),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MisError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            MisError::ServiceUnavailable(_) | MisError::Timeout(_) | MisError::Network(_)
        )
    }
}

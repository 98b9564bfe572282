//! Error taxonomy shared by every crate that speaks the domain model.
//!
//! This mirrors the external interface's error categories so a single
//! `DomainError` can be mapped onto each boundary's own error type
//! (`ApiError` at the HTTP boundary, `WorkerError` in the pipeline) without
//! re-deriving the taxonomy in each crate.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The error categories surfaced at every external interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Error)]
#[serde(rename_all = "snake_case", tag = "code", content = "message")]
pub enum DomainError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not found")]
    NotFound,

    #[error("not ready: {0}")]
    NotReady(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("duration exceeded: {0}")]
    DurationExceeded(String),

    #[error("invalid media: {0}")]
    InvalidMedia(String),

    #[error("dependency unavailable: {0}")]
    DependencyUnavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

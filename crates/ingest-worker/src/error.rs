//! Worker error types.
//!
//! Every error a pipeline stage can raise is classified as either
//! transient (leave `Video`/`Job` state untouched, abandon the task,
//! let queue redelivery retry it) or fatal (mark the video failed and
//! do not re-enqueue). See [`WorkerError::is_transient`].

use ingest_storage::StorageError;
use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("video not eligible for pipeline entry: {0}")]
    NotEligible(String),

    #[error("video already locked by another worker")]
    AlreadyLocked,

    #[error("media duration exceeds the allowed maximum: {0}")]
    DurationExceeded(String),

    #[error("invalid media: {0}")]
    InvalidMedia(String),

    #[error("dependency unavailable: {0}")]
    DependencyUnavailable(String),

    #[error("pipeline stage failed: {0}")]
    Pipeline(String),

    #[error("storage error: {0}")]
    Storage(#[from] ingest_storage::StorageError),

    #[error("database error: {0}")]
    Db(#[from] ingest_db::DbError),

    #[error("media error: {0}")]
    Media(#[from] ingest_media::MediaError),

    #[error("queue error: {0}")]
    Queue(#[from] ingest_queue::QueueError),

    #[error("model inference error: {0}")]
    Mis(#[from] ingest_mis_client::MisError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn not_eligible(msg: impl Into<String>) -> Self {
        Self::NotEligible(msg.into())
    }

    pub fn duration_exceeded(msg: impl Into<String>) -> Self {
        Self::DurationExceeded(msg.into())
    }

    pub fn invalid_media(msg: impl Into<String>) -> Self {
        Self::InvalidMedia(msg.into())
    }

    pub fn dependency_unavailable(msg: impl Into<String>) -> Self {
        Self::DependencyUnavailable(msg.into())
    }

    pub fn pipeline(msg: impl Into<String>) -> Self {
        Self::Pipeline(msg.into())
    }

    /// True when the task should simply be abandoned without touching
    /// `Video`/`Job` state, leaving redelivery to retry it: a network
    /// blip talking to the Model Inference Service or the Object Store
    /// Gateway, a lock already held, or a transient storage/database
    /// hiccup.
    pub fn is_transient(&self) -> bool {
        match self {
            WorkerError::AlreadyLocked => true,
            WorkerError::DependencyUnavailable(_) => true,
            WorkerError::Mis(e) => e.is_retryable(),
            WorkerError::Db(e) => e.is_retryable(),
            WorkerError::Queue(_) => true,
            WorkerError::Storage(StorageError::AwsSdk(_)) => true,
            WorkerError::Io(_) => true,
            _ => false,
        }
    }

    /// True when the video should be marked `Failed` with `error_text`
    /// set and the current `Job` row marked failed: a validation
    /// failure or a model returning malformed output after retries.
    pub fn is_fatal(&self) -> bool {
        !self.is_transient() && !matches!(self, WorkerError::NotEligible(_))
    }

    /// The value to persist on `Video.error_text`. Per spec §7/§8, the
    /// two named validation failures are surfaced as their short code
    /// rather than a prose message, so `get_status` callers can match on
    /// `error_text` directly; everything else falls back to `Display`.
    pub fn video_error_text(&self) -> String {
        match self {
            WorkerError::DurationExceeded(_) => "DURATION_EXCEEDED".to_string(),
            WorkerError::InvalidMedia(_) => "INVALID_MEDIA".to_string(),
            other => other.to_string(),
        }
    }
}

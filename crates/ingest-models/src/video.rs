//! Video entity and its state machine.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::user::UserId;

/// Unique identifier for an uploaded video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct VideoId(pub Uuid);

impl VideoId {
    /// Generate a new random video ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for VideoId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for VideoId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

/// Lifecycle state of a video.
///
/// Transitions are monotone except `Failed` and `Deleted`, which are
/// terminal and reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum VideoState {
    /// Object has been initiated but the client has not confirmed the PUT.
    #[default]
    Uploading,
    /// Confirmed by the client; queued for the validate stage.
    Validating,
    /// Entered the indexing pipeline past validation.
    Processing,
    /// All ten stages committed successfully.
    Indexed,
    /// A fatal error ended the pipeline before commit.
    Failed,
    /// Soft-deleted; scenes and jobs are cascaded.
    Deleted,
}

impl VideoState {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoState::Uploading => "uploading",
            VideoState::Validating => "validating",
            VideoState::Processing => "processing",
            VideoState::Indexed => "indexed",
            VideoState::Failed => "failed",
            VideoState::Deleted => "deleted",
        }
    }

    /// Whether the pipeline is allowed to enter a video in this state.
    pub fn is_pipeline_entry_eligible(&self) -> bool {
        matches!(self, VideoState::Validating | VideoState::Processing)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, VideoState::Indexed | VideoState::Failed | VideoState::Deleted)
    }
}

impl fmt::Display for VideoState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Maximum duration, in seconds, of a video the pipeline will index.
pub const MAX_DURATION_SECS: f64 = 600.0;

/// Maximum object size, in bytes, accepted at upload.
pub const MAX_SIZE_BYTES: u64 = 1024 * 1024 * 1024;

/// A video owned by a user, tracked through upload and indexing.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Video {
    pub video_id: VideoId,
    pub user_id: UserId,
    /// Path in the `uploads` bucket. Immutable once set by `init_upload`.
    pub storage_key: String,
    pub mime_type: String,
    pub size_bytes: u64,
    /// Null until the validate stage succeeds.
    pub duration_s: Option<f64>,
    pub state: VideoState,
    /// Set only when `state == Failed`.
    pub error_text: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Null until `state == Indexed`.
    pub indexed_at: Option<DateTime<Utc>>,
}

impl Video {
    /// Create a new video row in the `Uploading` state, as `init_upload` does.
    pub fn new_uploading(
        user_id: UserId,
        storage_key: impl Into<String>,
        mime_type: impl Into<String>,
        size_bytes: u64,
    ) -> Self {
        let now = Utc::now();
        Self {
            video_id: VideoId::new(),
            user_id,
            storage_key: storage_key.into(),
            mime_type: mime_type.into(),
            size_bytes,
            duration_s: None,
            state: VideoState::Uploading,
            error_text: None,
            created_at: now,
            updated_at: now,
            indexed_at: None,
        }
    }

    /// Transition on `complete_upload`: the client confirms the PUT finished.
    pub fn begin_validating(mut self) -> Self {
        self.state = VideoState::Validating;
        self.updated_at = Utc::now();
        self
    }

    /// Transition on pipeline entry, past the validate stage.
    pub fn begin_processing(mut self, duration_s: f64) -> Self {
        self.state = VideoState::Processing;
        self.duration_s = Some(duration_s);
        self.updated_at = Utc::now();
        self
    }

    /// Transition on the commit stage.
    pub fn mark_indexed(mut self) -> Self {
        self.state = VideoState::Indexed;
        self.indexed_at = Some(Utc::now());
        self.updated_at = Utc::now();
        self
    }

    pub fn mark_failed(mut self, error: impl Into<String>) -> Self {
        self.state = VideoState::Failed;
        self.error_text = Some(error.into());
        self.updated_at = Utc::now();
        self
    }

    pub fn mark_deleted(mut self) -> Self {
        self.state = VideoState::Deleted;
        self.updated_at = Utc::now();
        self
    }

    /// Whether the pipeline is allowed to take this video on.
    pub fn is_pipeline_entry_eligible(&self) -> bool {
        self.state.is_pipeline_entry_eligible() && self.indexed_at.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_entry_guard_allows_validating_and_processing_only() {
        let v = Video::new_uploading(UserId::new(), "u/1/source.mp4", "video/mp4", 1024);
        assert!(!v.is_pipeline_entry_eligible());

        let v = v.begin_validating();
        assert!(v.is_pipeline_entry_eligible());

        let v = v.clone().begin_processing(12.5);
        assert!(v.is_pipeline_entry_eligible());

        let v = v.mark_indexed();
        assert!(!v.is_pipeline_entry_eligible());
    }

    #[test]
    fn indexed_state_implies_indexed_at() {
        let v = Video::new_uploading(UserId::new(), "u/1/source.mp4", "video/mp4", 1024)
            .begin_validating()
            .begin_processing(5.0)
            .mark_indexed();
        assert_eq!(v.state, VideoState::Indexed);
        assert!(v.indexed_at.is_some());
    }

    #[test]
    fn duration_and_size_bounds_are_named_constants() {
        assert_eq!(MAX_DURATION_SECS, 600.0);
        assert_eq!(MAX_SIZE_BYTES, 1024 * 1024 * 1024);
    }
}

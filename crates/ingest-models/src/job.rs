//! Job entity: one row per (video, pipeline stage).

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::video::VideoId;

/// Unique identifier for a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for JobId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

/// One of the ten ordered stages the indexing pipeline runs per video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    UploadValidate,
    AudioExtract,
    Asr,
    SceneDetect,
    Align,
    EmbedText,
    SampleFrames,
    EmbedVision,
    BuildSidecar,
    Commit,
}

impl Stage {
    /// The full stage ordering, index 0 first.
    pub const ORDER: [Stage; 10] = [
        Stage::UploadValidate,
        Stage::AudioExtract,
        Stage::Asr,
        Stage::SceneDetect,
        Stage::Align,
        Stage::EmbedText,
        Stage::SampleFrames,
        Stage::EmbedVision,
        Stage::BuildSidecar,
        Stage::Commit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::UploadValidate => "upload_validate",
            Stage::AudioExtract => "audio_extract",
            Stage::Asr => "asr",
            Stage::SceneDetect => "scene_detect",
            Stage::Align => "align",
            Stage::EmbedText => "embed_text",
            Stage::SampleFrames => "sample_frames",
            Stage::EmbedVision => "embed_vision",
            Stage::BuildSidecar => "build_sidecar",
            Stage::Commit => "commit",
        }
    }

    pub fn next(&self) -> Option<Stage> {
        let idx = Self::ORDER.iter().position(|s| s == self)?;
        Self::ORDER.get(idx + 1).copied()
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Job state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Running => "running",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
            JobState::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed | JobState::Cancelled)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A job: tracks progress of one pipeline stage for one video.
///
/// Invariant: at most one job per `(video_id, stage)` is in `{Pending,
/// Running}` at a time — enforced by the relational store with a partial
/// unique index, not by this type.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Job {
    pub job_id: JobId,
    pub video_id: VideoId,
    pub stage: Stage,
    pub state: JobState,
    /// 0-100.
    pub progress: u8,
    pub error_text: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Create the first job of a video's pipeline run, as `complete_upload` does.
    pub fn new_pending(video_id: VideoId, stage: Stage) -> Self {
        let now = Utc::now();
        Self {
            job_id: JobId::new(),
            video_id,
            stage,
            state: JobState::Pending,
            progress: 0,
            error_text: None,
            created_at: now,
            updated_at: now,
            started_at: None,
            completed_at: None,
        }
    }

    pub fn start(mut self) -> Self {
        self.state = JobState::Running;
        self.started_at = Some(Utc::now());
        self.updated_at = Utc::now();
        self
    }

    pub fn with_progress(mut self, progress: u8) -> Self {
        self.progress = progress.min(100);
        self.updated_at = Utc::now();
        self
    }

    pub fn complete(mut self) -> Self {
        self.state = JobState::Completed;
        self.progress = 100;
        self.completed_at = Some(Utc::now());
        self.updated_at = Utc::now();
        self
    }

    pub fn fail(mut self, error: impl Into<String>) -> Self {
        self.state = JobState::Failed;
        self.error_text = Some(error.into());
        self.updated_at = Utc::now();
        self
    }

    pub fn cancel(mut self) -> Self {
        self.state = JobState::Cancelled;
        self.updated_at = Utc::now();
        self
    }
}

/// The queue task payload: just a video id, per the job-queue binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct IngestTask {
    pub video_id: VideoId,
}

impl IngestTask {
    pub fn new(video_id: VideoId) -> Self {
        Self { video_id }
    }

    /// Dedup key used by the queue to suppress duplicate task enqueues for
    /// the same video within the dedup TTL.
    pub fn idempotency_key(&self) -> String {
        format!("ingest:{}", self.video_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_order_starts_with_upload_validate_and_ends_with_commit() {
        assert_eq!(Stage::ORDER[0], Stage::UploadValidate);
        assert_eq!(Stage::ORDER[9], Stage::Commit);
        assert_eq!(Stage::UploadValidate.next(), Some(Stage::AudioExtract));
        assert_eq!(Stage::Commit.next(), None);
    }

    #[test]
    fn job_lifecycle_transitions() {
        let job = Job::new_pending(VideoId::new(), Stage::AudioExtract);
        assert_eq!(job.state, JobState::Pending);

        let job = job.start();
        assert_eq!(job.state, JobState::Running);
        assert!(job.started_at.is_some());

        let job = job.complete();
        assert_eq!(job.state, JobState::Completed);
        assert_eq!(job.progress, 100);
        assert!(job.state.is_terminal());
    }

    #[test]
    fn ingest_task_idempotency_key_is_stable_per_video() {
        let vid = VideoId::new();
        let a = IngestTask::new(vid);
        let b = IngestTask::new(vid);
        assert_eq!(a.idempotency_key(), b.idempotency_key());
    }
}

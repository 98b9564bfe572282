//! The queue's task payload.

use serde::{Deserialize, Serialize};

use ingest_models::{IngestTask, VideoId};

/// Wrapper around the task payload actually carried on the stream.
///
/// A task payload is just a `video_id` — the pipeline looks up everything
/// else from the Metadata Store on entry, so the queue never needs to
/// carry more than an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueueJob {
    Ingest(IngestTask),
}

impl QueueJob {
    pub fn new(video_id: VideoId) -> Self {
        Self::Ingest(IngestTask::new(video_id))
    }

    pub fn video_id(&self) -> VideoId {
        match self {
            QueueJob::Ingest(t) => t.video_id,
        }
    }

    pub fn idempotency_key(&self) -> String {
        match self {
            QueueJob::Ingest(t) => t.idempotency_key(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_job_serde_roundtrip() {
        let job = QueueJob::new(VideoId::new());
        let json = serde_json::to_string(&job).expect("serialize QueueJob");
        let decoded: QueueJob = serde_json::from_str(&json).expect("deserialize QueueJob");
        assert_eq!(decoded.video_id(), job.video_id());
    }
}

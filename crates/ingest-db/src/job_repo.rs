//! Repository for the `jobs` table.

use sqlx::postgres::PgPool;
use sqlx::Row;
use sqlx::Transaction;

use ingest_models::{Job, JobId, JobState, Stage, VideoId};

use crate::error::{DbError, DbResult};

fn stage_from_str(s: &str) -> Stage {
    match s {
        "audio_extract" => Stage::AudioExtract,
        "asr" => Stage::Asr,
        "scene_detect" => Stage::SceneDetect,
        "align" => Stage::Align,
        "embed_text" => Stage::EmbedText,
        "sample_frames" => Stage::SampleFrames,
        "embed_vision" => Stage::EmbedVision,
        "build_sidecar" => Stage::BuildSidecar,
        "commit" => Stage::Commit,
        _ => Stage::UploadValidate,
    }
}

fn state_from_str(s: &str) -> JobState {
    match s {
        "running" => JobState::Running,
        "completed" => JobState::Completed,
        "failed" => JobState::Failed,
        "cancelled" => JobState::Cancelled,
        _ => JobState::Pending,
    }
}

fn row_to_job(row: &sqlx::postgres::PgRow) -> Job {
    Job {
        job_id: JobId(row.get("job_id")),
        video_id: VideoId(row.get("video_id")),
        stage: stage_from_str(row.get::<String, _>("stage").as_str()),
        state: state_from_str(row.get::<String, _>("state").as_str()),
        progress: row.get::<i16, _>("progress") as u8,
        error_text: row.get("error_text"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        started_at: row.get("started_at"),
        completed_at: row.get("completed_at"),
    }
}

#[derive(Clone)]
pub struct JobRepository {
    pool: PgPool,
}

impl JobRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the first job row for a video, as `complete_upload` does.
    /// Fails with `Conflict` if a job for `(video_id, stage)` is already
    /// pending or running, per the at-most-one-active-job invariant.
    pub async fn create(&self, job: &Job) -> DbResult<()> {
        let result = sqlx::query(
            "INSERT INTO jobs (job_id, video_id, stage, state, progress, error_text, \
             created_at, updated_at, started_at, completed_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(job.job_id.0)
        .bind(job.video_id.as_uuid())
        .bind(job.stage.as_str())
        .bind(job.state.as_str())
        .bind(job.progress as i16)
        .bind(&job.error_text)
        .bind(job.created_at)
        .bind(job.updated_at)
        .bind(job.started_at)
        .bind(job.completed_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(DbError::conflict(
                format!("job already active for video {} stage {}", job.video_id, job.stage),
            )),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn save(&self, job: &Job) -> DbResult<()> {
        sqlx::query(
            "UPDATE jobs SET state = $2, progress = $3, error_text = $4, updated_at = $5, \
             started_at = $6, completed_at = $7 WHERE job_id = $1",
        )
        .bind(job.job_id.0)
        .bind(job.state.as_str())
        .bind(job.progress as i16)
        .bind(&job.error_text)
        .bind(job.updated_at)
        .bind(job.started_at)
        .bind(job.completed_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Same write as [`Self::save`], but inside the caller's transaction.
    /// Used by the commit stage so the final `commit` Job row lands
    /// completed in the same transaction as the Scene insert and the
    /// Video's transition to `Indexed` — otherwise a crash between the
    /// transaction's commit and a follow-up `save` could leave a video
    /// `Indexed` with its `commit` Job row still `running`.
    pub async fn save_in_tx(
        tx: &mut Transaction<'_, sqlx::Postgres>,
        job: &Job,
    ) -> DbResult<()> {
        sqlx::query(
            "UPDATE jobs SET state = $2, progress = $3, error_text = $4, updated_at = $5, \
             started_at = $6, completed_at = $7 WHERE job_id = $1",
        )
        .bind(job.job_id.0)
        .bind(job.state.as_str())
        .bind(job.progress as i16)
        .bind(&job.error_text)
        .bind(job.updated_at)
        .bind(job.started_at)
        .bind(job.completed_at)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    /// All jobs for a video, ordered by creation — the `get_status` read
    /// model is a projection of this list.
    pub async fn list_for_video(&self, video_id: &VideoId) -> DbResult<Vec<Job>> {
        let rows = sqlx::query(
            "SELECT job_id, video_id, stage, state, progress, error_text, created_at, \
             updated_at, started_at, completed_at FROM jobs \
             WHERE video_id = $1 ORDER BY created_at ASC",
        )
        .bind(video_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_job).collect())
    }

    pub async fn get(&self, job_id: &JobId) -> DbResult<Job> {
        let row = sqlx::query(
            "SELECT job_id, video_id, stage, state, progress, error_text, created_at, \
             updated_at, started_at, completed_at FROM jobs WHERE job_id = $1",
        )
        .bind(job_id.0)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found(format!("job {job_id}")))?;

        Ok(row_to_job(&row))
    }

    /// Jobs stuck in `running` past a staleness threshold — crash-recovery
    /// sweep target, mirroring the queue's own stuck-message reclaim.
    pub async fn list_stale_running(&self, older_than_secs: i64) -> DbResult<Vec<Job>> {
        let rows = sqlx::query(
            "SELECT job_id, video_id, stage, state, progress, error_text, created_at, \
             updated_at, started_at, completed_at FROM jobs \
             WHERE state = 'running' AND updated_at < now() - make_interval(secs => $1)",
        )
        .bind(older_than_secs as f64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_job).collect())
    }
}

//! The commit stage's atomic multi-row write.
//!
//! Mirrors the teacher's batch-write pattern: everything the commit stage
//! produces — the scene rows, the video's transition to `Indexed`, and the
//! `commit` Job row's own completion — lands in a single transaction, so a
//! crash mid-commit never leaves a video `Indexed` without its scenes, nor
//! `Indexed` with its final Job row still `running`.

use sqlx::postgres::PgPool;

use ingest_models::{Job, Scene, Video};

use crate::error::DbResult;
use crate::job_repo::JobRepository;
use crate::scene_repo::SceneRepository;

pub async fn commit_video(
    pool: &PgPool,
    video: &Video,
    scenes: &[Scene],
    commit_job: &Job,
) -> DbResult<()> {
    let mut tx = pool.begin().await?;

    SceneRepository::insert_all(&mut tx, scenes).await?;

    sqlx::query(
        "UPDATE videos SET state = $2, indexed_at = $3, updated_at = $4 WHERE video_id = $1",
    )
    .bind(video.video_id.as_uuid())
    .bind(video.state.as_str())
    .bind(video.indexed_at)
    .bind(video.updated_at)
    .execute(&mut *tx)
    .await?;

    JobRepository::save_in_tx(&mut tx, commit_job).await?;

    tx.commit().await?;
    Ok(())
}

//! Repository for the `videos` table, scoped by owner for list/get.

use sqlx::postgres::PgPool;
use sqlx::Row;

use ingest_models::{UserId, Video, VideoId, VideoState};

use crate::error::{DbError, DbResult};

fn state_from_str(s: &str) -> VideoState {
    match s {
        "validating" => VideoState::Validating,
        "processing" => VideoState::Processing,
        "indexed" => VideoState::Indexed,
        "failed" => VideoState::Failed,
        "deleted" => VideoState::Deleted,
        _ => VideoState::Uploading,
    }
}

fn row_to_video(row: &sqlx::postgres::PgRow) -> Video {
    Video {
        video_id: VideoId(row.get("video_id")),
        user_id: UserId(row.get("user_id")),
        storage_key: row.get("storage_key"),
        mime_type: row.get("mime_type"),
        size_bytes: row.get::<i64, _>("size_bytes") as u64,
        duration_s: row.get("duration_s"),
        state: state_from_str(row.get::<String, _>("state").as_str()),
        error_text: row.get("error_text"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        indexed_at: row.get("indexed_at"),
    }
}

#[derive(Clone)]
pub struct VideoRepository {
    pool: PgPool,
}

impl VideoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert the row created by `init_upload`.
    pub async fn create(&self, video: &Video) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO videos (video_id, user_id, storage_key, mime_type, size_bytes, \
             duration_s, state, error_text, created_at, updated_at, indexed_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(video.video_id.as_uuid())
        .bind(video.user_id.as_uuid())
        .bind(&video.storage_key)
        .bind(&video.mime_type)
        .bind(video.size_bytes as i64)
        .bind(video.duration_s)
        .bind(video.state.as_str())
        .bind(&video.error_text)
        .bind(video.created_at)
        .bind(video.updated_at)
        .bind(video.indexed_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Fetch a video, scoped to the requesting owner. Returns `NotFound`
    /// uniformly whether the row does not exist or is owned by someone
    /// else, so existence is not leaked across owners.
    pub async fn get_owned(&self, user_id: &UserId, video_id: &VideoId) -> DbResult<Video> {
        let row = sqlx::query(
            "SELECT video_id, user_id, storage_key, mime_type, size_bytes, duration_s, state, \
             error_text, created_at, updated_at, indexed_at \
             FROM videos WHERE video_id = $1 AND user_id = $2 AND state != 'deleted'",
        )
        .bind(video_id.as_uuid())
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found(format!("video {video_id}")))?;

        Ok(row_to_video(&row))
    }

    /// Fetch a video by id regardless of owner, for pipeline use.
    pub async fn get(&self, video_id: &VideoId) -> DbResult<Video> {
        let row = sqlx::query(
            "SELECT video_id, user_id, storage_key, mime_type, size_bytes, duration_s, state, \
             error_text, created_at, updated_at, indexed_at \
             FROM videos WHERE video_id = $1",
        )
        .bind(video_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found(format!("video {video_id}")))?;

        Ok(row_to_video(&row))
    }

    pub async fn list_owned(
        &self,
        user_id: &UserId,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<Video>> {
        let rows = sqlx::query(
            "SELECT video_id, user_id, storage_key, mime_type, size_bytes, duration_s, state, \
             error_text, created_at, updated_at, indexed_at \
             FROM videos WHERE user_id = $1 AND state != 'deleted' \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3",
        )
        .bind(user_id.as_uuid())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_video).collect())
    }

    /// Persist a state transition, along with whatever scalar fields the
    /// transition touched (duration, error text, indexed_at).
    pub async fn save(&self, video: &Video) -> DbResult<()> {
        sqlx::query(
            "UPDATE videos SET duration_s = $2, state = $3, error_text = $4, \
             updated_at = $5, indexed_at = $6 WHERE video_id = $1",
        )
        .bind(video.video_id.as_uuid())
        .bind(video.duration_s)
        .bind(video.state.as_str())
        .bind(&video.error_text)
        .bind(video.updated_at)
        .bind(video.indexed_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

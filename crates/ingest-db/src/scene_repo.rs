//! Repository for the `scenes` table, including vector columns.

use pgvector::Vector;
use sqlx::postgres::PgPool;
use sqlx::Row;
use sqlx::Transaction;

use ingest_models::{Embedding, Scene, SceneId, VideoId};

use crate::error::DbResult;

fn embedding_to_vector(e: &Embedding) -> Vector {
    Vector::from(e.0.clone())
}

fn row_to_scene(row: &sqlx::postgres::PgRow) -> Scene {
    let text_vec: Option<Vector> = row.get("text_vec");
    let image_vec: Option<Vector> = row.get("image_vec");

    Scene {
        scene_id: SceneId(row.get("scene_id")),
        video_id: VideoId(row.get("video_id")),
        start_s: row.get("start_s"),
        end_s: row.get("end_s"),
        transcript: row.get("transcript"),
        text_vec: text_vec.map(|v| Embedding::new(v.to_vec())),
        image_vec: image_vec.map(|v| Embedding::new(v.to_vec())),
        vision_tags: row.get("vision_tags"),
        sidecar_key: row.get("sidecar_key"),
    }
}

#[derive(Clone)]
pub struct SceneRepository {
    pool: PgPool,
}

impl SceneRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_for_video(&self, video_id: &VideoId) -> DbResult<Vec<Scene>> {
        let rows = sqlx::query(
            "SELECT scene_id, video_id, start_s, end_s, transcript, text_vec, image_vec, \
             vision_tags, sidecar_key FROM scenes WHERE video_id = $1 ORDER BY start_s ASC",
        )
        .bind(video_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_scene).collect())
    }

    /// Insert every scene of a video's commit in one transaction, so a
    /// partially-written scene set is never observable.
    pub async fn insert_all(
        tx: &mut Transaction<'_, sqlx::Postgres>,
        scenes: &[Scene],
    ) -> DbResult<()> {
        for scene in scenes {
            sqlx::query(
                "INSERT INTO scenes (scene_id, video_id, start_s, end_s, transcript, text_vec, \
                 image_vec, vision_tags, sidecar_key) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            )
            .bind(scene.scene_id.0)
            .bind(scene.video_id.as_uuid())
            .bind(scene.start_s)
            .bind(scene.end_s)
            .bind(&scene.transcript)
            .bind(scene.text_vec.as_ref().map(embedding_to_vector))
            .bind(scene.image_vec.as_ref().map(embedding_to_vector))
            .bind(&scene.vision_tags)
            .bind(&scene.sidecar_key)
            .execute(&mut **tx)
            .await?;
        }

        Ok(())
    }
}

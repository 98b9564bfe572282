//! Repository for the `face_profiles` table.
//!
//! Present for schema completeness; nothing in the indexing pipeline
//! writes to it today.

use pgvector::Vector;
use sqlx::postgres::PgPool;
use sqlx::Row;

use ingest_models::{Embedding, FaceProfile, FaceProfileId, UserId};

use crate::error::DbResult;

#[derive(Clone)]
pub struct FaceProfileRepository {
    pool: PgPool,
}

impl FaceProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, profile: &FaceProfile) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO face_profiles (face_profile_id, user_id, name, photo_key, face_vec) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(profile.face_profile_id.0)
        .bind(profile.user_id.as_uuid())
        .bind(&profile.name)
        .bind(&profile.photo_key)
        .bind(Vector::from(profile.face_vec.0.clone()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn list_for_user(&self, user_id: &UserId) -> DbResult<Vec<FaceProfile>> {
        let rows = sqlx::query(
            "SELECT face_profile_id, user_id, name, photo_key, face_vec FROM face_profiles \
             WHERE user_id = $1",
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| {
                let vec: Vector = row.get("face_vec");
                FaceProfile {
                    face_profile_id: FaceProfileId(row.get("face_profile_id")),
                    user_id: UserId(row.get("user_id")),
                    name: row.get("name"),
                    photo_key: row.get("photo_key"),
                    face_vec: Embedding::new(vec.to_vec()),
                }
            })
            .collect())
    }
}

//! Repository for the `users` table.

use sqlx::postgres::PgPool;
use sqlx::Row;

use ingest_models::{User, UserId, UserTier};

use crate::error::{DbError, DbResult};

fn tier_from_str(s: &str) -> UserTier {
    match s {
        "pro" => UserTier::Pro,
        "enterprise" => UserTier::Enterprise,
        _ => UserTier::Free,
    }
}

fn tier_as_str(tier: UserTier) -> &'static str {
    match tier {
        UserTier::Free => "free",
        UserTier::Pro => "pro",
        UserTier::Enterprise => "enterprise",
    }
}

fn row_to_user(row: &sqlx::postgres::PgRow) -> User {
    User {
        user_id: UserId(row.get("user_id")),
        external_auth_id: row.get("external_auth_id"),
        email: row.get("email"),
        email_verified: row.get("email_verified"),
        tier: tier_from_str(row.get::<String, _>("tier").as_str()),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_external_auth_id(
        &self,
        external_auth_id: &str,
    ) -> DbResult<Option<User>> {
        let row = sqlx::query(
            "SELECT user_id, external_auth_id, email, email_verified, tier, created_at, updated_at \
             FROM users WHERE external_auth_id = $1",
        )
        .bind(external_auth_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(row_to_user))
    }

    pub async fn get(&self, user_id: &UserId) -> DbResult<User> {
        let row = sqlx::query(
            "SELECT user_id, external_auth_id, email, email_verified, tier, created_at, updated_at \
             FROM users WHERE user_id = $1",
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found(format!("user {user_id}")))?;

        Ok(row_to_user(&row))
    }

    /// Create a user, or return the existing one if `external_auth_id`
    /// already links to a user — first-authenticated-request idempotence.
    pub async fn get_or_create(&self, user: &User) -> DbResult<User> {
        if let Some(auth_id) = &user.external_auth_id {
            if let Some(existing) = self.find_by_external_auth_id(auth_id).await? {
                return Ok(existing);
            }
        }

        sqlx::query(
            "INSERT INTO users (user_id, external_auth_id, email, email_verified, tier, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (external_auth_id) DO NOTHING",
        )
        .bind(user.user_id.as_uuid())
        .bind(&user.external_auth_id)
        .bind(&user.email)
        .bind(user.email_verified)
        .bind(tier_as_str(user.tier))
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        if let Some(auth_id) = &user.external_auth_id {
            if let Some(existing) = self.find_by_external_auth_id(auth_id).await? {
                return Ok(existing);
            }
        }

        self.get(&user.user_id).await
    }
}

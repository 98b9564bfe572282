//! Row-level advisory lock keyed by video_id.
//!
//! Postgres advisory locks are session-scoped, so acquiring one requires
//! holding a single connection out of the pool for the lock's lifetime.
//! This is the mutual-exclusion primitive the indexing pipeline uses on
//! entry to a video: at most one worker may hold the lock for a given
//! `video_id` at a time, and a second taker is told "no" immediately
//! rather than queued.

use sqlx::postgres::PgPool;

use crate::error::DbResult;
use ingest_models::VideoId;

fn lock_key(video_id: &VideoId) -> i64 {
    // hashtext()-equivalent: fold the UUID's bytes into a signed 64-bit key.
    let bytes = video_id.as_uuid().as_bytes();
    let mut key: i64 = 0;
    for chunk in bytes.chunks(8) {
        let mut buf = [0u8; 8];
        buf[..chunk.len()].copy_from_slice(chunk);
        key ^= i64::from_le_bytes(buf);
    }
    key
}

/// A held advisory lock. Dropping it without calling `release` leaks the
/// underlying connection back to the pool with the lock still held until
/// that connection closes — callers should always `release` explicitly
/// (e.g. in a `finally`-style guard around stage execution).
pub struct VideoLock {
    conn: sqlx::pool::PoolConnection<sqlx::Postgres>,
    key: i64,
}

impl VideoLock {
    /// Attempt to acquire the lock for `video_id` without blocking.
    /// Returns `None` if another session already holds it.
    pub async fn try_acquire(pool: &PgPool, video_id: &VideoId) -> DbResult<Option<Self>> {
        let mut conn = pool.acquire().await?;
        let key = lock_key(video_id);

        let acquired: bool = sqlx::query_scalar("SELECT pg_try_advisory_lock($1)")
            .bind(key)
            .fetch_one(&mut *conn)
            .await?;

        if acquired {
            Ok(Some(Self { conn, key }))
        } else {
            Ok(None)
        }
    }

    /// Release the lock, returning the connection to the pool.
    pub async fn release(mut self) -> DbResult<()> {
        sqlx::query("SELECT pg_advisory_unlock($1)")
            .bind(self.key)
            .execute(&mut *self.conn)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_key_is_stable_for_the_same_video_id() {
        let vid = VideoId::new();
        assert_eq!(lock_key(&vid), lock_key(&vid));
    }

    #[test]
    fn lock_key_differs_across_videos_with_overwhelming_probability() {
        let a = VideoId::new();
        let b = VideoId::new();
        assert_ne!(lock_key(&a), lock_key(&b));
    }
}

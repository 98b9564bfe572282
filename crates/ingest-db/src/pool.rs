//! Connection pool configuration and startup migration runner.

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use crate::error::{DbError, DbResult};

/// Configuration for the Metadata Store connection pool.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_url: String,
    pub max_connections: u32,
}

impl DbConfig {
    pub fn from_env() -> DbResult<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| DbError::config("DATABASE_URL not set"))?;
        let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10);

        Ok(Self {
            database_url,
            max_connections,
        })
    }
}

/// Connect to the Metadata Store and run pending migrations.
///
/// Migrations are embedded at compile time from `migrations/` and applied
/// idempotently on every startup, following the same fail-fast-on-boot
/// posture the rest of the workspace takes for its external dependencies.
pub async fn connect(config: &DbConfig) -> DbResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("metadata store migrations applied");

    Ok(pool)
}

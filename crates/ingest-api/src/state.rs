//! Application state.

use std::sync::Arc;

use ingest_db::{JobRepository, PgPool, UserRepository, VideoRepository};
use ingest_queue::JobQueue;
use ingest_storage::ObjectStoreClient;

use crate::auth::JwksCache;
use crate::config::ApiConfig;
use crate::services::UserService;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub pool: PgPool,
    pub videos: VideoRepository,
    pub jobs: JobRepository,
    pub storage: Arc<ObjectStoreClient>,
    pub queue: Arc<JobQueue>,
    pub jwks: Arc<JwksCache>,
    pub user_service: UserService,
}

impl AppState {
    /// Create new application state, running Metadata Store migrations
    /// and bootstrapping the Object Store Gateway's buckets.
    pub async fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let db_config = ingest_db::DbConfig::from_env()?;
        let pool = ingest_db::connect(&db_config).await?;

        let storage = ObjectStoreClient::from_env().await?;
        storage.ensure_buckets().await?;

        let queue = JobQueue::from_env()?;
        queue.init().await?;

        let jwks = JwksCache::new().await?;
        let user_service = UserService::new(UserRepository::new(pool.clone()));

        Ok(Self {
            config,
            videos: VideoRepository::new(pool.clone()),
            jobs: JobRepository::new(pool.clone()),
            pool,
            storage: Arc::new(storage),
            queue: Arc::new(queue),
            jwks: Arc::new(jwks),
            user_service,
        })
    }
}

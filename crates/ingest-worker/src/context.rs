//! Shared handles to every dependency the pipeline talks to.

use ingest_db::{DbConfig, JobRepository, PgPool, SceneRepository, VideoRepository};
use ingest_mis_client::MisClient;
use ingest_queue::JobQueue;
use ingest_storage::ObjectStoreClient;

use crate::config::WorkerConfig;
use crate::error::WorkerResult;

/// Everything a pipeline run needs: the Metadata Store pool (exposed
/// both raw, for the advisory lock and the commit transaction, and
/// through typed repositories), the Object Store Gateway client, the
/// Model Inference Service client, and the worker's own tunables.
pub struct WorkerContext {
    pub pool: PgPool,
    pub videos: VideoRepository,
    pub jobs: JobRepository,
    pub scenes: SceneRepository,
    pub storage: ObjectStoreClient,
    pub mis: MisClient,
    pub config: WorkerConfig,
}

impl WorkerContext {
    pub async fn from_env() -> WorkerResult<Self> {
        let db_config = DbConfig::from_env()?;
        let pool = ingest_db::connect(&db_config).await?;
        let storage = ObjectStoreClient::from_env().await?;
        let mis = MisClient::from_env()?;
        let config = WorkerConfig::from_env();

        Ok(Self {
            videos: VideoRepository::new(pool.clone()),
            jobs: JobRepository::new(pool.clone()),
            scenes: SceneRepository::new(pool.clone()),
            pool,
            storage,
            mis,
            config,
        })
    }
}

//! Application state.

use std::sync::Arc;

use ingest_models::{IMAGE_EMBEDDING_DIM, TEXT_EMBEDDING_DIM};

use crate::config::MisConfig;
use crate::error::MisResult;
use crate::registry::{ModelPaths, ModelRegistry};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: MisConfig,
    pub models: Arc<ModelRegistry>,
}

impl AppState {
    /// Build state, loading every required model. Fails fast: a missing
    /// or malformed model aborts startup rather than starting in a
    /// degraded mode.
    pub fn new(config: MisConfig) -> MisResult<Self> {
        let paths = ModelPaths::from_cache_dir(&config.model_cache_dir);
        let models = ModelRegistry::load(&paths)?;

        Ok(Self {
            config,
            models: Arc::new(models),
        })
    }

    pub fn text_embedding_dim(&self) -> usize {
        TEXT_EMBEDDING_DIM
    }

    pub fn image_embedding_dim(&self) -> usize {
        IMAGE_EMBEDDING_DIM
    }
}

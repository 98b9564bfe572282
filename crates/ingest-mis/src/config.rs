//! MIS configuration.

/// Model Inference Service configuration.
#[derive(Debug, Clone)]
pub struct MisConfig {
    /// Server host.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Directory holding the pre-populated model cache.
    pub model_cache_dir: String,
    /// Environment (development/production).
    pub environment: String,
}

impl Default for MisConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8081,
            model_cache_dir: "/models".to_string(),
            environment: "development".to_string(),
        }
    }
}

impl MisConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("MIS_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("MIS_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8081),
            model_cache_dir: std::env::var("MIS_MODEL_CACHE_DIR")
                .unwrap_or_else(|_| "/models".to_string()),
            environment: std::env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }
}

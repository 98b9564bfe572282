//! HTTP client for the Model Inference Service.

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

use crate::error::{MisError, MisResult};
use crate::types::{
    DetectFacesRequest, DetectFacesResponse, EmbedImageRequest, EmbedResponse, EmbedTextRequest,
    FaceDetection, HealthResponse, TranscribeRequest, TranscribeResponse, TranscribeSegment,
};

/// Configuration for the MIS client.
#[derive(Debug, Clone)]
pub struct MisClientConfig {
    /// Base URL of the Model Inference Service.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Max retry attempts after the initial request.
    pub max_retries: u32,
}

impl Default for MisClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8081".to_string(),
            timeout: Duration::from_secs(60),
            max_retries: 2,
        }
    }
}

impl MisClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("MIS_URL")
                .unwrap_or_else(|_| "http://localhost:8081".to_string()),
            timeout: Duration::from_secs(
                std::env::var("MIS_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
            max_retries: std::env::var("MIS_MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
        }
    }
}

/// Client for the Model Inference Service.
pub struct MisClient {
    http: Client,
    config: MisClientConfig,
}

impl MisClient {
    /// Create a new client.
    pub fn new(config: MisClientConfig) -> MisResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(MisError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> MisResult<Self> {
        Self::new(MisClientConfig::from_env())
    }

    /// Check the service's liveness and loaded-model report.
    pub async fn health(&self) -> MisResult<HealthResponse> {
        let url = format!("{}/health", self.config.base_url);
        let response = self.with_retry(|| async {
            self.http
                .get(&url)
                .send()
                .await
                .map_err(MisError::Network)
        })
        .await?;

        self.decode(response).await
    }

    /// Transcribe speech in `audio_bytes` (mono 16kHz PCM WAV).
    pub async fn transcribe(
        &self,
        audio_bytes: Vec<u8>,
        language_hint: Option<String>,
    ) -> MisResult<Vec<TranscribeSegment>> {
        let url = format!("{}/transcribe", self.config.base_url);
        let request = TranscribeRequest {
            audio_bytes,
            language_hint,
        };

        debug!("transcribe: sending {} bytes of audio", request.audio_bytes.len());

        let response = self.with_retry(|| async {
            self.http
                .post(&url)
                .json(&request)
                .send()
                .await
                .map_err(MisError::Network)
        })
        .await?;

        let body: TranscribeResponse = self.decode(response).await?;
        Ok(body.segments)
    }

    /// Embed one or more text strings into D_T-dimensional unit vectors.
    pub async fn embed_text(&self, texts: Vec<String>) -> MisResult<Vec<Vec<f32>>> {
        let url = format!("{}/embed/text", self.config.base_url);
        let request = EmbedTextRequest { texts };

        let response = self.with_retry(|| async {
            self.http
                .post(&url)
                .json(&request)
                .send()
                .await
                .map_err(MisError::Network)
        })
        .await?;

        let body: EmbedResponse = self.decode(response).await?;
        Ok(body.vectors)
    }

    /// Embed one or more images into D_V-dimensional unit vectors.
    pub async fn embed_image(&self, images: Vec<Vec<u8>>) -> MisResult<Vec<Vec<f32>>> {
        let url = format!("{}/embed/image", self.config.base_url);
        let request = EmbedImageRequest { images };

        let response = self.with_retry(|| async {
            self.http
                .post(&url)
                .json(&request)
                .send()
                .await
                .map_err(MisError::Network)
        })
        .await?;

        let body: EmbedResponse = self.decode(response).await?;
        Ok(body.vectors)
    }

    /// Detect faces in a single image. Not called by the current pipeline;
    /// exposed for a future face-recognition consumer.
    pub async fn detect_faces(&self, image_bytes: Vec<u8>) -> MisResult<Vec<FaceDetection>> {
        let url = format!("{}/detect_faces", self.config.base_url);
        let request = DetectFacesRequest { image_bytes };

        let response = self.with_retry(|| async {
            self.http
                .post(&url)
                .json(&request)
                .send()
                .await
                .map_err(MisError::Network)
        })
        .await?;

        let body: DetectFacesResponse = self.decode(response).await?;
        Ok(body.faces)
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> MisResult<T> {
        let status = response.status();
        if status == reqwest::StatusCode::SERVICE_UNAVAILABLE
            || status == reqwest::StatusCode::TOO_MANY_REQUESTS
        {
            let body = response.text().await.unwrap_or_default();
            return Err(MisError::ServiceUnavailable(format!(
                "MIS returned {status}: {body}"
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MisError::RequestFailed(format!(
                "MIS returned {status}: {body}"
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| MisError::InvalidResponse(e.to_string()))
    }

    /// Retry a request up to `max_retries` times: 250ms start, doubling.
    async fn with_retry<F, Fut, T>(&self, operation: F) -> MisResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = MisResult<T>>,
    {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = Duration::from_millis(250 * 2u64.pow(attempt));
                    warn!(
                        "MIS request failed (attempt {}), retrying in {:?}: {}",
                        attempt + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or(MisError::RequestFailed("unknown error".to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn config_defaults_allow_two_retries() {
        let config = MisClientConfig::default();
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.timeout, Duration::from_secs(60));
    }

    #[tokio::test]
    async fn retries_on_backpressure_then_succeeds() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "loaded_models": ["asr", "embed_text", "embed_image"],
                "device": "cpu",
                "memory_used_bytes": 0,
                "text_embedding_dim": 1024,
                "image_embedding_dim": 1152,
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = MisClient::new(MisClientConfig {
            base_url: server.uri(),
            timeout: Duration::from_secs(5),
            max_retries: 3,
        })
        .unwrap();

        let response = client.health().await.unwrap();
        assert_eq!(response.device, "cpu");
    }

    #[tokio::test]
    async fn gives_up_after_max_retries_on_sustained_backpressure() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(503))
            .expect(2)
            .mount(&server)
            .await;

        let client = MisClient::new(MisClientConfig {
            base_url: server.uri(),
            timeout: Duration::from_secs(5),
            max_retries: 1,
        })
        .unwrap();

        let err = client.health().await.unwrap_err();
        assert!(matches!(err, MisError::ServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn does_not_retry_on_client_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(400))
            .expect(1)
            .mount(&server)
            .await;

        let client = MisClient::new(MisClientConfig {
            base_url: server.uri(),
            timeout: Duration::from_secs(5),
            max_retries: 3,
        })
        .unwrap();

        let err = client.health().await.unwrap_err();
        assert!(matches!(err, MisError::RequestFailed(_)));
    }
}

//! Request handlers for the Model Inference Service's operations.

use axum::extract::State;
use axum::Json;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{MisError, MisResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TranscribeRequest {
    pub audio_bytes: String,
    #[serde(default)]
    pub language_hint: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TranscribeSegment {
    pub start_s: f64,
    pub end_s: f64,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct TranscribeResponse {
    pub segments: Vec<TranscribeSegment>,
}

pub async fn transcribe(
    State(state): State<AppState>,
    Json(req): Json<TranscribeRequest>,
) -> MisResult<Json<TranscribeResponse>> {
    let audio = base64::engine::general_purpose::STANDARD
        .decode(req.audio_bytes.as_bytes())
        .map_err(|e| MisError::InvalidRequest(format!("invalid base64 audio: {e}")))?;

    let segments = state
        .models
        .transcribe(&audio)?
        .into_iter()
        .map(|(start_s, end_s, text)| TranscribeSegment { start_s, end_s, text })
        .collect();

    Ok(Json(TranscribeResponse { segments }))
}

#[derive(Debug, Deserialize)]
pub struct EmbedTextRequest {
    pub texts: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct EmbedResponse {
    pub vectors: Vec<Vec<f32>>,
}

pub async fn embed_text(
    State(state): State<AppState>,
    Json(req): Json<EmbedTextRequest>,
) -> MisResult<Json<EmbedResponse>> {
    if req.texts.is_empty() {
        return Err(MisError::InvalidRequest("texts must not be empty".to_string()));
    }

    let vectors = state.models.embed_text(&req.texts)?;
    Ok(Json(EmbedResponse { vectors }))
}

#[derive(Debug, Deserialize)]
pub struct EmbedImageRequest {
    pub images: Vec<String>,
}

pub async fn embed_image(
    State(state): State<AppState>,
    Json(req): Json<EmbedImageRequest>,
) -> MisResult<Json<EmbedResponse>> {
    if req.images.is_empty() {
        return Err(MisError::InvalidRequest("images must not be empty".to_string()));
    }

    let images: Vec<Vec<u8>> = req
        .images
        .iter()
        .map(|s| {
            base64::engine::general_purpose::STANDARD
                .decode(s.as_bytes())
                .map_err(|e| MisError::InvalidRequest(format!("invalid base64 image: {e}")))
        })
        .collect::<MisResult<_>>()?;

    let vectors = state.models.embed_image(&images)?;
    Ok(Json(EmbedResponse { vectors }))
}

#[derive(Debug, Deserialize)]
pub struct DetectFacesRequest {
    pub image_bytes: String,
}

#[derive(Debug, Serialize)]
pub struct FaceDetection {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub confidence: f64,
}

#[derive(Debug, Serialize)]
pub struct DetectFacesResponse {
    pub faces: Vec<FaceDetection>,
}

pub async fn detect_faces(
    State(state): State<AppState>,
    Json(req): Json<DetectFacesRequest>,
) -> MisResult<Json<DetectFacesResponse>> {
    let image = base64::engine::general_purpose::STANDARD
        .decode(req.image_bytes.as_bytes())
        .map_err(|e| MisError::InvalidRequest(format!("invalid base64 image: {e}")))?;

    let faces = state
        .models
        .detect_faces(&image)?
        .into_iter()
        .map(|(x, y, width, height, confidence)| FaceDetection {
            x,
            y,
            width,
            height,
            confidence,
        })
        .collect();

    Ok(Json(DetectFacesResponse { faces }))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub loaded_models: Vec<String>,
    pub device: String,
    pub memory_used_bytes: u64,
    pub text_embedding_dim: usize,
    pub image_embedding_dim: usize,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        loaded_models: state.models.loaded_model_names(),
        device: state.models.device().to_string(),
        memory_used_bytes: 0,
        text_embedding_dim: state.text_embedding_dim(),
        image_embedding_dim: state.image_embedding_dim(),
    })
}

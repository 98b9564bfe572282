//! Wire types for the Model Inference Service's request/response bodies.

use serde::{Deserialize, Serialize};

/// `transcribe` request: the raw audio bytes (base64 over the wire) plus
/// an optional language hint (e.g. `"en"`) to skip language detection.
#[derive(Debug, Clone, Serialize)]
pub struct TranscribeRequest {
    #[serde(with = "base64_bytes")]
    pub audio_bytes: Vec<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_hint: Option<String>,
}

/// A single transcript segment. Segments from one response have
/// monotonically non-decreasing `start_s` and `end_s >= start_s`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TranscribeSegment {
    pub start_s: f64,
    pub end_s: f64,
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranscribeResponse {
    pub segments: Vec<TranscribeSegment>,
}

/// `embed_text` request: one or more strings to embed in a single batch.
#[derive(Debug, Clone, Serialize)]
pub struct EmbedTextRequest {
    pub texts: Vec<String>,
}

/// `embed_image` request: one or more images (raw bytes, base64 over the wire).
#[derive(Debug, Clone, Serialize)]
pub struct EmbedImageRequest {
    #[serde(with = "base64_bytes_vec")]
    pub images: Vec<Vec<u8>>,
}

/// Response shared by `embed_text` and `embed_image`: one L2-normalized
/// vector per input, in input order.
#[derive(Debug, Clone, Deserialize)]
pub struct EmbedResponse {
    pub vectors: Vec<Vec<f32>>,
}

/// `detect_faces` request: a single image to scan for faces.
#[derive(Debug, Clone, Serialize)]
pub struct DetectFacesRequest {
    #[serde(with = "base64_bytes")]
    pub image_bytes: Vec<u8>,
}

/// A detected face: a normalized bounding box plus a confidence score.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct FaceDetection {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub confidence: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetectFacesResponse {
    pub faces: Vec<FaceDetection>,
}

/// `health` response: which models are resident, what device they run on,
/// and the compile-time embedding dimensions the caller must agree with.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HealthResponse {
    pub loaded_models: Vec<String>,
    pub device: String,
    pub memory_used_bytes: u64,
    pub text_embedding_dim: usize,
    pub image_embedding_dim: usize,
}

mod base64_bytes {
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&base64::engine::general_purpose::STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(d)?;
        base64::engine::general_purpose::STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

mod base64_bytes_vec {
    use base64::Engine;
    use serde::{Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(images: &[Vec<u8>], s: S) -> Result<S::Ok, S::Error> {
        let encoded: Vec<String> = images
            .iter()
            .map(|b| base64::engine::general_purpose::STANDARD.encode(b))
            .collect();
        encoded.serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Vec<u8>>, D::Error> {
        let encoded: Vec<String> = serde::Deserialize::deserialize(d)?;
        encoded
            .into_iter()
            .map(|s| {
                base64::engine::general_purpose::STANDARD
                    .decode(s.as_bytes())
                    .map_err(serde::de::Error::custom)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcribe_request_roundtrips_audio_bytes() {
        let req = TranscribeRequest {
            audio_bytes: vec![0u8, 1, 2, 255],
            language_hint: Some("en".to_string()),
        };
        let json = serde_json::to_string(&req).expect("serialize");
        assert!(json.contains("language_hint"));
    }
}

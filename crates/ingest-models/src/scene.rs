//! Scene entity: the unit of retrieval the pipeline produces.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use uuid::Uuid;

use crate::video::VideoId;

/// Dense text-embedding dimension, fixed across the workspace.
pub const TEXT_EMBEDDING_DIM: usize = 1024;

/// Dense image-embedding dimension, fixed across the workspace.
pub const IMAGE_EMBEDDING_DIM: usize = 1152;

/// Unique identifier for a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct SceneId(pub Uuid);

impl SceneId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SceneId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for SceneId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

/// A unit-normalized dense vector of a fixed dimension.
///
/// Carried as `Vec<f32>` at this layer; the relational-store crate maps it
/// onto a native vector column type at the boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct Embedding(pub Vec<f32>);

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn dim(&self) -> usize {
        self.0.len()
    }

    /// L2 norm of the embedding.
    pub fn norm(&self) -> f32 {
        self.0.iter().map(|v| v * v).sum::<f32>().sqrt()
    }

    /// Whether the embedding is unit-normalized within tolerance
    /// (norm in [0.999, 1.001]), per the scene invariant.
    pub fn is_unit_normalized(&self) -> bool {
        let n = self.norm();
        (0.999..=1.001).contains(&n)
    }
}

/// A scene: a contiguous, non-overlapping time interval of a video together
/// with its transcript and derived representations.
///
/// Scenes are only materialized by the build-sidecar/commit stages; they do
/// not exist before a video reaches `Indexed`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Scene {
    pub scene_id: SceneId,
    pub video_id: VideoId,
    pub start_s: f64,
    pub end_s: f64,
    pub transcript: String,
    /// Dense representation of `transcript`, dimension `TEXT_EMBEDDING_DIM`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_vec: Option<Embedding>,
    /// Dense representation of the sampled frame(s), dimension `IMAGE_EMBEDDING_DIM`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_vec: Option<Embedding>,
    /// Structured key/value tags derived from vision analysis.
    #[serde(default)]
    pub vision_tags: JsonValue,
    /// Path to the scene's sidecar JSON in the `sidecars` bucket.
    pub sidecar_key: String,
}

impl Scene {
    pub fn new(
        video_id: VideoId,
        start_s: f64,
        end_s: f64,
        transcript: impl Into<String>,
        sidecar_key: impl Into<String>,
    ) -> Self {
        Self {
            scene_id: SceneId::new(),
            video_id,
            start_s,
            end_s,
            transcript: transcript.into(),
            text_vec: None,
            image_vec: None,
            vision_tags: JsonValue::Object(Default::default()),
            sidecar_key: sidecar_key.into(),
        }
    }

    pub fn duration_s(&self) -> f64 {
        self.end_s - self.start_s
    }

    pub fn with_text_vec(mut self, vec: Embedding) -> Self {
        self.text_vec = Some(vec);
        self
    }

    pub fn with_image_vec(mut self, vec: Embedding) -> Self {
        self.image_vec = Some(vec);
        self
    }
}

/// Validate that a sequence of (start_s, end_s) intervals for one video is
/// non-overlapping and covers a monotone non-decreasing timeline, per the
/// Scene invariant.
pub fn intervals_are_well_formed(intervals: &[(f64, f64)]) -> bool {
    let mut prev_end: Option<f64> = None;
    for &(start, end) in intervals {
        if end <= start {
            return false;
        }
        if let Some(prev) = prev_end {
            if start < prev {
                return false;
            }
        }
        prev_end = Some(end);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedding_norm_detects_non_unit_vectors() {
        let e = Embedding::new(vec![1.0, 0.0, 0.0]);
        assert!(e.is_unit_normalized());

        let e2 = Embedding::new(vec![2.0, 0.0, 0.0]);
        assert!(!e2.is_unit_normalized());
    }

    #[test]
    fn well_formed_intervals_reject_overlap_and_inversion() {
        assert!(intervals_are_well_formed(&[(0.0, 2.0), (2.0, 5.0), (5.0, 9.0)]));
        assert!(!intervals_are_well_formed(&[(0.0, 2.0), (1.5, 5.0)]));
        assert!(!intervals_are_well_formed(&[(2.0, 2.0)]));
        assert!(!intervals_are_well_formed(&[(3.0, 1.0)]));
    }

    #[test]
    fn scene_starts_with_empty_vision_tags_object() {
        let s = Scene::new(VideoId::new(), 0.0, 2.0, "hello", "sidecars/v/0.json");
        assert!(s.vision_tags.is_object());
        assert!(s.vision_tags.as_object().unwrap().is_empty());
    }
}

//! Face profile entity.
//!
//! Present in the schema for a future enrollment/recognition workflow; the
//! indexing pipeline never writes to it today (it only exposes
//! `detect_faces` on the inference client).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::scene::Embedding;
use crate::user::UserId;

/// Dense face-embedding dimension.
pub const FACE_EMBEDDING_DIM: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct FaceProfileId(pub Uuid);

impl FaceProfileId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for FaceProfileId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FaceProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FaceProfile {
    pub face_profile_id: FaceProfileId,
    pub user_id: UserId,
    pub name: String,
    pub photo_key: String,
    pub face_vec: Embedding,
}

impl FaceProfile {
    pub fn new(
        user_id: UserId,
        name: impl Into<String>,
        photo_key: impl Into<String>,
        face_vec: Embedding,
    ) -> Self {
        Self {
            face_profile_id: FaceProfileId::new(),
            user_id,
            name: name.into(),
            photo_key: photo_key.into(),
            face_vec,
        }
    }
}

//! Client for the Model Inference Service: transcription, text/image
//! embedding, and face detection over a local network boundary.

pub mod client;
pub mod error;
pub mod types;

pub use client::{MisClient, MisClientConfig};
pub use error::{MisError, MisResult};
pub use types::{
    DetectFacesRequest, DetectFacesResponse, EmbedImageRequest, EmbedResponse, EmbedTextRequest,
    FaceDetection, HealthResponse, TranscribeRequest, TranscribeResponse, TranscribeSegment,
};

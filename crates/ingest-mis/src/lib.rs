//! Model Inference Service: loads a fixed set of models once at startup
//! and exposes synchronous `transcribe`/`embed_text`/`embed_image`/
//! `detect_faces`/`health` operations over HTTP. Stateless per request;
//! the only component in the workspace permitted to hold model memory.

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod registry;
pub mod routes;
pub mod state;

pub use config::MisConfig;
pub use error::{MisError, MisResult};
pub use registry::{ModelPaths, ModelRegistry};
pub use routes::create_router;
pub use state::AppState;

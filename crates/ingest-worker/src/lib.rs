#![deny(unreachable_patterns)]
//! Indexing pipeline worker.
//!
//! Consumes `video_id` ingest tasks from the Job Queue and runs each one
//! through the ten-stage pipeline: validate, extract audio, transcribe,
//! detect scenes, align, embed text, sample frames, embed vision, build
//! the sidecar, commit.

pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod pipeline;

pub use config::WorkerConfig;
pub use context::WorkerContext;
pub use error::{WorkerError, WorkerResult};
pub use executor::JobExecutor;

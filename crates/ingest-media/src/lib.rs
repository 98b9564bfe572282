#![deny(unreachable_patterns)]
//! FFmpeg CLI wrapper used by the indexing pipeline.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building and a progress-aware runner
//! - FFprobe-based media inspection
//! - Audio extraction to the mono 16kHz PCM format the ASR model expects
//! - Representative-frame sampling for the vision-embedding stage
//! - Threshold-based scene-cut detection via FFmpeg's `scene` filter

pub mod audio;
pub mod command;
pub mod error;
pub mod frame;
pub mod fs_utils;
pub mod probe;
pub mod progress;
pub mod scene_detect;

pub use audio::{extract_audio, TARGET_CHANNELS, TARGET_SAMPLE_RATE};
pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use frame::sample_scene_frame;
pub use fs_utils::move_file;
pub use probe::{get_duration, probe_video, VideoInfo};
pub use progress::{FfmpegProgress, ProgressCallback};
pub use scene_detect::{detect_scene_cuts, DEFAULT_SCENE_THRESHOLD, MIN_SCENE_LEN_S};

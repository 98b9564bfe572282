//! Single-frame sampling for the vision-embedding stage.
//!
//! Each scene contributes one representative frame, sampled at the
//! midpoint of its interval. If the midpoint seek fails (e.g. the
//! scene is shorter than a keyframe interval right at the tail of the
//! file), fall back to the scene's start timestamp before giving up.

use std::path::Path;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;

/// Extract a single JPEG frame from `input` at `timestamp_s` into `output`.
async fn extract_frame_at(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    timestamp_s: f64,
) -> MediaResult<()> {
    let cmd = FfmpegCommand::new(input, output)
        .seek(timestamp_s.max(0.0))
        .single_frame()
        .output_arg("-q:v")
        .output_arg("2")
        .log_level("error");

    FfmpegRunner::new().run(&cmd).await
}

/// Sample the representative frame for a scene spanning `[start_s, end_s)`.
///
/// Tries the midpoint `(start_s + end_s) / 2` first; falls back to
/// `start_s` if that seek fails.
pub async fn sample_scene_frame(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    start_s: f64,
    end_s: f64,
) -> MediaResult<()> {
    let input = input.as_ref();
    let output = output.as_ref();
    let midpoint = (start_s + end_s) / 2.0;

    match extract_frame_at(input, output, midpoint).await {
        Ok(()) => Ok(()),
        Err(_) => extract_frame_at(input, output, start_s).await,
    }
}

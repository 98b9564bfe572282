//! Audio extraction: transcode a source video to mono 16kHz PCM WAV,
//! the format the transcription model expects.

use std::path::Path;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;

/// Sample rate (Hz) and channel count the ASR model is trained on.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;
pub const TARGET_CHANNELS: u32 = 1;

/// Extract the audio track of `input` into a mono 16kHz PCM16 WAV file at `output`.
pub async fn extract_audio(input: impl AsRef<Path>, output: impl AsRef<Path>) -> MediaResult<()> {
    let cmd = FfmpegCommand::new(input, output)
        .output_arg("-vn")
        .output_arg("-ac")
        .output_arg(TARGET_CHANNELS.to_string())
        .output_arg("-ar")
        .output_arg(TARGET_SAMPLE_RATE.to_string())
        .output_arg("-c:a")
        .output_arg("pcm_s16le")
        .log_level("error");

    FfmpegRunner::new().run(&cmd).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_format_is_16k_mono() {
        assert_eq!(TARGET_SAMPLE_RATE, 16_000);
        assert_eq!(TARGET_CHANNELS, 1);
    }
}

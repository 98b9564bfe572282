//! The ten pipeline stage bodies.
//!
//! Each function here is a pure step: given inputs already fetched by
//! [`super::run`], do one unit of work and return its output or a
//! classified [`WorkerError`]. Orchestration — Job bookkeeping, stage
//! ordering, the Video state machine — lives in `pipeline::mod`.

use std::path::Path;

use ingest_media::DEFAULT_SCENE_THRESHOLD;
use ingest_mis_client::TranscribeSegment;
use ingest_models::{Embedding, Scene, Video};
use ingest_storage::Bucket;
use tracing::warn;

use crate::context::WorkerContext;
use crate::error::{WorkerError, WorkerResult};

/// Map a media-layer error onto fatal vs. transient. A probe or codec
/// failure that indicates the source file itself is unplayable is
/// fatal; anything else (missing binary, timeout, IO) is an
/// environment hiccup worth retrying.
fn classify_media_error(e: ingest_media::MediaError) -> WorkerError {
    use ingest_media::MediaError;
    match &e {
        MediaError::FfprobeFailed { .. }
        | MediaError::FfmpegFailed { .. }
        | MediaError::InvalidVideo(_)
        | MediaError::UnsupportedFormat(_) => WorkerError::invalid_media(e.to_string()),
        _ => WorkerError::Media(e),
    }
}

/// Stage 1: download the source object and probe its duration.
///
/// Returns the duration in seconds. Fails with [`WorkerError::duration_exceeded`]
/// over the 600s ceiling, or [`WorkerError::invalid_media`] if the probe
/// cannot decode the file.
pub async fn validate(
    ctx: &WorkerContext,
    video: &Video,
    local_source: &Path,
) -> WorkerResult<f64> {
    ctx.storage
        .download_file(Bucket::Uploads, &video.storage_key, local_source)
        .await?;

    let duration_s = ingest_media::get_duration(local_source)
        .await
        .map_err(classify_media_error)?;

    if duration_s > ingest_models::MAX_DURATION_SECS {
        return Err(WorkerError::duration_exceeded(format!(
            "duration {duration_s:.1}s exceeds the {:.0}s maximum",
            ingest_models::MAX_DURATION_SECS
        )));
    }

    Ok(duration_s)
}

/// Stage 2: transcode the source to mono 16kHz PCM for the ASR model.
pub async fn audio_extract(local_source: &Path, audio_out: &Path) -> WorkerResult<()> {
    ingest_media::extract_audio(local_source, audio_out)
        .await
        .map_err(classify_media_error)?;
    Ok(())
}

/// Stage 3: call the Model Inference Service's transcription endpoint.
pub async fn asr(
    ctx: &WorkerContext,
    audio_bytes: Vec<u8>,
) -> WorkerResult<Vec<TranscribeSegment>> {
    let segments = ctx.mis.transcribe(audio_bytes, None).await?;
    Ok(segments)
}

/// Stage 4: detect scene-cut boundaries and bracket them into
/// `[start, end)` intervals covering the whole clip.
pub async fn scene_detect(local_source: &Path, duration_s: f64) -> WorkerResult<Vec<(f64, f64)>> {
    let cuts = ingest_media::detect_scene_cuts(local_source, duration_s, DEFAULT_SCENE_THRESHOLD)
        .await
        .map_err(classify_media_error)?;

    let mut bounds = Vec::with_capacity(cuts.len() + 2);
    bounds.push(0.0);
    bounds.extend(cuts);
    bounds.push(duration_s);

    Ok(bounds.windows(2).map(|w| (w[0], w[1])).collect())
}

/// Stage 5: for each scene interval, concatenate the ASR segments that
/// overlap it, in time order, whitespace-joined. Segments may
/// contribute to more than one scene; that is intentional.
pub async fn align(
    intervals: &[(f64, f64)],
    segments: &[TranscribeSegment],
) -> WorkerResult<Vec<String>> {
    Ok(intervals
        .iter()
        .map(|&(a, b)| {
            segments
                .iter()
                .filter(|s| s.start_s < b && s.end_s > a)
                .map(|s| s.text.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect())
}

/// Re-normalize a vector the Model Inference Service already claims is
/// unit-length, defensively, per the spec's allowance for callers to
/// re-normalize.
fn l2_normalize(values: Vec<f32>) -> Embedding {
    let norm = values.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        Embedding::new(values.into_iter().map(|v| v / norm).collect())
    } else {
        Embedding::new(values)
    }
}

/// Stage 6: embed every non-empty transcript in a single batch call.
/// Empty-transcript scenes get `None`.
pub async fn embed_text(
    ctx: &WorkerContext,
    transcripts: &[String],
) -> WorkerResult<Vec<Option<Embedding>>> {
    let non_empty: Vec<usize> = transcripts
        .iter()
        .enumerate()
        .filter(|(_, t)| !t.trim().is_empty())
        .map(|(i, _)| i)
        .collect();

    if non_empty.is_empty() {
        return Ok(vec![None; transcripts.len()]);
    }

    let texts: Vec<String> = non_empty.iter().map(|&i| transcripts[i].clone()).collect();
    let vectors = ctx.mis.embed_text(texts).await?;

    let mut out = vec![None; transcripts.len()];
    for (idx, vector) in non_empty.into_iter().zip(vectors) {
        out[idx] = Some(l2_normalize(vector));
    }
    Ok(out)
}

/// Stage 7: sample one representative frame per scene. A scene that
/// fails both the midpoint and start-time seek is kept without a
/// frame — embed_vision skips it.
pub async fn sample_frames(
    intervals: &[(f64, f64)],
    local_source: &Path,
    frames_dir: &Path,
) -> WorkerResult<Vec<Option<Vec<u8>>>> {
    let mut out = Vec::with_capacity(intervals.len());
    for (i, &(a, b)) in intervals.iter().enumerate() {
        let frame_path = frames_dir.join(format!("scene-{i}.jpg"));
        match ingest_media::sample_scene_frame(local_source, &frame_path, a, b).await {
            Ok(()) => match tokio::fs::read(&frame_path).await {
                Ok(bytes) => out.push(Some(bytes)),
                Err(e) => {
                    warn!(scene = i, error = %e, "sampled frame vanished before read");
                    out.push(None);
                }
            },
            Err(e) => {
                warn!(scene = i, error = %e, "frame sampling failed for both midpoint and start, skipping image_vec");
                out.push(None);
            }
        }
    }
    Ok(out)
}

/// Stage 8: batch-embed every sampled frame.
pub async fn embed_vision(
    ctx: &WorkerContext,
    frames: &[Option<Vec<u8>>],
) -> WorkerResult<Vec<Option<Embedding>>> {
    let present: Vec<usize> = frames
        .iter()
        .enumerate()
        .filter(|(_, f)| f.is_some())
        .map(|(i, _)| i)
        .collect();

    if present.is_empty() {
        return Ok(vec![None; frames.len()]);
    }

    let images: Vec<Vec<u8>> = present
        .iter()
        .map(|&i| frames[i].clone().expect("filtered to Some"))
        .collect();
    let vectors = ctx.mis.embed_image(images).await?;

    let mut out = vec![None; frames.len()];
    for (idx, vector) in present.into_iter().zip(vectors) {
        out[idx] = Some(l2_normalize(vector));
    }
    Ok(out)
}

/// Stage 9: upload one sidecar JSON document per scene and return the
/// built `Scene` rows, `sidecar_key` populated.
pub async fn build_sidecar(
    ctx: &WorkerContext,
    video: &Video,
    intervals: &[(f64, f64)],
    transcripts: Vec<String>,
    text_vecs: Vec<Option<Embedding>>,
    image_vecs: Vec<Option<Embedding>>,
) -> WorkerResult<Vec<Scene>> {
    let mut scenes = Vec::with_capacity(intervals.len());

    for (i, &(start_s, end_s)) in intervals.iter().enumerate() {
        let transcript = transcripts[i].clone();
        let mut scene = Scene::new(video.video_id, start_s, end_s, transcript.clone(), "");

        let sidecar_key = format!(
            "sidecars/{}/{}/{}.json",
            video.user_id.0, video.video_id.0, scene.scene_id.0
        );

        let body = serde_json::json!({
            "scene_id": scene.scene_id.0,
            "video_id": video.video_id.0,
            "start_s": start_s,
            "end_s": end_s,
            "transcript": transcript,
            "vision_tags": {},
        });
        let bytes = serde_json::to_vec(&body).map_err(|e| WorkerError::pipeline(e.to_string()))?;

        ctx.storage
            .upload_bytes(Bucket::Sidecars, bytes, &sidecar_key, "application/json")
            .await?;

        scene.sidecar_key = sidecar_key;
        if let Some(v) = text_vecs[i].clone() {
            scene = scene.with_text_vec(v);
        }
        if let Some(v) = image_vecs[i].clone() {
            scene = scene.with_image_vec(v);
        }
        scenes.push(scene);
    }

    Ok(scenes)
}

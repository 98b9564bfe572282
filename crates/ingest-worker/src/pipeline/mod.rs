//! Pipeline orchestration: the entry guard, the per-video advisory
//! lock, and the ten strictly-sequential stages.

pub mod stages;

use std::future::Future;

use ingest_db::VideoLock;
use ingest_models::{Job, JobState, Scene, Stage, Video, VideoId};
use tracing::{info, warn};

use crate::context::WorkerContext;
use crate::error::{WorkerError, WorkerResult};

/// Run the full ten-stage pipeline for `video_id`.
///
/// A no-op (`Ok(())` with no work done) covers both cases the entry
/// guard is meant to neutralize: a video no longer eligible for entry,
/// and a video already locked by another worker. Both are
/// indistinguishable from the caller's perspective — the task is safe
/// to acknowledge either way.
pub async fn run(ctx: &WorkerContext, video_id: VideoId) -> WorkerResult<()> {
    let video = ctx.videos.get(&video_id).await?;

    if !video.is_pipeline_entry_eligible() {
        info!(%video_id, state = %video.state, "video not eligible for pipeline entry, skipping");
        return Ok(());
    }

    let lock = match VideoLock::try_acquire(&ctx.pool, &video_id).await? {
        Some(lock) => lock,
        None => {
            info!(%video_id, "video already locked by another worker, skipping");
            return Ok(());
        }
    };

    let result = run_locked(ctx, video).await;

    if let Err(e) = lock.release().await {
        warn!(%video_id, error = %e, "failed to release advisory lock");
    }

    result
}

async fn run_locked(ctx: &WorkerContext, video: Video) -> WorkerResult<()> {
    let video_id = video.video_id;
    cancel_stale_jobs(ctx, &video).await?;

    tokio::fs::create_dir_all(&ctx.config.work_dir).await?;
    let work_dir = tempfile::Builder::new()
        .prefix("ingest-worker-")
        .tempdir_in(&ctx.config.work_dir)?;

    let local_source = work_dir.path().join("source");
    let audio_path = work_dir.path().join("audio.wav");
    let frames_dir = work_dir.path().join("frames");
    tokio::fs::create_dir_all(&frames_dir).await?;

    let duration_s = match run_stage(ctx, &video, Stage::UploadValidate, || {
        stages::validate(ctx, &video, &local_source)
    })
    .await
    {
        Ok(d) => d,
        Err(e) => return finish_with_error(ctx, video, e).await,
    };

    let video = video.begin_processing(duration_s);
    ctx.videos.save(&video).await?;

    if let Err(e) = run_stage(ctx, &video, Stage::AudioExtract, || {
        stages::audio_extract(&local_source, &audio_path)
    })
    .await
    {
        return finish_with_error(ctx, video, e).await;
    }

    let audio_bytes = match tokio::fs::read(&audio_path).await {
        Ok(b) => b,
        Err(e) => return finish_with_error(ctx, video, WorkerError::from(e)).await,
    };

    let segments = match run_stage(ctx, &video, Stage::Asr, || stages::asr(ctx, audio_bytes)).await
    {
        Ok(s) => s,
        Err(e) => return finish_with_error(ctx, video, e).await,
    };

    let intervals = match run_stage(ctx, &video, Stage::SceneDetect, || {
        stages::scene_detect(&local_source, duration_s)
    })
    .await
    {
        Ok(i) => i,
        Err(e) => return finish_with_error(ctx, video, e).await,
    };

    let transcripts = match run_stage(ctx, &video, Stage::Align, || {
        stages::align(&intervals, &segments)
    })
    .await
    {
        Ok(t) => t,
        Err(e) => return finish_with_error(ctx, video, e).await,
    };

    let text_vecs = match run_stage(ctx, &video, Stage::EmbedText, || {
        stages::embed_text(ctx, &transcripts)
    })
    .await
    {
        Ok(v) => v,
        Err(e) => return finish_with_error(ctx, video, e).await,
    };

    let frames = match run_stage(ctx, &video, Stage::SampleFrames, || {
        stages::sample_frames(&intervals, &local_source, &frames_dir)
    })
    .await
    {
        Ok(f) => f,
        Err(e) => return finish_with_error(ctx, video, e).await,
    };

    let image_vecs = match run_stage(ctx, &video, Stage::EmbedVision, || {
        stages::embed_vision(ctx, &frames)
    })
    .await
    {
        Ok(v) => v,
        Err(e) => return finish_with_error(ctx, video, e).await,
    };

    let scenes = match run_stage(ctx, &video, Stage::BuildSidecar, || {
        stages::build_sidecar(ctx, &video, &intervals, transcripts, text_vecs, image_vecs)
    })
    .await
    {
        Ok(s) => s,
        Err(e) => return finish_with_error(ctx, video, e).await,
    };

    // `committed_video` carries the Indexed transition for the commit
    // transaction; `video` stays at its pre-commit state so a failed
    // commit can still fall back to it without implying `indexed_at`
    // is set on a video that never actually reached `Indexed`.
    let committed_video = video.clone().mark_indexed();
    let commit_result = run_commit_stage(ctx, &video, &committed_video, &scenes).await;

    if let Err(e) = commit_result {
        return finish_with_error(ctx, video, e).await;
    }

    info!(%video_id, scenes = scenes.len(), "video indexed");
    Ok(())
}

/// A stage either completes (and its Job row is marked `completed`) or
/// fails fatally (Job row marked `failed`, caller marks the video
/// failed too) or fails transiently (Job row is left `running` for the
/// crash-recovery sweep; no video state change).
async fn run_stage<F, Fut, T>(
    ctx: &WorkerContext,
    video: &Video,
    stage: Stage,
    f: F,
) -> WorkerResult<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = WorkerResult<T>>,
{
    let job = Job::new_pending(video.video_id, stage).start();
    ctx.jobs.create(&job).await?;

    match f().await {
        Ok(value) => {
            let done = job.with_progress(100).complete();
            ctx.jobs.save(&done).await?;
            Ok(value)
        }
        Err(e) => {
            if e.is_fatal() {
                let failed = job.fail(e.to_string());
                if let Err(save_err) = ctx.jobs.save(&failed).await {
                    warn!(video_id = %video.video_id, %stage, error = %save_err, "failed to persist job failure");
                }
            }
            Err(e)
        }
    }
}

/// The commit stage's Job row, unlike the other nine, completes inside
/// `ingest_db::commit_video`'s own transaction rather than via a
/// follow-up write — so a crash between that transaction committing and
/// a separate `Job` save can never leave a video `Indexed` with its
/// `commit` row still `running`.
async fn run_commit_stage(
    ctx: &WorkerContext,
    video: &Video,
    committed_video: &Video,
    scenes: &[Scene],
) -> WorkerResult<()> {
    let job = Job::new_pending(video.video_id, Stage::Commit).start();
    ctx.jobs.create(&job).await?;

    let done = job.clone().with_progress(100).complete();
    match ingest_db::commit_video(&ctx.pool, committed_video, scenes, &done).await {
        Ok(()) => Ok(()),
        Err(e) => {
            let e = WorkerError::from(e);
            if e.is_fatal() {
                let failed = job.fail(e.to_string());
                if let Err(save_err) = ctx.jobs.save(&failed).await {
                    warn!(video_id = %video.video_id, stage = %Stage::Commit, error = %save_err, "failed to persist job failure");
                }
            }
            Err(e)
        }
    }
}

/// Mark the video and its in-flight job failed, for fatal errors.
/// Transient errors are returned unchanged without touching video
/// state, per the spec's failure semantics.
async fn finish_with_error(
    ctx: &WorkerContext,
    video: Video,
    error: WorkerError,
) -> WorkerResult<()> {
    if error.is_fatal() {
        let failed_video = video.mark_failed(error.video_error_text());
        ctx.videos.save(&failed_video).await?;
        warn!(video_id = %failed_video.video_id, error = %error, "pipeline failed fatally");
    } else {
        info!(video_id = %video.video_id, error = %error, "pipeline stage failed transiently, leaving state untouched for redelivery");
    }
    Err(error)
}

/// Cancel any job rows left `pending`/`running` from a previous,
/// incomplete attempt at this video, preserving the at-most-one-active
/// job per stage invariant before this attempt creates fresh rows.
async fn cancel_stale_jobs(ctx: &WorkerContext, video: &Video) -> WorkerResult<()> {
    let existing = ctx.jobs.list_for_video(&video.video_id).await?;
    for job in existing {
        if matches!(job.state, JobState::Pending | JobState::Running) {
            ctx.jobs.save(&job.cancel()).await?;
        }
    }
    Ok(())
}

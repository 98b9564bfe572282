//! Upload Control Plane handlers: `init_upload`, `complete_upload`,
//! `list_videos`, `get_video`.

use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use ingest_models::{Job, Stage, Video, VideoId, VideoState, MAX_SIZE_BYTES};
use ingest_storage::Bucket;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::metrics::{record_upload_completed, record_upload_initiated};
use crate::security::{sanitize_filename, sanitize_text, validate_filename, MAX_TITLE_LENGTH};
use crate::state::AppState;

/// MIME types `init_upload` accepts, per §4.1.
const ALLOWED_MIME_TYPES: &[&str] = &[
    "video/mp4",
    "video/quicktime",
    "video/x-msvideo",
    "video/x-matroska",
    "video/webm",
];

const DEFAULT_PAGE_SIZE: i64 = 25;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct InitUploadRequest {
    pub filename: String,
    pub mime_type: String,
    pub size_bytes: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InitUploadResponse {
    pub video_id: Uuid,
    pub upload_url: String,
    pub expires_at: DateTime<Utc>,
}

/// `init_upload(user, filename, mime_type, size_bytes, title?, description?)`.
///
/// Never fails with a duplicate-check error — every call allocates a fresh
/// `video_id`, even for a byte-identical request.
pub async fn init_upload(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<InitUploadRequest>,
) -> ApiResult<Json<InitUploadResponse>> {
    validate_filename(&req.filename).map_err(ApiError::invalid_input)?;

    if !ALLOWED_MIME_TYPES.contains(&req.mime_type.as_str()) {
        return Err(ApiError::invalid_input(format!(
            "mime_type must be one of: {}",
            ALLOWED_MIME_TYPES.join(", ")
        )));
    }

    if req.size_bytes == 0 || req.size_bytes > MAX_SIZE_BYTES {
        return Err(ApiError::invalid_input(format!(
            "size_bytes must be in (0, {MAX_SIZE_BYTES}]"
        )));
    }

    // Title/description are accepted for parity with the create-video
    // request shape but have no column of their own on `Video` in this
    // version of the schema; sanitizing them here (rather than silently
    // dropping unsanitized input) keeps the contract honest for a future
    // column without doing SaaS bookkeeping this spec doesn't ask for.
    let _title = req.title.as_deref().map(|t| sanitize_text(t, MAX_TITLE_LENGTH));
    let _description = req.description.as_deref().map(|t| sanitize_text(t, 5000));

    let user = state.user_service.resolve(&auth).await?;

    let filename = sanitize_filename(&req.filename);
    let mut video = Video::new_uploading(user.user_id, "", &req.mime_type, req.size_bytes);
    video.storage_key = format!(
        "uploads/{}/{}/{}",
        user.user_id.as_uuid(),
        video.video_id.as_uuid(),
        filename
    );

    state.videos.create(&video).await?;

    let upload_url = state
        .storage
        .presign_put(
            Bucket::Uploads,
            &video.storage_key,
            &req.mime_type,
            state.config.upload_url_ttl,
        )
        .await?;

    info!(video_id = %video.video_id, user_id = %user.user_id, "upload initiated");
    record_upload_initiated();

    Ok(Json(InitUploadResponse {
        video_id: video.video_id.as_uuid(),
        upload_url,
        expires_at: Utc::now() + chrono_duration(state.config.upload_url_ttl),
    }))
}

fn chrono_duration(d: Duration) -> chrono::Duration {
    chrono::Duration::from_std(d).unwrap_or(chrono::Duration::minutes(15))
}

#[derive(Debug, Deserialize)]
pub struct CompleteUploadRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CompleteUploadResponse {
    pub state: &'static str,
}

/// `complete_upload(user, video_id, title?, description?)`.
///
/// Idempotent modulo state: repeated calls while `state` is already past
/// `Uploading` return the current state without re-enqueueing.
pub async fn complete_upload(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(video_id): Path<Uuid>,
    Json(_req): Json<CompleteUploadRequest>,
) -> ApiResult<Json<CompleteUploadResponse>> {
    let user = state.user_service.resolve(&auth).await?;
    let video_id = VideoId(video_id);

    let video = state.videos.get_owned(&user.user_id, &video_id).await?;

    match video.state {
        VideoState::Uploading => {}
        other => {
            return Ok(Json(CompleteUploadResponse {
                state: other.as_str(),
            }))
        }
    }

    // `stat` folds a missing object onto `ApiError::NotReady` via
    // `From<StorageError>`, matching the "remain uploading" contract.
    state.storage.stat(Bucket::Uploads, &video.storage_key).await?;

    let video = video.begin_validating();
    state.videos.save(&video).await?;

    let job = Job::new_pending(video.video_id, Stage::UploadValidate);
    state.jobs.create(&job).await?;

    state.queue.enqueue_ingest(video.video_id).await?;

    info!(video_id = %video.video_id, "upload completed, pipeline task enqueued");
    record_upload_completed();

    Ok(Json(CompleteUploadResponse {
        state: video.state.as_str(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct ListVideosQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct VideoSummary {
    pub video_id: Uuid,
    pub state: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub duration_s: Option<f64>,
    pub error_text: Option<String>,
    pub created_at: DateTime<Utc>,
    pub indexed_at: Option<DateTime<Utc>>,
}

impl From<Video> for VideoSummary {
    fn from(v: Video) -> Self {
        Self {
            video_id: v.video_id.as_uuid(),
            state: v.state.as_str().to_string(),
            mime_type: v.mime_type,
            size_bytes: v.size_bytes,
            duration_s: v.duration_s,
            error_text: v.error_text,
            created_at: v.created_at,
            indexed_at: v.indexed_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListVideosResponse {
    pub videos: Vec<VideoSummary>,
}

/// `list_videos(user, limit, offset)`. Ordered newest first.
pub async fn list_videos(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListVideosQuery>,
) -> ApiResult<Json<ListVideosResponse>> {
    let user = state.user_service.resolve(&auth).await?;

    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0).max(0);

    let videos = state.videos.list_owned(&user.user_id, limit, offset).await?;

    Ok(Json(ListVideosResponse {
        videos: videos.into_iter().map(VideoSummary::from).collect(),
    }))
}

/// `get_video(user, video_id)`. Ownership-scoped.
pub async fn get_video(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(video_id): Path<Uuid>,
) -> ApiResult<Json<VideoSummary>> {
    let user = state.user_service.resolve(&auth).await?;
    let video = state
        .videos
        .get_owned(&user.user_id, &VideoId(video_id))
        .await?;
    Ok(Json(VideoSummary::from(video)))
}

/// `get_status(user, video_id)`. Ownership-scoped, read-only snapshot of
/// the video's state plus every job row recorded against it.
pub async fn get_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(video_id): Path<Uuid>,
) -> ApiResult<Json<StatusResponse>> {
    let user = state.user_service.resolve(&auth).await?;
    let video_id = VideoId(video_id);
    let video = state.videos.get_owned(&user.user_id, &video_id).await?;
    let jobs = state.jobs.list_for_video(&video_id).await?;

    Ok(Json(StatusResponse {
        video_id: video_id.as_uuid(),
        state: video.state.as_str().to_string(),
        error_text: video.error_text,
        jobs: jobs.into_iter().map(JobStatus::from).collect(),
    }))
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub video_id: Uuid,
    pub state: String,
    pub error_text: Option<String>,
    pub jobs: Vec<JobStatus>,
}

#[derive(Debug, Serialize)]
pub struct JobStatus {
    pub stage: String,
    pub state: String,
    pub progress: u8,
    pub error_text: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl From<Job> for JobStatus {
    fn from(j: Job) -> Self {
        Self {
            stage: j.stage.as_str().to_string(),
            state: j.state.as_str().to_string(),
            progress: j.progress,
            error_text: j.error_text,
            started_at: j.started_at,
            finished_at: j.completed_at,
        }
    }
}

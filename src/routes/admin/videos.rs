use axum::Json;
use axum::extract::{Path, State};
use axum::response::IntoResponse;

use crate::errors::{ApiError, ApiResponse};
use crate::models::dtos::{
    CreateVideoBodyDto, ReorderBodyDto, UpdateVideoBodyDto, UploadUrlBodyDto, UploadUrlResponseDto,
    VideoAdminResponseDto,
};
use crate::state::AppState;

/// Hands the browser a presigned PUT so the upload bypasses this server,
/// plus the object key to echo back on registration.
pub async fn upload_url(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UploadUrlBodyDto>,
) -> ApiResponse<impl IntoResponse> {
    state.courses.find(id).await?.ok_or(ApiError::NotFound)?;
    let (upload_url, path) = state.videos.upload_url(id, &body.filename)?;
    Ok(Json(UploadUrlResponseDto { upload_url, path }))
}

pub async fn create(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<CreateVideoBodyDto>,
) -> ApiResponse<impl IntoResponse> {
    state.courses.find(id).await?.ok_or(ApiError::NotFound)?;
    let video = state.videos.create(id, body).await?;
    let preview_url = state.videos.preview_url(&video);
    Ok(Json(VideoAdminResponseDto::new(video, preview_url)))
}

pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResponse<impl IntoResponse> {
    let video = state.videos.find(id).await?.ok_or(ApiError::NotFound)?;
    let preview_url = state.videos.preview_url(&video);
    Ok(Json(VideoAdminResponseDto::new(video, preview_url)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateVideoBodyDto>,
) -> ApiResponse<impl IntoResponse> {
    let video = state.videos.update(id, body).await?;
    let preview_url = state.videos.preview_url(&video);
    Ok(Json(VideoAdminResponseDto::new(video, preview_url)))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResponse<impl IntoResponse> {
    if !state.videos.delete(id).await? {
        return Err(ApiError::NotFound);
    }
    Ok(Json("ok!"))
}

/// Rewrites playback positions from the submitted order; the list must
/// name every video of the course exactly once.
pub async fn reorder(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<ReorderBodyDto>,
) -> ApiResponse<impl IntoResponse> {
    state.courses.find(id).await?.ok_or(ApiError::NotFound)?;
    state.videos.reorder(id, &body.video_ids).await?;
    Ok(Json("ok!"))
}

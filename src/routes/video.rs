use axum::Json;
use axum::extract::{Path, State};
use axum::response::IntoResponse;

use crate::errors::ApiResponse;
use crate::extractors::Identity;
use crate::models::dtos::{CourseRefDto, PlaylistVideoDto, StreamResponseDto, WatchResponseDto};
use crate::state::AppState;

pub async fn watch(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i64>,
) -> ApiResponse<impl IntoResponse> {
    let (video, course) = state.access.authorize_video(&identity, id).await?;
    let playlist = state.videos.playlist(course.id).await?;
    Ok(Json(WatchResponseDto {
        video: PlaylistVideoDto::from(video),
        course: CourseRefDto {
            id: course.id,
            title: course.title,
        },
        playlist: playlist.into_iter().map(PlaylistVideoDto::from).collect(),
    }))
}

/// Signed playback URL. The key never leaves the server; the URL does and
/// expires on its own.
pub async fn stream(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i64>,
) -> ApiResponse<impl IntoResponse> {
    let (video, _) = state.access.authorize_video(&identity, id).await?;
    let (url, expires_in_seconds) = state.videos.stream_url(&video)?;
    Ok(Json(StreamResponseDto {
        url,
        expires_in_seconds,
    }))
}

use axum::Json;
use axum::extract::{Path, State};
use axum::response::IntoResponse;

use crate::errors::ApiResponse;
use crate::extractors::Identity;
use crate::models::dtos::{CourseDetailResponseDto, CourseSummaryDto, PlaylistVideoDto};
use crate::state::AppState;

/// Every course the account was ever granted, lapsed grants included so
/// the page can say "expired" instead of quietly dropping the course.
pub async fn catalog(
    State(state): State<AppState>,
    identity: Identity,
) -> ApiResponse<impl IntoResponse> {
    let now = state.clock.now_utc();
    let entries = state.access.granted_catalog(identity.user.id).await?;
    let catalog = entries
        .into_iter()
        .map(|entry| {
            CourseSummaryDto::new(entry.course, entry.video_count, Some(&entry.grant), now)
        })
        .collect::<Vec<_>>();
    Ok(Json(catalog))
}

pub async fn detail(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i64>,
) -> ApiResponse<impl IntoResponse> {
    let course = state.access.authorize_course(&identity, id).await?;
    let grant = state.access.find(identity.user.id, course.id).await?;
    let videos = state.videos.playlist(course.id).await?;
    let now = state.clock.now_utc();
    Ok(Json(CourseDetailResponseDto {
        id: course.id,
        title: course.title,
        description: course.description,
        thumbnail: course.thumbnail,
        expires_at: grant.as_ref().and_then(|grant| grant.expires_at),
        days_remaining: grant.as_ref().and_then(|grant| grant.days_remaining(now)),
        videos: videos.into_iter().map(PlaylistVideoDto::from).collect(),
    }))
}

use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;

use crate::errors::ApiResponse;
use crate::models::dtos::{DashboardResponseDto, RecentUserDto};
use crate::state::AppState;

pub async fn show(State(state): State<AppState>) -> ApiResponse<impl IntoResponse> {
    let stats = state.stats.dashboard().await?;
    Ok(Json(DashboardResponseDto {
        users: stats.users,
        active_users: stats.active_users,
        courses: stats.courses,
        videos: stats.videos,
        devices: stats.devices,
        grants: stats.grants,
        active_grants: stats.active_grants,
        recent_users: stats
            .recent_users
            .into_iter()
            .map(RecentUserDto::from)
            .collect(),
    }))
}

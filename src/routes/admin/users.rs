use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use serde_json::json;

use crate::errors::{ApiError, ApiResponse};
use crate::models::dtos::pagination::{PageQueryDto, PaginationDto};
use crate::models::dtos::{
    CreateUserBodyDto, UpdateUserBodyDto, UserAccessRowDto, UserDetailResponseDto, UserListItemDto,
};
use crate::state::AppState;

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<PageQueryDto>,
) -> ApiResponse<impl IntoResponse> {
    let (users, total) = state.users.list(query.limit(), query.offset()).await?;
    Ok(Json(PaginationDto {
        total,
        data: users
            .into_iter()
            .map(|row| UserListItemDto {
                id: row.user.id,
                name: row.user.name,
                email: row.user.email,
                role: row.user.role,
                is_active: row.user.is_active,
                max_devices: row.user.max_devices,
                device_count: row.device_count,
                course_count: row.course_count,
                created_at: row.user.created_at,
            })
            .collect::<Vec<_>>(),
    }))
}

pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreateUserBodyDto>,
) -> ApiResponse<impl IntoResponse> {
    let user = state.users.create(body).await?;
    Ok(Json(user))
}

/// One account with its registered devices and course grants.
pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResponse<impl IntoResponse> {
    let user = state.users.find(id).await?.ok_or(ApiError::NotFound)?;
    let devices = state.devices.list(user.id).await?;
    let now = state.clock.now_utc();
    let access = state
        .access
        .grants_with_courses(user.id)
        .await?
        .into_iter()
        .map(|row| UserAccessRowDto::new(&row.grant, row.course_title, now))
        .collect();
    Ok(Json(UserDetailResponseDto {
        user,
        devices,
        access,
    }))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateUserBodyDto>,
) -> ApiResponse<impl IntoResponse> {
    let user = state.users.update(id, body).await?;
    Ok(Json(user))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResponse<impl IntoResponse> {
    if !state.users.delete(id).await? {
        return Err(ApiError::NotFound);
    }
    Ok(Json("ok!"))
}

/// Evicts a single device, freeing one slot for the next login.
pub async fn remove_device(
    State(state): State<AppState>,
    Path((id, device_id)): Path<(i64, i64)>,
) -> ApiResponse<impl IntoResponse> {
    if !state.devices.remove_one(id, device_id).await? {
        return Err(ApiError::NotFound);
    }
    Ok(Json("ok!"))
}

pub async fn remove_devices(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResponse<impl IntoResponse> {
    let user = state.users.find(id).await?.ok_or(ApiError::NotFound)?;
    let removed = state.devices.remove_all(user.id).await?;
    Ok(Json(json!({ "removed": removed })))
}

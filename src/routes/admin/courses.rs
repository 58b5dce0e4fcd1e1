use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;

use crate::errors::{ApiError, ApiResponse};
use crate::models::dtos::pagination::{PageQueryDto, PaginationDto};
use crate::models::dtos::{
    CourseAdminDetailResponseDto, CourseAdminListItemDto, CreateCourseBodyDto, UpdateCourseBodyDto,
};
use crate::state::AppState;

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<PageQueryDto>,
) -> ApiResponse<impl IntoResponse> {
    let (courses, total) = state.courses.list(query.limit(), query.offset()).await?;
    Ok(Json(PaginationDto {
        total,
        data: courses
            .into_iter()
            .map(|row| CourseAdminListItemDto {
                id: row.course.id,
                title: row.course.title,
                description: row.course.description,
                thumbnail: row.course.thumbnail,
                is_active: row.course.is_active,
                video_count: row.video_count,
                user_count: row.user_count,
                created_at: row.course.created_at,
            })
            .collect::<Vec<_>>(),
    }))
}

pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreateCourseBodyDto>,
) -> ApiResponse<impl IntoResponse> {
    let course = state.courses.create(body).await?;
    Ok(Json(course))
}

pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResponse<impl IntoResponse> {
    let course = state.courses.find(id).await?.ok_or(ApiError::NotFound)?;
    let videos = state.videos.all_for_course(course.id).await?;
    Ok(Json(CourseAdminDetailResponseDto { course, videos }))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateCourseBodyDto>,
) -> ApiResponse<impl IntoResponse> {
    let course = state.courses.update(id, body).await?;
    Ok(Json(course))
}

/// Removes the course, its videos, and their storage objects. Grants go
/// with it through the cascade.
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResponse<impl IntoResponse> {
    if !state.courses.delete(id).await? {
        return Err(ApiError::NotFound);
    }
    Ok(Json("ok!"))
}

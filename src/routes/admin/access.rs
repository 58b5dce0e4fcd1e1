use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;

use crate::errors::{ApiError, ApiResponse};
use crate::models::dtos::pagination::{PageQueryDto, PaginationDto};
use crate::models::dtos::{AccessUserRowDto, GrantBodyDto, UserAccessRowDto};
use crate::state::AppState;

/// Accounts holding at least one grant, with every grant annotated the
/// same way the member catalog is.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<PageQueryDto>,
) -> ApiResponse<impl IntoResponse> {
    let (pages, total) = state
        .access
        .users_with_grants(query.limit(), query.offset())
        .await?;
    let now = state.clock.now_utc();
    Ok(Json(PaginationDto {
        total,
        data: pages
            .into_iter()
            .map(|(user, grants)| AccessUserRowDto {
                user_id: user.id,
                name: user.name,
                email: user.email,
                grants: grants
                    .into_iter()
                    .map(|row| UserAccessRowDto::new(&row.grant, row.course_title, now))
                    .collect(),
            })
            .collect::<Vec<_>>(),
    }))
}

/// Grants or re-grants a course. Granting again only moves the expiry.
pub async fn grant(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<GrantBodyDto>,
) -> ApiResponse<impl IntoResponse> {
    let user = state.users.find(id).await?.ok_or(ApiError::NotFound)?;
    let course = state
        .courses
        .find(body.course_id)
        .await?
        .ok_or_else(|| ApiError::Validation("Course does not exist.".to_string()))?;
    let now = state.clock.now_utc();
    if body.expires_at.is_some_and(|expires_at| expires_at <= now) {
        return Err(ApiError::Validation(
            "Expiry must be in the future.".to_string(),
        ));
    }
    let grant = state.access.grant(user.id, course.id, body.expires_at).await?;
    Ok(Json(UserAccessRowDto::new(&grant, course.title, now)))
}

pub async fn revoke(
    State(state): State<AppState>,
    Path((id, course_id)): Path<(i64, i64)>,
) -> ApiResponse<impl IntoResponse> {
    if !state.access.revoke(id, course_id).await? {
        return Err(ApiError::NotFound);
    }
    Ok(Json("ok!"))
}

use crate::models::dtos::video::PlaylistVideoDto;
use crate::models::{AccessGrant, Course, Video};
use crate::utils::option_serialize_rfc3339;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct CourseSummaryDto {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    pub video_count: i64,
    #[serde(serialize_with = "option_serialize_rfc3339")]
    pub expires_at: Option<DateTime<Utc>>,
    pub is_expired: bool,
    pub days_remaining: Option<i64>,
}

impl CourseSummaryDto {
    pub fn new(
        course: Course,
        video_count: i64,
        grant: Option<&AccessGrant>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: course.id,
            title: course.title,
            description: course.description,
            thumbnail: course.thumbnail,
            video_count,
            expires_at: grant.and_then(|grant| grant.expires_at),
            is_expired: grant.is_some_and(|grant| grant.is_expired(now)),
            days_remaining: grant.and_then(|grant| grant.days_remaining(now)),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CourseDetailResponseDto {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    #[serde(serialize_with = "option_serialize_rfc3339")]
    pub expires_at: Option<DateTime<Utc>>,
    pub days_remaining: Option<i64>,
    pub videos: Vec<PlaylistVideoDto>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCourseBodyDto {
    pub title: String,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCourseBodyDto {
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    pub is_active: Option<bool>,
}

/// Admin view of one course, unreleased videos included. Object keys stay
/// out of the payload; previews come from the per-video endpoint.
#[derive(Debug, Serialize)]
pub struct CourseAdminDetailResponseDto {
    #[serde(flatten)]
    pub course: Course,
    pub videos: Vec<Video>,
}

#[derive(Debug, Serialize)]
pub struct CourseAdminListItemDto {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    pub is_active: bool,
    pub video_count: i64,
    pub user_count: i64,
    #[serde(serialize_with = "crate::utils::serialize_rfc3339")]
    pub created_at: DateTime<Utc>,
}

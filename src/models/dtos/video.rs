use crate::models::Video;
use crate::utils::serialize_rfc3339;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct PlaylistVideoDto {
    pub id: i64,
    pub title: String,
    pub duration: Option<String>,
    pub sort_order: i64,
}

impl From<Video> for PlaylistVideoDto {
    fn from(value: Video) -> Self {
        Self {
            id: value.id,
            title: value.title,
            duration: value.duration,
            sort_order: value.sort_order,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CourseRefDto {
    pub id: i64,
    pub title: String,
}

#[derive(Debug, Serialize)]
pub struct WatchResponseDto {
    pub video: PlaylistVideoDto,
    pub course: CourseRefDto,
    pub playlist: Vec<PlaylistVideoDto>,
}

#[derive(Debug, Serialize)]
pub struct StreamResponseDto {
    pub url: String,
    pub expires_in_seconds: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateVideoBodyDto {
    pub title: String,
    /// Object key returned by the upload-url endpoint.
    pub video_path: String,
    pub duration: Option<String>,
    pub sort_order: Option<i64>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateVideoBodyDto {
    pub title: Option<String>,
    pub video_path: Option<String>,
    pub duration: Option<String>,
    pub sort_order: Option<i64>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ReorderBodyDto {
    pub video_ids: Vec<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UploadUrlBodyDto {
    pub filename: String,
}

#[derive(Debug, Serialize)]
pub struct UploadUrlResponseDto {
    pub upload_url: String,
    /// The object key to pass back when registering the video.
    pub path: String,
}

#[derive(Debug, Serialize)]
pub struct VideoAdminResponseDto {
    pub id: i64,
    pub course_id: i64,
    pub title: String,
    pub path: String,
    pub duration: Option<String>,
    pub sort_order: i64,
    pub is_active: bool,
    /// Short-lived signed URL for in-admin playback, absent when signing
    /// is unavailable.
    pub preview_url: Option<String>,
    #[serde(serialize_with = "serialize_rfc3339")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "serialize_rfc3339")]
    pub updated_at: DateTime<Utc>,
}

impl VideoAdminResponseDto {
    pub fn new(video: Video, preview_url: Option<String>) -> Self {
        Self {
            id: video.id,
            course_id: video.course_id,
            title: video.title,
            path: video.video_path,
            duration: video.duration,
            sort_order: video.sort_order,
            is_active: video.is_active,
            preview_url,
            created_at: video.created_at,
            updated_at: video.updated_at,
        }
    }
}

use crate::utils::serialize_rfc3339;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Video {
    pub id: i64,
    pub course_id: i64,
    pub title: String,
    // Storage key stays server-side; playback goes through signed URLs.
    #[serde(skip_serializing)]
    pub video_path: String,
    pub duration: Option<String>,
    pub sort_order: i64,
    pub is_active: bool,
    #[serde(serialize_with = "serialize_rfc3339")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "serialize_rfc3339")]
    pub updated_at: DateTime<Utc>,
}

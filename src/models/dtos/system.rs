use crate::models::User;
use crate::utils::serialize_rfc3339;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct RecentUserDto {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub is_active: bool,
    #[serde(serialize_with = "serialize_rfc3339")]
    pub created_at: DateTime<Utc>,
}

impl From<User> for RecentUserDto {
    fn from(value: User) -> Self {
        Self {
            id: value.id,
            name: value.name,
            email: value.email,
            is_active: value.is_active,
            created_at: value.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DashboardResponseDto {
    pub users: i64,
    pub active_users: i64,
    pub courses: i64,
    pub videos: i64,
    pub devices: i64,
    pub grants: i64,
    pub active_grants: i64,
    pub recent_users: Vec<RecentUserDto>,
}

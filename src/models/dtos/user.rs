use crate::models::{AccessGrant, Device, User, UserRole};
use crate::utils::{option_serialize_rfc3339, serialize_rfc3339};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Accounts created here are always ordinary users; the only admin comes
/// from the bootstrap path.
#[derive(Debug, Deserialize)]
pub struct CreateUserBodyDto {
    pub name: String,
    pub email: String,
    pub password: String,
    pub max_devices: i64,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserBodyDto {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub is_active: Option<bool>,
    pub max_devices: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct UserListItemDto {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub is_active: bool,
    pub max_devices: i64,
    pub device_count: i64,
    pub course_count: i64,
    #[serde(serialize_with = "serialize_rfc3339")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct UserAccessRowDto {
    pub course_id: i64,
    pub course_title: String,
    #[serde(serialize_with = "option_serialize_rfc3339")]
    pub expires_at: Option<DateTime<Utc>>,
    pub is_expired: bool,
    pub days_remaining: Option<i64>,
}

impl UserAccessRowDto {
    pub fn new(grant: &AccessGrant, course_title: String, now: DateTime<Utc>) -> Self {
        Self {
            course_id: grant.course_id,
            course_title,
            expires_at: grant.expires_at,
            is_expired: grant.is_expired(now),
            days_remaining: grant.days_remaining(now),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserDetailResponseDto {
    #[serde(flatten)]
    pub user: User,
    pub devices: Vec<Device>,
    pub access: Vec<UserAccessRowDto>,
}

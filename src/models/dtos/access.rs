use crate::models::dtos::user::UserAccessRowDto;
use crate::utils::option_deserialize_rfc3339;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct GrantBodyDto {
    pub course_id: i64,
    /// Omitted or null grants perpetual access.
    #[serde(default, deserialize_with = "option_deserialize_rfc3339")]
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct AccessUserRowDto {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub grants: Vec<UserAccessRowDto>,
}

use crate::utils::serialize_rfc3339;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Device {
    pub id: i64,
    pub user_id: i64,
    pub device_name: String,
    #[serde(skip_serializing)]
    pub device_hash: String,
    pub ip_address: Option<String>,
    #[serde(serialize_with = "serialize_rfc3339")]
    pub last_active_at: DateTime<Utc>,
    #[serde(serialize_with = "serialize_rfc3339")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "serialize_rfc3339")]
    pub updated_at: DateTime<Utc>,
}

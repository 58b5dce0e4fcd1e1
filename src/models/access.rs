use crate::utils::option_serialize_rfc3339;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AccessGrant {
    pub id: i64,
    pub user_id: i64,
    pub course_id: i64,
    #[serde(serialize_with = "option_serialize_rfc3339")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(serialize_with = "crate::utils::serialize_rfc3339")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "crate::utils::serialize_rfc3339")]
    pub updated_at: DateTime<Utc>,
}

impl AccessGrant {
    /// A grant with no expiry never lapses; otherwise it must end strictly
    /// in the future.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            None => true,
            Some(expires_at) => expires_at > now,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        !self.is_active(now)
    }

    /// Signed whole days until expiry, truncated toward zero. `None` means
    /// perpetual access, negative means the grant already lapsed.
    pub fn days_remaining(&self, now: DateTime<Utc>) -> Option<i64> {
        self.expires_at.map(|expires_at| (expires_at - now).num_days())
    }
}

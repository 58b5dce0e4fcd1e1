use anyhow::Result;
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::clock::Clock;
use crate::models::{AccessGrant, User};

/// Read-only counters behind the admin dashboard.
pub struct StatsService {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

pub struct DashboardStats {
    pub users: i64,
    pub active_users: i64,
    pub courses: i64,
    pub videos: i64,
    pub devices: i64,
    pub grants: i64,
    pub active_grants: i64,
    pub recent_users: Vec<User>,
}

impl StatsService {
    pub fn new(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }

    pub async fn dashboard(&self) -> Result<DashboardStats> {
        let users = self
            .count("SELECT COUNT(*) FROM users WHERE role = 'user'")
            .await?;
        let active_users = self
            .count("SELECT COUNT(*) FROM users WHERE role = 'user' AND is_active = 1")
            .await?;
        let courses = self.count("SELECT COUNT(*) FROM courses").await?;
        let videos = self.count("SELECT COUNT(*) FROM videos").await?;
        let devices = self.count("SELECT COUNT(*) FROM user_devices").await?;
        // Expiry lives in Rust, so lapsed grants are told apart here rather
        // than in SQL.
        let grants = sqlx::query_as::<_, AccessGrant>("SELECT * FROM course_access")
            .fetch_all(&self.pool)
            .await?;
        let now = self.clock.now_utc();
        let active_grants = grants.iter().filter(|grant| grant.is_active(now)).count() as i64;
        let recent_users = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE role = 'user' ORDER BY id DESC LIMIT 5",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(DashboardStats {
            users,
            active_users,
            courses,
            videos,
            devices,
            grants: grants.len() as i64,
            active_grants,
            recent_users,
        })
    }

    async fn count(&self, sql: &str) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(sql)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

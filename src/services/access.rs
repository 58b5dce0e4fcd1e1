use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::Arc;

use crate::clock::Clock;
use crate::errors::{ApiError, ApiResponse};
use crate::extractors::Identity;
use crate::models::{AccessGrant, Course, User, Video};

/// Time-bounded course entitlements. Expiry is always evaluated in Rust
/// against the injected clock, never in SQL, so a grant row is written
/// once and read many times.
pub struct AccessGrantStore {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

/// One granted course in the end-user catalog.
pub struct CatalogEntry {
    pub course: Course,
    pub video_count: i64,
    pub grant: AccessGrant,
}

#[derive(Debug, sqlx::FromRow)]
pub struct GrantRow {
    #[sqlx(flatten)]
    pub grant: AccessGrant,
    pub course_title: String,
}

impl AccessGrantStore {
    pub fn new(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }

    /// Grant or re-grant a course. The (user, course) pair is unique, so a
    /// second grant only moves the expiry.
    pub async fn grant(
        &self,
        user_id: i64,
        course_id: i64,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<AccessGrant> {
        let now = self.clock.now_utc();
        let grant = sqlx::query_as::<_, AccessGrant>(
            "INSERT INTO course_access (user_id, course_id, expires_at, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?4) \
             ON CONFLICT(user_id, course_id) \
             DO UPDATE SET expires_at = excluded.expires_at, updated_at = excluded.updated_at \
             RETURNING *",
        )
        .bind(user_id)
        .bind(course_id)
        .bind(expires_at)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        tracing::info!(user_id, course_id, "course access granted");
        Ok(grant)
    }

    pub async fn revoke(&self, user_id: i64, course_id: i64) -> Result<bool> {
        let done = sqlx::query("DELETE FROM course_access WHERE user_id = ? AND course_id = ?")
            .bind(user_id)
            .bind(course_id)
            .execute(&self.pool)
            .await?;
        if done.rows_affected() > 0 {
            tracing::info!(user_id, course_id, "course access revoked");
        }
        Ok(done.rows_affected() > 0)
    }

    pub async fn find(&self, user_id: i64, course_id: i64) -> Result<Option<AccessGrant>> {
        let grant = sqlx::query_as::<_, AccessGrant>(
            "SELECT * FROM course_access WHERE user_id = ? AND course_id = ?",
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(grant)
    }

    /// A grant exists and has not lapsed yet.
    pub async fn has_access(&self, user_id: i64, course_id: i64) -> Result<bool> {
        let now = self.clock.now_utc();
        let grant = self.find(user_id, course_id).await?;
        Ok(grant.is_some_and(|grant| grant.is_active(now)))
    }

    pub async fn grants_for_user(&self, user_id: i64) -> Result<Vec<AccessGrant>> {
        let grants = sqlx::query_as::<_, AccessGrant>(
            "SELECT * FROM course_access WHERE user_id = ? ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(grants)
    }

    /// Everything the user was ever granted that is still an active course.
    /// Lapsed grants stay in the listing; the caller annotates them so the
    /// catalog can show "expired" instead of silently dropping the course.
    pub async fn granted_catalog(&self, user_id: i64) -> Result<Vec<CatalogEntry>> {
        let courses = sqlx::query_as::<_, Course>(
            "SELECT c.* FROM courses c \
             JOIN course_access ca ON ca.course_id = c.id \
             WHERE ca.user_id = ? AND c.is_active = 1 \
             ORDER BY c.title",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        let counts: HashMap<i64, i64> =
            sqlx::query_as::<_, (i64, i64)>("SELECT course_id, COUNT(*) FROM videos GROUP BY course_id")
                .fetch_all(&self.pool)
                .await?
                .into_iter()
                .collect();
        let mut grants: HashMap<i64, AccessGrant> = self
            .grants_for_user(user_id)
            .await?
            .into_iter()
            .map(|grant| (grant.course_id, grant))
            .collect();
        let entries = courses
            .into_iter()
            .filter_map(|course| {
                let grant = grants.remove(&course.id)?;
                let video_count = counts.get(&course.id).copied().unwrap_or(0);
                Some(CatalogEntry { course, video_count, grant })
            })
            .collect();
        Ok(entries)
    }

    pub async fn grants_with_courses(&self, user_id: i64) -> Result<Vec<GrantRow>> {
        let rows = sqlx::query_as::<_, GrantRow>(
            "SELECT ca.*, c.title AS course_title FROM course_access ca \
             JOIN courses c ON c.id = ca.course_id \
             WHERE ca.user_id = ? ORDER BY ca.id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Admin overview: accounts that hold at least one grant, page by page.
    pub async fn users_with_grants(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<(User, Vec<GrantRow>)>, u32)> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users u WHERE u.role = 'user' \
             AND EXISTS (SELECT 1 FROM course_access ca WHERE ca.user_id = u.id)",
        )
        .fetch_one(&self.pool)
        .await?;
        let users = sqlx::query_as::<_, User>(
            "SELECT u.* FROM users u WHERE u.role = 'user' \
             AND EXISTS (SELECT 1 FROM course_access ca WHERE ca.user_id = u.id) \
             ORDER BY u.id LIMIT ? OFFSET ?",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        let mut pages = Vec::with_capacity(users.len());
        for user in users {
            let grants = self.grants_with_courses(user.id).await?;
            pages.push((user, grants));
        }
        Ok((pages, total as u32))
    }

    /// Course gate for the end-user surface. Inactive courses are invisible
    /// to non-exempt identities rather than forbidden.
    pub async fn authorize_course(&self, identity: &Identity, course_id: i64) -> ApiResponse<Course> {
        let course = sqlx::query_as::<_, Course>("SELECT * FROM courses WHERE id = ?")
            .bind(course_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ApiError::NotFound)?;
        if identity.is_exempt_from_gating() {
            return Ok(course);
        }
        if !course.is_active {
            return Err(ApiError::NotFound);
        }
        if self.has_access(identity.user.id, course.id).await? {
            Ok(course)
        } else {
            Err(ApiError::AccessDenied)
        }
    }

    /// Video gate. Resolves the parent course first; the entitlement always
    /// lives on the course, never on the video.
    pub async fn authorize_video(
        &self,
        identity: &Identity,
        video_id: i64,
    ) -> ApiResponse<(Video, Course)> {
        let video = sqlx::query_as::<_, Video>("SELECT * FROM videos WHERE id = ?")
            .bind(video_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ApiError::NotFound)?;
        if !identity.is_exempt_from_gating() && !video.is_active {
            return Err(ApiError::NotFound);
        }
        let course = self.authorize_course(identity, video.course_id).await?;
        Ok((video, course))
    }
}

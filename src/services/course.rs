use anyhow::Result;
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::clock::Clock;
use crate::errors::{ApiError, ApiResponse};
use crate::models::Course;
use crate::models::dtos::{CreateCourseBodyDto, UpdateCourseBodyDto};
use crate::services::storage::ObjectStorage;

pub struct CourseStore {
    pool: SqlitePool,
    storage: Arc<ObjectStorage>,
    clock: Arc<dyn Clock>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct CourseWithCounts {
    #[sqlx(flatten)]
    pub course: Course,
    pub video_count: i64,
    pub user_count: i64,
}

impl CourseStore {
    pub fn new(pool: SqlitePool, storage: Arc<ObjectStorage>, clock: Arc<dyn Clock>) -> Self {
        Self { pool, storage, clock }
    }

    pub async fn find(&self, id: i64) -> Result<Option<Course>> {
        let course = sqlx::query_as::<_, Course>("SELECT * FROM courses WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(course)
    }

    pub async fn list(&self, limit: i64, offset: i64) -> Result<(Vec<CourseWithCounts>, u32)> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM courses")
            .fetch_one(&self.pool)
            .await?;
        let courses = sqlx::query_as::<_, CourseWithCounts>(
            "SELECT c.*, \
             (SELECT COUNT(*) FROM videos v WHERE v.course_id = c.id) AS video_count, \
             (SELECT COUNT(*) FROM course_access ca WHERE ca.course_id = c.id) AS user_count \
             FROM courses c ORDER BY c.id DESC LIMIT ? OFFSET ?",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok((courses, total as u32))
    }

    pub async fn create(&self, body: CreateCourseBodyDto) -> ApiResponse<Course> {
        validate_title(&body.title)?;
        let now = self.clock.now_utc();
        let course = sqlx::query_as::<_, Course>(
            "INSERT INTO courses (title, description, thumbnail, is_active, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?5) RETURNING *",
        )
        .bind(body.title.trim())
        .bind(normalize_optional(body.description))
        .bind(normalize_optional(body.thumbnail))
        .bind(body.is_active.unwrap_or(true))
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        tracing::info!(course_id = course.id, title = %course.title, "course created");
        Ok(course)
    }

    /// Partial update. An empty string clears description or thumbnail.
    pub async fn update(&self, id: i64, body: UpdateCourseBodyDto) -> ApiResponse<Course> {
        let mut course = self.find(id).await?.ok_or(ApiError::NotFound)?;
        if let Some(title) = body.title {
            validate_title(&title)?;
            course.title = title.trim().to_string();
        }
        if let Some(description) = body.description {
            course.description = normalize_optional(Some(description));
        }
        if let Some(thumbnail) = body.thumbnail {
            course.thumbnail = normalize_optional(Some(thumbnail));
        }
        if let Some(is_active) = body.is_active {
            course.is_active = is_active;
        }
        let course = sqlx::query_as::<_, Course>(
            "UPDATE courses SET title = ?1, description = ?2, thumbnail = ?3, is_active = ?4, \
             updated_at = ?5 WHERE id = ?6 RETURNING *",
        )
        .bind(&course.title)
        .bind(&course.description)
        .bind(&course.thumbnail)
        .bind(course.is_active)
        .bind(self.clock.now_utc())
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(course)
    }

    /// Deletes the course and everything hanging off it. Stored objects go
    /// first, best-effort; the database rows win over a flaky storage
    /// backend.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let paths: Vec<String> =
            sqlx::query_scalar("SELECT video_path FROM videos WHERE course_id = ?")
                .bind(id)
                .fetch_all(&self.pool)
                .await?;
        for path in &paths {
            if let Err(err) = self.storage.delete(path).await {
                tracing::warn!(course_id = id, path = %path, "storage cleanup failed: {err:#}");
            }
        }
        let done = sqlx::query("DELETE FROM courses WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if done.rows_affected() > 0 {
            tracing::info!(course_id = id, videos = paths.len(), "course deleted");
        }
        Ok(done.rows_affected() > 0)
    }
}

fn validate_title(title: &str) -> ApiResponse<()> {
    let title = title.trim();
    if title.is_empty() || title.len() > 255 {
        return Err(ApiError::Validation(
            "Title must be between 1 and 255 characters.".to_string(),
        ));
    }
    Ok(())
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

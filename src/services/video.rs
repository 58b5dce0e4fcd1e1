use anyhow::Result;
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::clock::Clock;
use crate::config::MediaConfig;
use crate::errors::{ApiError, ApiResponse};
use crate::models::Video;
use crate::models::dtos::{CreateVideoBodyDto, UpdateVideoBodyDto};
use crate::services::storage::ObjectStorage;
use crate::utils::{extension_of, guess_video_mimetype, is_allowed_video_extension};

/// Browsers upload straight to storage with a presigned PUT; the URL only
/// needs to outlive the moment the transfer starts.
const UPLOAD_URL_TTL_SECS: i64 = 3600;

pub struct VideoService {
    pool: SqlitePool,
    storage: Arc<ObjectStorage>,
    media: MediaConfig,
    clock: Arc<dyn Clock>,
}

impl VideoService {
    pub fn new(
        pool: SqlitePool,
        storage: Arc<ObjectStorage>,
        media: MediaConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { pool, storage, media, clock }
    }

    pub async fn find(&self, id: i64) -> Result<Option<Video>> {
        let video = sqlx::query_as::<_, Video>("SELECT * FROM videos WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(video)
    }

    /// What an entitled viewer sees: released videos in playback order.
    pub async fn playlist(&self, course_id: i64) -> Result<Vec<Video>> {
        let videos = sqlx::query_as::<_, Video>(
            "SELECT * FROM videos WHERE course_id = ? AND is_active = 1 ORDER BY sort_order, id",
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(videos)
    }

    pub async fn all_for_course(&self, course_id: i64) -> Result<Vec<Video>> {
        let videos = sqlx::query_as::<_, Video>(
            "SELECT * FROM videos WHERE course_id = ? ORDER BY sort_order, id",
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(videos)
    }

    /// Registers a video after its direct upload. The object key must look
    /// like a video and, when storage answers, must actually be there.
    pub async fn create(&self, course_id: i64, body: CreateVideoBodyDto) -> ApiResponse<Video> {
        validate_title(&body.title)?;
        validate_video_path(&body.video_path)?;
        self.verify_uploaded(&body.video_path).await?;
        let sort_order = match body.sort_order {
            Some(order) => validate_sort_order(order)?,
            None => self.next_sort_order(course_id).await?,
        };
        let now = self.clock.now_utc();
        let video = sqlx::query_as::<_, Video>(
            "INSERT INTO videos (course_id, title, video_path, duration, sort_order, is_active, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7) RETURNING *",
        )
        .bind(course_id)
        .bind(body.title.trim())
        .bind(body.video_path.trim())
        .bind(normalize_optional(body.duration))
        .bind(sort_order)
        .bind(body.is_active.unwrap_or(true))
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        tracing::info!(video_id = video.id, course_id, title = %video.title, "video registered");
        Ok(video)
    }

    /// Partial update. A new object key retires the old object best-effort
    /// before the row starts pointing at the new one.
    pub async fn update(&self, id: i64, body: UpdateVideoBodyDto) -> ApiResponse<Video> {
        let mut video = self.find(id).await?.ok_or(ApiError::NotFound)?;
        if let Some(title) = body.title {
            validate_title(&title)?;
            video.title = title.trim().to_string();
        }
        if let Some(path) = body.video_path.as_deref().filter(|p| !p.trim().is_empty()) {
            if path.trim() != video.video_path {
                validate_video_path(path)?;
                self.verify_uploaded(path).await?;
                self.delete_object(video.id, &video.video_path).await;
                video.video_path = path.trim().to_string();
            }
        }
        if let Some(duration) = body.duration {
            video.duration = normalize_optional(Some(duration));
        }
        if let Some(order) = body.sort_order {
            video.sort_order = validate_sort_order(order)?;
        }
        if let Some(is_active) = body.is_active {
            video.is_active = is_active;
        }
        let video = sqlx::query_as::<_, Video>(
            "UPDATE videos SET title = ?1, video_path = ?2, duration = ?3, sort_order = ?4, \
             is_active = ?5, updated_at = ?6 WHERE id = ?7 RETURNING *",
        )
        .bind(&video.title)
        .bind(&video.video_path)
        .bind(&video.duration)
        .bind(video.sort_order)
        .bind(video.is_active)
        .bind(self.clock.now_utc())
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(video)
    }

    pub async fn delete(&self, id: i64) -> Result<bool> {
        let Some(video) = self.find(id).await? else {
            return Ok(false);
        };
        self.delete_object(video.id, &video.video_path).await;
        let done = sqlx::query("DELETE FROM videos WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if done.rows_affected() > 0 {
            tracing::info!(video_id = id, "video deleted");
        }
        Ok(done.rows_affected() > 0)
    }

    /// Reassigns playback positions from the submitted order. The list must
    /// name every video of the course exactly once.
    pub async fn reorder(&self, course_id: i64, video_ids: &[i64]) -> ApiResponse<()> {
        let existing: Vec<i64> =
            sqlx::query_scalar("SELECT id FROM videos WHERE course_id = ? ORDER BY id")
                .bind(course_id)
                .fetch_all(&self.pool)
                .await?;
        let mut submitted = video_ids.to_vec();
        submitted.sort_unstable();
        submitted.dedup();
        if submitted.len() != video_ids.len() || submitted != existing {
            return Err(ApiError::Validation(
                "Reorder must list every video of the course exactly once.".to_string(),
            ));
        }
        let now = self.clock.now_utc();
        for (position, video_id) in video_ids.iter().enumerate() {
            sqlx::query("UPDATE videos SET sort_order = ?1, updated_at = ?2 WHERE id = ?3")
                .bind(position as i64 + 1)
                .bind(now)
                .bind(video_id)
                .execute(&self.pool)
                .await?;
        }
        Ok(())
    }

    /// Presigned PUT plus the namespaced object key the client must echo
    /// back when registering the upload.
    pub fn upload_url(&self, course_id: i64, filename: &str) -> ApiResponse<(String, String)> {
        let extension = extension_of(filename)
            .filter(|ext| is_allowed_video_extension(ext))
            .ok_or_else(|| ApiError::Validation("Unsupported video format.".to_string()))?;
        let path = format!(
            "videos/course_{course_id}/{}.{}",
            uuid::Uuid::new_v4(),
            extension.to_ascii_lowercase()
        );
        let url = self.storage.presign_put(&path, UPLOAD_URL_TTL_SECS)?;
        Ok((url, path))
    }

    /// Playback URL for an entitled viewer. Signing trouble is this
    /// request's problem, not a reason to drop the whole player.
    pub fn stream_url(&self, video: &Video) -> ApiResponse<(String, i64)> {
        let ttl = self.media.stream_ttl_secs();
        let mimetype = guess_video_mimetype(&video.video_path);
        match self
            .storage
            .presign_get(&video.video_path, ttl, Some(mimetype), Some("inline"))
        {
            Ok(url) => Ok((url, ttl)),
            Err(err) => {
                tracing::warn!(video_id = video.id, "stream signing failed: {err:#}");
                Err(ApiError::PlaybackUnavailable)
            }
        }
    }

    /// Short-lived URL for the admin edit screen; absent beats broken.
    pub fn preview_url(&self, video: &Video) -> Option<String> {
        let mimetype = guess_video_mimetype(&video.video_path);
        match self.storage.presign_get(
            &video.video_path,
            self.media.preview_ttl_secs(),
            Some(mimetype),
            Some("inline"),
        ) {
            Ok(url) => Some(url),
            Err(err) => {
                tracing::warn!(video_id = video.id, "preview signing failed: {err:#}");
                None
            }
        }
    }

    async fn next_sort_order(&self, course_id: i64) -> Result<i64> {
        let max: i64 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(sort_order), 0) FROM videos WHERE course_id = ?",
        )
        .bind(course_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(max + 1)
    }

    /// Storage unreachable is a warning; storage definitively answering
    /// "no such object" rejects the registration.
    async fn verify_uploaded(&self, path: &str) -> ApiResponse<()> {
        match self.storage.exists(path.trim()).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(ApiError::Validation(
                "Uploaded video was not found in storage.".to_string(),
            )),
            Err(err) => {
                tracing::warn!(path, "could not verify upload: {err:#}");
                Ok(())
            }
        }
    }

    async fn delete_object(&self, video_id: i64, path: &str) {
        if let Err(err) = self.storage.delete(path).await {
            tracing::warn!(video_id, path, "storage cleanup failed: {err:#}");
        }
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

fn validate_video_path(path: &str) -> ApiResponse<()> {
    let path = path.trim();
    if path.is_empty() {
        return Err(ApiError::Validation("Video path is required.".to_string()));
    }
    if !extension_of(path).is_some_and(is_allowed_video_extension) {
        return Err(ApiError::Validation("Unsupported video format.".to_string()));
    }
    Ok(())
}

fn validate_sort_order(order: i64) -> ApiResponse<i64> {
    if order < 0 {
        return Err(ApiError::Validation(
            "Playback order cannot be negative.".to_string(),
        ));
    }
    Ok(order)
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::config::StorageConfig;
    use crate::testing;

    fn service(pool: &SqlitePool, endpoint: &str) -> VideoService {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let config = StorageConfig {
            endpoint: endpoint.to_string(),
            region: "auto".to_string(),
            bucket: "media".to_string(),
            access_key: "key".to_string(),
            secret_key: "secret".to_string(),
        };
        VideoService::new(
            pool.clone(),
            Arc::new(ObjectStorage::new(&config, clock.clone())),
            MediaConfig::default(),
            clock,
        )
    }

    fn body(title: &str, path: &str) -> CreateVideoBodyDto {
        CreateVideoBodyDto {
            title: title.to_string(),
            video_path: path.to_string(),
            duration: None,
            sort_order: None,
            is_active: None,
        }
    }

    #[tokio::test]
    async fn registration_requires_the_object_when_storage_answers() {
        let pool = testing::memory_pool().await;
        let stub = testing::storage_stub().await;
        let course = testing::seed_course(&pool, "Rust from scratch").await;
        let service = service(&pool, &stub.endpoint);
        let path = format!("videos/course_{}/intro.mp4", course.id);

        let missing = service.create(course.id, body("Intro", &path)).await;
        assert!(matches!(missing, Err(ApiError::Validation(_))));

        stub.put(&format!("/media/{path}"));
        let video = service.create(course.id, body("Intro", &path)).await.unwrap();
        assert_eq!(video.sort_order, 1);
        assert!(video.is_active);

        let next = format!("videos/course_{}/two.mp4", course.id);
        stub.put(&format!("/media/{next}"));
        let second = service.create(course.id, body("Two", &next)).await.unwrap();
        assert_eq!(second.sort_order, 2);
    }

    #[tokio::test]
    async fn registration_proceeds_when_storage_is_unreachable() {
        let pool = testing::memory_pool().await;
        let course = testing::seed_course(&pool, "Rust from scratch").await;
        let service = service(&pool, "https://media.invalid");

        let path = format!("videos/course_{}/intro.mp4", course.id);
        let video = service.create(course.id, body("Intro", &path)).await.unwrap();
        assert_eq!(video.video_path, path);
    }

    #[tokio::test]
    async fn rejects_paths_that_are_not_videos() {
        let pool = testing::memory_pool().await;
        let stub = testing::storage_stub().await;
        let course = testing::seed_course(&pool, "Rust from scratch").await;
        let service = service(&pool, &stub.endpoint);

        let pdf = service.create(course.id, body("Notes", "videos/course_1/notes.pdf")).await;
        assert!(matches!(pdf, Err(ApiError::Validation(_))));
        let empty = service.create(course.id, body("Empty", "  ")).await;
        assert!(matches!(empty, Err(ApiError::Validation(_))));
    }

    #[tokio::test]
    async fn upload_urls_are_namespaced_per_course() {
        let pool = testing::memory_pool().await;
        let stub = testing::storage_stub().await;
        let course = testing::seed_course(&pool, "Rust from scratch").await;
        let service = service(&pool, &stub.endpoint);

        let (url, path) = service.upload_url(course.id, "Lesson One.MP4").unwrap();
        let prefix = format!("videos/course_{}/", course.id);
        assert!(path.starts_with(&prefix));
        assert!(path.ends_with(".mp4"));
        let stem = path
            .strip_prefix(&prefix)
            .and_then(|rest| rest.strip_suffix(".mp4"))
            .unwrap();
        assert!(uuid::Uuid::parse_str(stem).is_ok());
        assert!(url.contains("X-Amz-Signature="));

        let refused = service.upload_url(course.id, "slides.pdf");
        assert!(matches!(refused, Err(ApiError::Validation(_))));
    }

    #[tokio::test]
    async fn replacing_the_object_retires_the_old_one() {
        let pool = testing::memory_pool().await;
        let stub = testing::storage_stub().await;
        let course = testing::seed_course(&pool, "Rust from scratch").await;
        let service = service(&pool, &stub.endpoint);

        let old_path = format!("videos/course_{}/old.mp4", course.id);
        let new_path = format!("videos/course_{}/new.mp4", course.id);
        stub.put(&format!("/media/{old_path}"));
        stub.put(&format!("/media/{new_path}"));
        let video = service.create(course.id, body("Intro", &old_path)).await.unwrap();

        let updated = service
            .update(
                video.id,
                UpdateVideoBodyDto {
                    title: None,
                    video_path: Some(new_path.clone()),
                    duration: Some("12:34".to_string()),
                    sort_order: None,
                    is_active: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.video_path, new_path);
        assert_eq!(updated.duration.as_deref(), Some("12:34"));
        assert!(stub.deleted.lock().unwrap().contains(&format!("/media/{old_path}")));
    }

    #[tokio::test]
    async fn deletion_scrubs_storage_before_the_row() {
        let pool = testing::memory_pool().await;
        let stub = testing::storage_stub().await;
        let course = testing::seed_course(&pool, "Rust from scratch").await;
        let service = service(&pool, &stub.endpoint);
        let path = format!("videos/course_{}/intro.mp4", course.id);
        stub.put(&format!("/media/{path}"));
        let video = service.create(course.id, body("Intro", &path)).await.unwrap();

        assert!(service.delete(video.id).await.unwrap());
        assert!(!service.delete(video.id).await.unwrap());
        assert!(stub.deleted.lock().unwrap().contains(&format!("/media/{path}")));
        assert!(service.find(video.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn reorder_is_a_strict_permutation_of_the_course() {
        let pool = testing::memory_pool().await;
        let course = testing::seed_course(&pool, "Rust from scratch").await;
        let other = testing::seed_course(&pool, "SQL deep dive").await;
        let a = testing::seed_video(&pool, course.id, "A", 1).await;
        let b = testing::seed_video(&pool, course.id, "B", 2).await;
        let c = testing::seed_video(&pool, course.id, "C", 3).await;
        let foreign = testing::seed_video(&pool, other.id, "X", 1).await;
        let service = service(&pool, "https://media.invalid");

        service.reorder(course.id, &[c.id, a.id, b.id]).await.unwrap();
        let playlist = service.playlist(course.id).await.unwrap();
        let titles: Vec<&str> = playlist.iter().map(|v| v.title.as_str()).collect();
        assert_eq!(titles, ["C", "A", "B"]);

        assert!(matches!(
            service.reorder(course.id, &[c.id, a.id, foreign.id]).await,
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(
            service.reorder(course.id, &[a.id, b.id]).await,
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(
            service.reorder(course.id, &[a.id, a.id, b.id]).await,
            Err(ApiError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn signed_urls_carry_playback_ttls_and_overrides() {
        let pool = testing::memory_pool().await;
        let course = testing::seed_course(&pool, "Rust from scratch").await;
        let video = testing::seed_video(&pool, course.id, "Intro", 1).await;
        let service = service(&pool, "https://media.example.com");

        let (url, ttl) = service.stream_url(&video).unwrap();
        assert_eq!(ttl, 7200);
        assert!(url.contains("X-Amz-Expires=7200"));
        assert!(url.contains("response-content-type=video%2Fmp4"));
        assert!(url.contains("response-content-disposition=inline"));

        let preview = service.preview_url(&video).unwrap();
        assert!(preview.contains("X-Amz-Expires=1800"));
    }

    #[tokio::test]
    async fn a_video_without_an_object_key_cannot_stream() {
        let pool = testing::memory_pool().await;
        let course = testing::seed_course(&pool, "Rust from scratch").await;
        let mut video = testing::seed_video(&pool, course.id, "Intro", 1).await;
        video.video_path = String::new();
        let service = service(&pool, "https://media.example.com");

        assert!(matches!(service.stream_url(&video), Err(ApiError::PlaybackUnavailable)));
        assert!(service.preview_url(&video).is_none());
    }
}

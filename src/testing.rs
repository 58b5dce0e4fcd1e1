//! Shared helpers for the in-crate test modules.
//!
//! Every service test runs against a private in-memory database with the
//! real migrations applied, so the SQL under test is the SQL that ships.

use crate::config::{
    AuthConfig, Config, DatabaseConfig, LogsConfig, MediaConfig, ServerConfig, StorageConfig,
};
use crate::models::{AccessGrant, Course, User, UserRole, Video};
use axum::http::{Method, StatusCode, Uri};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

/// Password behind every [`seed_user`] row.
pub const TEST_PASSWORD: &str = "correct horse battery staple";

/// Open a fresh in-memory database and bring it to the current schema.
///
/// A single connection keeps the `:memory:` database alive for the whole
/// pool and serializes test queries, which is plenty here.
pub async fn memory_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();
    crate::server::MIGRATOR.run(&pool).await.unwrap();
    pool
}

/// Full configuration for router-level tests. Nothing dials the storage
/// endpoint unless a test routes an upload through it, so an unreachable
/// one is fine for most callers.
pub fn test_config(storage_endpoint: &str) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        database: DatabaseConfig {
            storage_path: ".".to_string(),
        },
        storage: StorageConfig {
            endpoint: storage_endpoint.to_string(),
            region: "us-east-1".to_string(),
            bucket: "media".to_string(),
            access_key: "test-access-key".to_string(),
            secret_key: "test-secret-key".to_string(),
        },
        auth: AuthConfig {
            secret: "router-test-signing-secret".to_string(),
            session_ttl_hours: 12,
            bootstrap_admin_email: None,
            bootstrap_admin_password: None,
            bootstrap_admin_name: None,
        },
        media: MediaConfig::default(),
        logs: LogsConfig {
            level: tracing::Level::WARN,
            enable_file_logging: false,
            storage_path: None,
        },
    }
}

pub async fn seed_user(pool: &SqlitePool, email: &str, role: UserRole, max_devices: i64) -> User {
    let name = email.split('@').next().unwrap_or(email);
    let password_hash = crate::services::password::hash_password(TEST_PASSWORD).unwrap();
    let now = Utc::now();
    sqlx::query_as::<_, User>(
        "INSERT INTO users (name, email, password_hash, role, is_active, max_devices, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, 1, ?5, ?6, ?6) RETURNING *",
    )
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .bind(max_devices)
    .bind(now)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn seed_course(pool: &SqlitePool, title: &str) -> Course {
    let now = Utc::now();
    sqlx::query_as::<_, Course>(
        "INSERT INTO courses (title, description, thumbnail, is_active, created_at, updated_at) \
         VALUES (?1, NULL, NULL, 1, ?2, ?2) RETURNING *",
    )
    .bind(title)
    .bind(now)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn seed_video(pool: &SqlitePool, course_id: i64, title: &str, sort_order: i64) -> Video {
    let now = Utc::now();
    let path = format!(
        "videos/course_{}/{}.mp4",
        course_id,
        title.to_lowercase().replace(' ', "-")
    );
    sqlx::query_as::<_, Video>(
        "INSERT INTO videos (course_id, title, video_path, duration, sort_order, is_active, created_at, updated_at) \
         VALUES (?1, ?2, ?3, NULL, ?4, 1, ?5, ?5) RETURNING *",
    )
    .bind(course_id)
    .bind(title)
    .bind(path)
    .bind(sort_order)
    .bind(now)
    .fetch_one(pool)
    .await
    .unwrap()
}

/// Minimal stand-in for the object storage backend: HEAD answers from the
/// `objects` set, DELETE records the path and always succeeds.
pub struct StorageStub {
    pub endpoint: String,
    pub objects: Arc<Mutex<HashSet<String>>>,
    pub deleted: Arc<Mutex<Vec<String>>>,
}

impl StorageStub {
    pub fn put(&self, path: &str) {
        self.objects.lock().unwrap().insert(path.to_string());
    }
}

pub async fn storage_stub() -> StorageStub {
    let objects: Arc<Mutex<HashSet<String>>> = Arc::default();
    let deleted: Arc<Mutex<Vec<String>>> = Arc::default();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let endpoint = format!("http://{}", listener.local_addr().unwrap());
    let handler_objects = objects.clone();
    let handler_deleted = deleted.clone();
    let app = axum::Router::new().fallback(move |method: Method, uri: Uri| {
        let objects = handler_objects.clone();
        let deleted = handler_deleted.clone();
        async move {
            let path = uri.path().to_string();
            match method {
                Method::HEAD => {
                    if objects.lock().unwrap().contains(&path) {
                        StatusCode::OK
                    } else {
                        StatusCode::NOT_FOUND
                    }
                }
                Method::DELETE => {
                    objects.lock().unwrap().remove(&path);
                    deleted.lock().unwrap().push(path);
                    StatusCode::NO_CONTENT
                }
                _ => StatusCode::METHOD_NOT_ALLOWED,
            }
        }
    });
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    StorageStub {
        endpoint,
        objects,
        deleted,
    }
}

pub async fn seed_grant(
    pool: &SqlitePool,
    user_id: i64,
    course_id: i64,
    expires_at: Option<DateTime<Utc>>,
) -> AccessGrant {
    let now = Utc::now();
    sqlx::query_as::<_, AccessGrant>(
        "INSERT INTO course_access (user_id, course_id, expires_at, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?4) RETURNING *",
    )
    .bind(user_id)
    .bind(course_id)
    .bind(expires_at)
    .bind(now)
    .fetch_one(pool)
    .await
    .unwrap()
}

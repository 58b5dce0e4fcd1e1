use anyhow::{Result, anyhow};
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::clock::Clock;
use crate::config::AuthConfig;
use crate::errors::{ApiError, ApiResponse};
use crate::models::dtos::{CreateUserBodyDto, UpdateUserBodyDto};
use crate::models::{User, UserRole};
use crate::services::password;

pub struct UserStore {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct UserWithCounts {
    #[sqlx(flatten)]
    pub user: User,
    pub device_count: i64,
    pub course_count: i64,
}

impl UserStore {
    pub fn new(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }

    pub async fn find(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Ordinary accounts only, newest first, with how many device slots
    /// and course grants each one holds.
    pub async fn list(&self, limit: i64, offset: i64) -> Result<(Vec<UserWithCounts>, u32)> {
        let total =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE role = 'user'")
                .fetch_one(&self.pool)
                .await?;
        let users = sqlx::query_as::<_, UserWithCounts>(
            "SELECT u.*, \
             (SELECT COUNT(*) FROM user_devices d WHERE d.user_id = u.id) AS device_count, \
             (SELECT COUNT(*) FROM course_access ca WHERE ca.user_id = u.id) AS course_count \
             FROM users u WHERE u.role = 'user' \
             ORDER BY u.id DESC LIMIT ? OFFSET ?",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok((users, total as u32))
    }

    pub async fn create(&self, body: CreateUserBodyDto) -> ApiResponse<User> {
        validate_name(&body.name)?;
        validate_email(&body.email)?;
        validate_password(&body.password)?;
        validate_max_devices(body.max_devices)?;
        let password_hash = password::hash_password(&body.password)
            .map_err(|err| anyhow!("password hashing failed: {err}"))?;
        let now = self.clock.now_utc();
        let result = sqlx::query_as::<_, User>(
            "INSERT INTO users (name, email, password_hash, role, is_active, max_devices, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7) RETURNING *",
        )
        .bind(body.name.trim())
        .bind(body.email.trim())
        .bind(password_hash)
        .bind(UserRole::User)
        .bind(body.is_active.unwrap_or(true))
        .bind(body.max_devices)
        .bind(now)
        .fetch_one(&self.pool)
        .await;
        match result {
            Ok(user) => {
                tracing::info!(user_id = user.id, email = %user.email, "user created");
                Ok(user)
            }
            Err(err) if super::is_unique_violation(&err) => {
                Err(ApiError::Conflict("Email is already in use.".to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    pub async fn update(&self, id: i64, body: UpdateUserBodyDto) -> ApiResponse<User> {
        let mut user = self.find(id).await?.ok_or(ApiError::NotFound)?;
        if let Some(name) = body.name {
            validate_name(&name)?;
            user.name = name.trim().to_string();
        }
        if let Some(email) = body.email {
            validate_email(&email)?;
            user.email = email.trim().to_string();
        }
        if let Some(password) = body.password.as_deref().filter(|p| !p.is_empty()) {
            validate_password(password)?;
            user.password_hash = password::hash_password(password)
                .map_err(|err| anyhow!("password hashing failed: {err}"))?;
        }
        if let Some(is_active) = body.is_active {
            user.is_active = is_active;
        }
        if let Some(max_devices) = body.max_devices {
            validate_max_devices(max_devices)?;
            user.max_devices = max_devices;
        }
        let result = sqlx::query_as::<_, User>(
            "UPDATE users SET name = ?1, email = ?2, password_hash = ?3, is_active = ?4, \
             max_devices = ?5, updated_at = ?6 WHERE id = ?7 RETURNING *",
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.is_active)
        .bind(user.max_devices)
        .bind(self.clock.now_utc())
        .bind(id)
        .fetch_one(&self.pool)
        .await;
        match result {
            Ok(user) => Ok(user),
            Err(err) if super::is_unique_violation(&err) => {
                Err(ApiError::Conflict("Email is already in use.".to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Devices and grants go with the account through the schema's cascade
    /// rules.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let done = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if done.rows_affected() > 0 {
            tracing::info!(user_id = id, "user deleted");
        }
        Ok(done.rows_affected() > 0)
    }

    /// First-run convenience: when the instance has no admin yet and the
    /// config names one, create it. Safe to call on every startup.
    pub async fn bootstrap_admin(&self, auth: &AuthConfig) -> Result<()> {
        let (Some(email), Some(bootstrap_password)) = (
            auth.bootstrap_admin_email.as_deref(),
            auth.bootstrap_admin_password.as_deref(),
        ) else {
            return Ok(());
        };
        let admins =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE role = 'admin'")
                .fetch_one(&self.pool)
                .await?;
        if admins > 0 {
            return Ok(());
        }
        let name = auth.bootstrap_admin_name.as_deref().unwrap_or("Administrator");
        let password_hash = password::hash_password(bootstrap_password)
            .map_err(|err| anyhow!("password hashing failed: {err}"))?;
        let now = self.clock.now_utc();
        sqlx::query(
            "INSERT INTO users (name, email, password_hash, role, is_active, max_devices, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, 1, 1, ?5, ?5)",
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(UserRole::Admin)
        .bind(now)
        .execute(&self.pool)
        .await?;
        tracing::info!(email, "bootstrap admin created");
        Ok(())
    }
}

fn validate_name(name: &str) -> ApiResponse<()> {
    let name = name.trim();
    if name.is_empty() || name.len() > 255 {
        return Err(ApiError::Validation(
            "Name must be between 1 and 255 characters.".to_string(),
        ));
    }
    Ok(())
}

fn validate_email(email: &str) -> ApiResponse<()> {
    let email = email.trim();
    if email.is_empty() || email.len() > 255 || !email.contains('@') {
        return Err(ApiError::Validation(
            "Email must be a valid email address.".to_string(),
        ));
    }
    Ok(())
}

fn validate_password(password: &str) -> ApiResponse<()> {
    if password.len() < 8 {
        return Err(ApiError::Validation(
            "Password must be at least 8 characters.".to_string(),
        ));
    }
    Ok(())
}

fn validate_max_devices(max_devices: i64) -> ApiResponse<()> {
    if !(1..=10).contains(&max_devices) {
        return Err(ApiError::Validation(
            "Device limit must be between 1 and 10.".to_string(),
        ));
    }
    Ok(())
}

use anyhow::{Context, anyhow};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::clock::Clock;
use crate::config::AuthConfig;
use crate::errors::{ApiError, ApiResponse, InternalError};
use crate::models::User;
use crate::services::device::{DeviceRegistry, Registration};
use crate::services::fingerprint::{self, DeviceSignals};
use crate::services::password;
use crate::services::user::UserStore;

const ISSUER: &str = "lectern";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub sub: i64,
    pub exp: i64,
    pub jti: String,
}

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Keys {
    fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

pub struct LoginSuccess {
    pub user: User,
    pub session_token: String,
    /// Set when this login minted a fresh device identity; the response
    /// owes the browser a durable cookie carrying it.
    pub minted_device_token: Option<String>,
    pub redirect: &'static str,
}

/// Issues and checks session tokens, and runs the whole login ceremony:
/// credentials, account state, then device registration for accounts that
/// are not exempt from gating.
pub struct SessionGate {
    keys: Keys,
    session_ttl_secs: i64,
    users: Arc<UserStore>,
    devices: Arc<DeviceRegistry>,
    clock: Arc<dyn Clock>,
}

impl SessionGate {
    pub fn new(
        auth: &AuthConfig,
        users: Arc<UserStore>,
        devices: Arc<DeviceRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            keys: Keys::new(auth.secret.as_bytes()),
            session_ttl_secs: auth.session_ttl_secs(),
            users,
            devices,
            clock,
        }
    }

    pub async fn login(
        &self,
        email: &str,
        password: &str,
        signals: &DeviceSignals,
    ) -> ApiResponse<LoginSuccess> {
        // Unknown address and wrong password collapse into one answer.
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(ApiError::InvalidCredentials)?;
        let valid = password::verify_password(password, &user.password_hash)
            .map_err(|err| anyhow!("stored password hash rejected: {err}"))?;
        if !valid {
            tracing::warn!(email, "failed login attempt");
            return Err(ApiError::InvalidCredentials);
        }
        if !user.is_active {
            return Err(ApiError::AccountInactive);
        }

        let mut minted_device_token = None;
        if !user.is_admin() {
            let fingerprint =
                fingerprint::fingerprint(signals).map_err(|_| ApiError::DeviceInvalid)?;
            let label = fingerprint::device_label(&signals.user_agent);
            let outcome = self
                .devices
                .register(
                    user.id,
                    user.max_devices,
                    &fingerprint.hash,
                    label,
                    signals.ip.as_deref(),
                )
                .await?;
            match outcome {
                Registration::Known(_) | Registration::Created(_) => {}
                Registration::CapacityExceeded => return Err(ApiError::DeviceLimitReached),
                Registration::OwnedByAnother => return Err(ApiError::DeviceInvalid),
            }
            minted_device_token = fingerprint.minted_token;
        }

        let session_token = self.issue(user.id)?;
        tracing::info!(user_id = user.id, email = %user.email, "login accepted");
        let redirect = if user.is_admin() {
            "/admin/dashboard"
        } else {
            "/my/courses"
        };
        Ok(LoginSuccess {
            user,
            session_token,
            minted_device_token,
            redirect,
        })
    }

    pub fn issue(&self, user_id: i64) -> anyhow::Result<String> {
        let claims = Claims {
            iss: ISSUER.to_string(),
            sub: user_id,
            exp: self.clock.now_utc().timestamp() + self.session_ttl_secs,
            jti: ulid::Ulid::new().to_string(),
        };
        encode(&Header::default(), &claims, &self.keys.encoding)
            .with_context(|| InternalError::IssueSessionError { user_id })
    }

    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        decode::<Claims>(token, &self.keys.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|_| ApiError::AuthenticationRequired)
    }

    pub fn session_ttl_secs(&self) -> i64 {
        self.session_ttl_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::models::UserRole;
    use crate::testing;
    use sqlx::SqlitePool;

    fn auth_config(secret: &str) -> AuthConfig {
        AuthConfig {
            secret: secret.to_string(),
            session_ttl_hours: 12,
            bootstrap_admin_email: None,
            bootstrap_admin_password: None,
            bootstrap_admin_name: None,
        }
    }

    fn gate(pool: &SqlitePool, secret: &str) -> SessionGate {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let users = Arc::new(UserStore::new(pool.clone(), clock.clone()));
        let devices = Arc::new(DeviceRegistry::new(pool.clone(), clock.clone()));
        SessionGate::new(&auth_config(secret), users, devices, clock)
    }

    fn browser(token: Option<String>) -> DeviceSignals {
        DeviceSignals {
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7)".into(),
            accept_language: "en-US,en;q=0.9".into(),
            accept_encoding: "gzip, deflate, br".into(),
            device_token: token,
            ip: Some("203.0.113.9".into()),
        }
    }

    async fn device_count(pool: &SqlitePool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM user_devices")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn unknown_email_and_wrong_password_read_the_same() {
        let pool = testing::memory_pool().await;
        testing::seed_user(&pool, "a@example.com", UserRole::User, 2).await;
        let gate = gate(&pool, "secret-one");

        let missing = gate.login("nobody@example.com", testing::TEST_PASSWORD, &browser(None)).await;
        assert!(matches!(missing, Err(ApiError::InvalidCredentials)));

        let wrong = gate.login("a@example.com", "not the password", &browser(None)).await;
        assert!(matches!(wrong, Err(ApiError::InvalidCredentials)));
        assert_eq!(device_count(&pool).await, 0);
    }

    #[tokio::test]
    async fn inactive_account_is_rejected_before_any_device_work() {
        let pool = testing::memory_pool().await;
        let user = testing::seed_user(&pool, "a@example.com", UserRole::User, 2).await;
        sqlx::query("UPDATE users SET is_active = 0 WHERE id = ?")
            .bind(user.id)
            .execute(&pool)
            .await
            .unwrap();
        let gate = gate(&pool, "secret-one");

        let result = gate.login("a@example.com", testing::TEST_PASSWORD, &browser(None)).await;
        assert!(matches!(result, Err(ApiError::AccountInactive)));
        assert_eq!(device_count(&pool).await, 0);
    }

    #[tokio::test]
    async fn first_login_mints_a_device_and_a_replay_reuses_it() {
        let pool = testing::memory_pool().await;
        testing::seed_user(&pool, "a@example.com", UserRole::User, 2).await;
        let gate = gate(&pool, "secret-one");

        let first = gate
            .login("a@example.com", testing::TEST_PASSWORD, &browser(None))
            .await
            .unwrap();
        let token = first.minted_device_token.clone();
        assert!(token.is_some());
        assert_eq!(first.redirect, "/my/courses");
        assert_eq!(device_count(&pool).await, 1);

        let second = gate
            .login("a@example.com", testing::TEST_PASSWORD, &browser(token))
            .await
            .unwrap();
        assert!(second.minted_device_token.is_none());
        assert_eq!(device_count(&pool).await, 1);
    }

    #[tokio::test]
    async fn admins_log_in_without_touching_the_registry() {
        let pool = testing::memory_pool().await;
        testing::seed_user(&pool, "ops@example.com", UserRole::Admin, 2).await;
        let gate = gate(&pool, "secret-one");

        let success = gate
            .login("ops@example.com", testing::TEST_PASSWORD, &browser(None))
            .await
            .unwrap();
        assert!(success.minted_device_token.is_none());
        assert_eq!(success.redirect, "/admin/dashboard");
        assert_eq!(device_count(&pool).await, 0);
    }

    #[tokio::test]
    async fn a_second_browser_past_capacity_is_turned_away() {
        let pool = testing::memory_pool().await;
        testing::seed_user(&pool, "a@example.com", UserRole::User, 1).await;
        let gate = gate(&pool, "secret-one");

        gate.login("a@example.com", testing::TEST_PASSWORD, &browser(None))
            .await
            .unwrap();
        let result = gate
            .login("a@example.com", testing::TEST_PASSWORD, &browser(None))
            .await;
        assert!(matches!(result, Err(ApiError::DeviceLimitReached)));
        assert_eq!(device_count(&pool).await, 1);
    }

    #[tokio::test]
    async fn malformed_and_foreign_device_tokens_are_invalid() {
        let pool = testing::memory_pool().await;
        testing::seed_user(&pool, "a@example.com", UserRole::User, 2).await;
        testing::seed_user(&pool, "b@example.com", UserRole::User, 2).await;
        let gate = gate(&pool, "secret-one");

        let garbled = gate
            .login("a@example.com", testing::TEST_PASSWORD, &browser(Some("zz".into())))
            .await;
        assert!(matches!(garbled, Err(ApiError::DeviceInvalid)));

        // The same browser identity cannot be shared across accounts.
        let minted = gate
            .login("a@example.com", testing::TEST_PASSWORD, &browser(None))
            .await
            .unwrap()
            .minted_device_token;
        let stolen = gate
            .login("b@example.com", testing::TEST_PASSWORD, &browser(minted))
            .await;
        assert!(matches!(stolen, Err(ApiError::DeviceInvalid)));
    }

    #[tokio::test]
    async fn tokens_verify_only_with_the_issuing_secret() {
        let pool = testing::memory_pool().await;
        let user = testing::seed_user(&pool, "a@example.com", UserRole::User, 2).await;
        let issuing = gate(&pool, "secret-one");
        let other = gate(&pool, "secret-two");

        let token = issuing.issue(user.id).unwrap();
        let claims = issuing.verify(&token).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.iss, ISSUER);

        assert!(matches!(
            issuing.verify("not-a-token"),
            Err(ApiError::AuthenticationRequired)
        ));
        assert!(matches!(
            other.verify(&token),
            Err(ApiError::AuthenticationRequired)
        ));
    }
}

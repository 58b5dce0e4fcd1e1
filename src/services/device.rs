use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::clock::Clock;
use crate::models::Device;

/// Bounded registry of fingerprints per account. Capacity is enforced by
/// a single conditional insert so racing first-time logins cannot
/// overshoot the per-user cap.
pub struct DeviceRegistry {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

#[derive(Debug)]
pub enum Registration {
    /// The fingerprint was already registered to this account; the row
    /// was refreshed and no capacity was consumed.
    Known(Device),
    Created(Device),
    CapacityExceeded,
    /// The fingerprint is registered to a different account.
    OwnedByAnother,
}

impl DeviceRegistry {
    pub fn new(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }

    pub async fn register(
        &self,
        user_id: i64,
        max_devices: i64,
        hash: &str,
        label: &str,
        ip: Option<&str>,
    ) -> anyhow::Result<Registration> {
        let now = self.clock.now_utc();
        if let Some(device) = self.find_by_hash(hash).await? {
            if device.user_id != user_id {
                return Ok(Registration::OwnedByAnother);
            }
            let device = self.refresh(device.id, ip, now).await?;
            return Ok(Registration::Known(device));
        }
        let result = sqlx::query(
            "INSERT INTO user_devices (user_id, device_name, device_hash, ip_address, last_active_at, created_at, updated_at) \
             SELECT ?1, ?2, ?3, ?4, ?5, ?5, ?5 \
             WHERE (SELECT COUNT(*) FROM user_devices WHERE user_id = ?1) < ?6",
        )
        .bind(user_id)
        .bind(label)
        .bind(hash)
        .bind(ip)
        .bind(now)
        .bind(max_devices)
        .execute(&self.pool)
        .await;
        match result {
            Ok(done) if done.rows_affected() == 1 => {
                let device = self
                    .find_by_hash(hash)
                    .await?
                    .context("registered device row vanished")?;
                tracing::info!(
                    user_id,
                    device = %device.device_name,
                    "registered new device"
                );
                Ok(Registration::Created(device))
            }
            Ok(_) => Ok(Registration::CapacityExceeded),
            // Lost a race against an identical fingerprint; re-read to see
            // whose it became.
            Err(err) if super::is_unique_violation(&err) => match self.find_by_hash(hash).await? {
                Some(device) if device.user_id == user_id => {
                    let device = self.refresh(device.id, ip, now).await?;
                    Ok(Registration::Known(device))
                }
                _ => Ok(Registration::OwnedByAnother),
            },
            Err(err) => Err(err.into()),
        }
    }

    /// Request-gate lookup: the fingerprint must already belong to this
    /// account. A hit refreshes the activity timestamp.
    pub async fn validate(
        &self,
        user_id: i64,
        hash: &str,
        ip: Option<&str>,
    ) -> anyhow::Result<Option<Device>> {
        let device = sqlx::query_as::<_, Device>(
            "SELECT * FROM user_devices WHERE user_id = ? AND device_hash = ?",
        )
        .bind(user_id)
        .bind(hash)
        .fetch_optional(&self.pool)
        .await?;
        match device {
            Some(device) => {
                let device = self.refresh(device.id, ip, self.clock.now_utc()).await?;
                Ok(Some(device))
            }
            None => Ok(None),
        }
    }

    pub async fn list(&self, user_id: i64) -> anyhow::Result<Vec<Device>> {
        let devices = sqlx::query_as::<_, Device>(
            "SELECT * FROM user_devices WHERE user_id = ? ORDER BY last_active_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(devices)
    }

    pub async fn count(&self, user_id: i64) -> anyhow::Result<i64> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM user_devices WHERE user_id = ?")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    pub async fn remove_one(&self, user_id: i64, device_id: i64) -> anyhow::Result<bool> {
        let done = sqlx::query("DELETE FROM user_devices WHERE id = ? AND user_id = ?")
            .bind(device_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected() > 0)
    }

    pub async fn remove_all(&self, user_id: i64) -> anyhow::Result<u64> {
        let done = sqlx::query("DELETE FROM user_devices WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected())
    }

    async fn find_by_hash(&self, hash: &str) -> anyhow::Result<Option<Device>> {
        let device =
            sqlx::query_as::<_, Device>("SELECT * FROM user_devices WHERE device_hash = ?")
                .bind(hash)
                .fetch_optional(&self.pool)
                .await?;
        Ok(device)
    }

    async fn refresh(
        &self,
        device_id: i64,
        ip: Option<&str>,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Device> {
        sqlx::query(
            "UPDATE user_devices SET last_active_at = ?1, updated_at = ?1, \
             ip_address = COALESCE(?2, ip_address) WHERE id = ?3",
        )
        .bind(now)
        .bind(ip)
        .bind(device_id)
        .execute(&self.pool)
        .await?;
        let device = sqlx::query_as::<_, Device>("SELECT * FROM user_devices WHERE id = ?")
            .bind(device_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MockClock;
    use crate::models::UserRole;
    use crate::testing;

    fn registry_with_clock(pool: &SqlitePool, clock: Arc<MockClock>) -> DeviceRegistry {
        DeviceRegistry::new(pool.clone(), clock)
    }

    // Deterministic fingerprint per seed, so repeat calls mean "the same
    // physical device came back".
    fn hash(seed: &str) -> String {
        use sha2::{Digest, Sha256};
        let token = hex::encode(Sha256::digest(seed.as_bytes()));
        crate::services::fingerprint::fingerprint(&crate::services::fingerprint::DeviceSignals {
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7)".into(),
            device_token: Some(token),
            ..Default::default()
        })
        .unwrap()
        .hash
    }

    #[tokio::test]
    async fn first_registration_creates_a_row() {
        let pool = testing::memory_pool().await;
        let user = testing::seed_user(&pool, "a@example.com", UserRole::User, 2).await;
        let registry = DeviceRegistry::new(pool.clone(), Arc::new(crate::clock::SystemClock));

        let outcome = registry
            .register(user.id, user.max_devices, &hash("one"), "Mac", Some("203.0.113.9"))
            .await
            .unwrap();
        let device = match outcome {
            Registration::Created(device) => device,
            other => panic!("expected Created, got {other:?}"),
        };
        assert_eq!(device.user_id, user.id);
        assert_eq!(device.device_name, "Mac");
        assert_eq!(device.ip_address.as_deref(), Some("203.0.113.9"));
        assert_eq!(registry.count(user.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn reregistration_refreshes_without_consuming_capacity() {
        let pool = testing::memory_pool().await;
        let user = testing::seed_user(&pool, "a@example.com", UserRole::User, 1).await;
        let clock = Arc::new(MockClock::at("2025-03-01T08:00:00Z"));
        let registry = registry_with_clock(&pool, clock.clone());

        let first = registry
            .register(user.id, user.max_devices, &hash("one"), "Mac", None)
            .await
            .unwrap();
        assert!(matches!(first, Registration::Created(_)));

        clock.advance(chrono::Duration::hours(6));
        let second = registry
            .register(user.id, user.max_devices, &hash("one"), "Mac", Some("198.51.100.7"))
            .await
            .unwrap();
        let device = match second {
            Registration::Known(device) => device,
            other => panic!("expected Known, got {other:?}"),
        };
        assert_eq!(device.last_active_at.to_rfc3339(), "2025-03-01T14:00:00+00:00");
        assert_eq!(device.ip_address.as_deref(), Some("198.51.100.7"));
        assert_eq!(registry.count(user.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn capacity_blocks_the_extra_device() {
        let pool = testing::memory_pool().await;
        let user = testing::seed_user(&pool, "a@example.com", UserRole::User, 2).await;
        let registry = DeviceRegistry::new(pool.clone(), Arc::new(crate::clock::SystemClock));

        for seed in ["one", "two"] {
            let outcome = registry
                .register(user.id, user.max_devices, &hash(seed), "Mac", None)
                .await
                .unwrap();
            assert!(matches!(outcome, Registration::Created(_)));
        }
        let third = registry
            .register(user.id, user.max_devices, &hash("three"), "iPhone", None)
            .await
            .unwrap();
        assert!(matches!(third, Registration::CapacityExceeded));
        assert_eq!(registry.count(user.id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn concurrent_first_logins_cannot_overshoot() {
        let pool = testing::memory_pool().await;
        let user = testing::seed_user(&pool, "a@example.com", UserRole::User, 1).await;
        let registry = Arc::new(DeviceRegistry::new(
            pool.clone(),
            Arc::new(crate::clock::SystemClock),
        ));

        let left_hash = hash("left");
        let right_hash = hash("right");
        let (left, right) = tokio::join!(
            registry.register(user.id, user.max_devices, &left_hash, "Mac", None),
            registry.register(user.id, user.max_devices, &right_hash, "iPhone", None),
        );
        let outcomes = [left.unwrap(), right.unwrap()];
        let created = outcomes
            .iter()
            .filter(|o| matches!(o, Registration::Created(_)))
            .count();
        let rejected = outcomes
            .iter()
            .filter(|o| matches!(o, Registration::CapacityExceeded))
            .count();
        assert_eq!((created, rejected), (1, 1));
        assert_eq!(registry.count(user.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn fingerprint_owned_by_another_account_is_rejected() {
        let pool = testing::memory_pool().await;
        let first = testing::seed_user(&pool, "first@example.com", UserRole::User, 2).await;
        let second = testing::seed_user(&pool, "second@example.com", UserRole::User, 2).await;
        let registry = DeviceRegistry::new(pool.clone(), Arc::new(crate::clock::SystemClock));

        let shared = hash("shared-browser");
        let claimed = registry
            .register(first.id, first.max_devices, &shared, "Mac", None)
            .await
            .unwrap();
        assert!(matches!(claimed, Registration::Created(_)));

        let stolen = registry
            .register(second.id, second.max_devices, &shared, "Mac", None)
            .await
            .unwrap();
        assert!(matches!(stolen, Registration::OwnedByAnother));
        assert_eq!(registry.count(second.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn validate_hits_only_registered_fingerprints() {
        let pool = testing::memory_pool().await;
        let user = testing::seed_user(&pool, "a@example.com", UserRole::User, 2).await;
        let clock = Arc::new(MockClock::at("2025-03-01T08:00:00Z"));
        let registry = registry_with_clock(&pool, clock.clone());

        registry
            .register(user.id, user.max_devices, &hash("one"), "Mac", None)
            .await
            .unwrap();
        assert!(registry.validate(user.id, &hash("other"), None).await.unwrap().is_none());

        clock.advance(chrono::Duration::minutes(30));
        let device = registry
            .validate(user.id, &hash("one"), None)
            .await
            .unwrap()
            .expect("registered fingerprint should validate");
        assert_eq!(device.last_active_at.to_rfc3339(), "2025-03-01T08:30:00+00:00");
    }

    #[tokio::test]
    async fn eviction_frees_a_slot() {
        let pool = testing::memory_pool().await;
        let user = testing::seed_user(&pool, "a@example.com", UserRole::User, 1).await;
        let registry = DeviceRegistry::new(pool.clone(), Arc::new(crate::clock::SystemClock));

        let outcome = registry
            .register(user.id, user.max_devices, &hash("one"), "Mac", None)
            .await
            .unwrap();
        let device = match outcome {
            Registration::Created(device) => device,
            other => panic!("expected Created, got {other:?}"),
        };
        assert!(matches!(
            registry
                .register(user.id, user.max_devices, &hash("two"), "iPhone", None)
                .await
                .unwrap(),
            Registration::CapacityExceeded
        ));

        assert!(registry.remove_one(user.id, device.id).await.unwrap());
        assert!(matches!(
            registry
                .register(user.id, user.max_devices, &hash("two"), "iPhone", None)
                .await
                .unwrap(),
            Registration::Created(_)
        ));

        assert_eq!(registry.remove_all(user.id).await.unwrap(), 1);
        assert_eq!(registry.count(user.id).await.unwrap(), 0);
    }
}

use sqlx::SqlitePool;
use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::services::{
    AccessGrantStore, CourseStore, DeviceRegistry, ObjectStorage, SessionGate, StatsService,
    UserStore, VideoService,
};

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionGate>,
    pub users: Arc<UserStore>,
    pub devices: Arc<DeviceRegistry>,
    pub access: Arc<AccessGrantStore>,
    pub courses: Arc<CourseStore>,
    pub videos: Arc<VideoService>,
    pub stats: Arc<StatsService>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub async fn build(config: &Config, pool: SqlitePool) -> anyhow::Result<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let state = Self::assemble(config, pool, clock);
        state.users.bootstrap_admin(&config.auth).await?;
        Ok(state)
    }

    /// Wiring only, no side effects. Tests assemble against a mock clock.
    pub fn assemble(config: &Config, pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        let storage = Arc::new(ObjectStorage::new(&config.storage, clock.clone()));
        let users = Arc::new(UserStore::new(pool.clone(), clock.clone()));
        let devices = Arc::new(DeviceRegistry::new(pool.clone(), clock.clone()));
        let sessions = Arc::new(SessionGate::new(
            &config.auth,
            users.clone(),
            devices.clone(),
            clock.clone(),
        ));
        let access = Arc::new(AccessGrantStore::new(pool.clone(), clock.clone()));
        let courses = Arc::new(CourseStore::new(
            pool.clone(),
            storage.clone(),
            clock.clone(),
        ));
        let videos = Arc::new(VideoService::new(
            pool.clone(),
            storage,
            config.media.clone(),
            clock.clone(),
        ));
        let stats = Arc::new(StatsService::new(pool, clock.clone()));
        Self {
            sessions,
            users,
            devices,
            access,
            courses,
            videos,
            stats,
            clock,
        }
    }
}

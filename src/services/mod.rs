pub mod access;
pub mod course;
pub mod device;
pub mod fingerprint;
pub mod password;
pub mod session;
pub mod stats;
pub mod storage;
pub mod user;
pub mod video;

pub use access::AccessGrantStore;
pub use course::CourseStore;
pub use device::DeviceRegistry;
pub use session::SessionGate;
pub use stats::StatsService;
pub use storage::ObjectStorage;
pub use user::UserStore;
pub use video::VideoService;

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => {
            matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation)
        }
        _ => false,
    }
}

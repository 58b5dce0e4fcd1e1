pub mod access;
pub mod courses;
pub mod dashboard;
pub mod users;
pub mod videos;

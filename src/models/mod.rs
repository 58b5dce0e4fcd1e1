pub mod dtos;

mod access;
mod course;
mod device;
mod user;
mod video;

pub use access::AccessGrant;
pub use course::Course;
pub use device::Device;
pub use user::{User, UserRole};
pub use video::Video;

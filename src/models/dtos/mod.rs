pub mod access;
pub mod auth;
pub mod course;
pub mod pagination;
pub mod system;
pub mod user;
pub mod video;

pub use access::*;
pub use auth::*;
pub use course::*;
pub use pagination::*;
pub use system::*;
pub use user::*;
pub use video::*;

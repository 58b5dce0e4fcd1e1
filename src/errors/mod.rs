mod api_error;
mod internal_error;

pub use api_error::{ApiError, ApiResponse};
pub use internal_error::InternalError;

mod cookie;
mod mimetype;
mod serialize_rfc3339;

pub use cookie::*;
pub use mimetype::*;
pub use serialize_rfc3339::*;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::errors::{ApiError, ApiResponse};
use crate::extractors::Identity;

pub async fn require_admin(
    identity: Identity,
    request: Request,
    next: Next,
) -> ApiResponse<Response> {
    if !identity.is_exempt_from_gating() {
        return Err(ApiError::AccessDenied);
    }
    Ok(next.run(request).await)
}

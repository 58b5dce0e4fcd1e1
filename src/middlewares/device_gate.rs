use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::errors::{ApiError, ApiResponse};
use crate::extractors::Identity;
use crate::services::fingerprint::{self, DeviceSignals};
use crate::state::AppState;

/// Every request to the member surface must come from a device that went
/// through login-time registration. There is no auto-registration here: a
/// stolen session cookie alone cannot claim a device slot.
pub async fn device_gate(
    State(state): State<AppState>,
    identity: Identity,
    signals: DeviceSignals,
    request: Request,
    next: Next,
) -> ApiResponse<Response> {
    if identity.is_exempt_from_gating() {
        return Ok(next.run(request).await);
    }
    if signals.device_token.is_none() {
        return Err(ApiError::DeviceInvalid);
    }
    let fingerprint = fingerprint::fingerprint(&signals).map_err(|_| ApiError::DeviceInvalid)?;
    let known = state
        .devices
        .validate(identity.user.id, &fingerprint.hash, signals.ip.as_deref())
        .await?;
    if known.is_none() {
        tracing::warn!(
            user_id = identity.user.id,
            "request from unregistered device"
        );
        return Err(ApiError::DeviceNotRegistered);
    }
    Ok(next.run(request).await)
}

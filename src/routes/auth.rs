use axum::Json;
use axum::extract::State;
use axum::http::HeaderValue;
use axum::http::header::SET_COOKIE;
use axum::response::{IntoResponse, Response};

use crate::errors::ApiResponse;
use crate::extractors::Identity;
use crate::models::dtos::{LoginBodyDto, LoginResponseDto};
use crate::services::fingerprint::DeviceSignals;
use crate::state::AppState;
use crate::utils::{SESSION_COOKIE, clear_cookie, device_cookie, session_cookie};

/// Runs the whole login ceremony. Success sets the session cookie, plus a
/// durable device token cookie when this login minted one.
pub async fn login(
    State(state): State<AppState>,
    signals: DeviceSignals,
    Json(body): Json<LoginBodyDto>,
) -> ApiResponse<Response> {
    let success = state
        .sessions
        .login(&body.email, &body.password, &signals)
        .await?;
    let mut response = Json(LoginResponseDto {
        redirect: success.redirect,
    })
    .into_response();
    let session = session_cookie(&success.session_token, state.sessions.session_ttl_secs());
    response
        .headers_mut()
        .append(SET_COOKIE, HeaderValue::from_str(&session)?);
    if let Some(token) = success.minted_device_token.as_deref() {
        response
            .headers_mut()
            .append(SET_COOKIE, HeaderValue::from_str(&device_cookie(token))?);
    }
    Ok(response)
}

/// Drops the session cookie. The device token survives on purpose so the
/// next login does not consume a fresh slot.
pub async fn logout() -> impl IntoResponse {
    ([(SET_COOKIE, clear_cookie(SESSION_COOKIE))], Json("ok!"))
}

pub async fn me(identity: Identity) -> impl IntoResponse {
    Json(identity.user)
}

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header::SET_COOKIE};
use axum::response::{IntoResponse, Response};
use std::fmt::{Display, Formatter};

use crate::utils::{SESSION_COOKIE, clear_cookie};

pub type ApiResponse<T> = Result<T, ApiError>;

#[derive(Debug)]
pub enum ApiError {
    InvalidCredentials,
    AuthenticationRequired,
    AccountInactive,
    DeviceLimitReached,
    DeviceNotRegistered,
    DeviceInvalid,
    AccessDenied,
    NotFound,
    Validation(String),
    Conflict(String),
    PlaybackUnavailable,
    Internal(anyhow::Error),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidCredentials => "invalid_credentials",
            ApiError::AuthenticationRequired => "authentication_required",
            ApiError::AccountInactive => "account_inactive",
            ApiError::DeviceLimitReached => "device_limit_reached",
            ApiError::DeviceNotRegistered => "device_not_registered",
            ApiError::DeviceInvalid => "device_invalid",
            ApiError::AccessDenied => "access_denied",
            ApiError::NotFound => "not_found",
            ApiError::Validation(_) => "validation_failed",
            ApiError::Conflict(_) => "conflict",
            ApiError::PlaybackUnavailable => "playback_unavailable",
            ApiError::Internal(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidCredentials | ApiError::AuthenticationRequired => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::AccountInactive
            | ApiError::DeviceLimitReached
            | ApiError::DeviceNotRegistered
            | ApiError::DeviceInvalid
            | ApiError::AccessDenied => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::PlaybackUnavailable => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Session-fatal rejections: the response also tells the browser to
    /// drop its session cookie.
    pub fn clears_session(&self) -> bool {
        matches!(
            self,
            ApiError::AccountInactive
                | ApiError::DeviceLimitReached
                | ApiError::DeviceNotRegistered
                | ApiError::DeviceInvalid
        )
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::InvalidCredentials => {
                f.write_str("These credentials do not match our records.")
            }
            ApiError::AuthenticationRequired => f.write_str("Authentication required."),
            ApiError::AccountInactive => {
                f.write_str("Your account has been deactivated. Please contact support.")
            }
            ApiError::DeviceLimitReached => f.write_str(
                "Maximum device limit reached. Please contact support to reset your devices.",
            ),
            ApiError::DeviceNotRegistered => {
                f.write_str("This device is not registered for your account.")
            }
            ApiError::DeviceInvalid => f.write_str("This device could not be verified."),
            ApiError::AccessDenied => f.write_str("You do not have access to this content."),
            ApiError::NotFound => f.write_str("Resource not found"),
            ApiError::Validation(message) => f.write_str(message),
            ApiError::Conflict(message) => f.write_str(message),
            ApiError::PlaybackUnavailable => {
                f.write_str("Playback is temporarily unavailable. Please try again.")
            }
            ApiError::Internal(err) => write!(f, "An internal error occurred: {err}"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        match &self {
            ApiError::Internal(err) => tracing::error!("{err:?}"),
            _ => tracing::debug!("{}", message),
        }
        let body = Json(serde_json::json!({
            "message": message,
            "error": self.code(),
        }));
        let mut response = (self.status(), body).into_response();
        if self.clears_session() {
            if let Ok(value) = HeaderValue::from_str(&clear_cookie(SESSION_COOKIE)) {
                response.headers_mut().append(SET_COOKIE, value);
            }
        }
        response
    }
}

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(value: E) -> Self {
        Self::Internal(value.into())
    }
}

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::errors::ApiError;
use crate::models::User;
use crate::state::AppState;
use crate::utils::{read_cookie, SESSION_COOKIE};

/// The account behind a request. Extraction succeeds only for a valid
/// session token naming an existing, active account; the row is reloaded
/// every request so deactivation and role edits bite immediately.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user: User,
}

impl Identity {
    /// The one capability check the gates share: operators bypass both
    /// device registration and course entitlements.
    pub fn is_exempt_from_gating(&self) -> bool {
        self.user.is_admin()
    }
}

impl FromRequestParts<AppState> for Identity {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Middlewares extract before handlers do; resolve the account once
        // per request.
        if let Some(identity) = parts.extensions.get::<Identity>() {
            return Ok(identity.clone());
        }
        let token = bearer_token(parts)
            .or_else(|| read_cookie(&parts.headers, SESSION_COOKIE))
            .ok_or(ApiError::AuthenticationRequired)?;
        let claims = state.sessions.verify(&token)?;
        let user = state
            .users
            .find(claims.sub)
            .await?
            .ok_or(ApiError::AuthenticationRequired)?;
        if !user.is_active {
            return Err(ApiError::AccountInactive);
        }
        let identity = Identity { user };
        parts.extensions.insert(identity.clone());
        Ok(identity)
    }
}

fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim_start().to_string())
}

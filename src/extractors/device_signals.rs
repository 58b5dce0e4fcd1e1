use axum::extract::FromRequestParts;
use axum::http::header::{ACCEPT_ENCODING, ACCEPT_LANGUAGE, USER_AGENT};
use axum::http::request::Parts;
use std::convert::Infallible;

use super::ClientIp;
use crate::services::fingerprint::DeviceSignals;
use crate::utils::{read_cookie, DEVICE_COOKIE};

impl<S> FromRequestParts<S> for DeviceSignals
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let header = |name| {
            parts
                .headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        };
        let user_agent = header(USER_AGENT).unwrap_or_else(|| "unknown".to_string());
        let accept_language = header(ACCEPT_LANGUAGE).unwrap_or_default();
        let accept_encoding = header(ACCEPT_ENCODING).unwrap_or_default();
        let device_token = read_cookie(&parts.headers, DEVICE_COOKIE);
        let ip = match ClientIp::from_request_parts(parts, state).await {
            Ok(ClientIp(ip)) => ip,
            Err(never) => match never {},
        };

        Ok(DeviceSignals {
            user_agent,
            accept_language,
            accept_encoding,
            device_token,
            ip,
        })
    }
}

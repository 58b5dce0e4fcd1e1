use axum::extract::Request;
use axum::http::StatusCode;
use axum::http::header::{ACCEPT, SET_COOKIE};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};

use crate::utils::SESSION_COOKIE;

/// API clients get the JSON error bodies as-is. A browser navigating with
/// `Accept: text/html` is sent back to the login page when its identity is
/// the problem, keeping any cookie-clearing headers the error attached.
pub async fn negotiate(request: Request, next: Next) -> Response {
    let wants_html = request
        .headers()
        .get(ACCEPT)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|accept| accept.contains("text/html"));
    let response = next.run(request).await;
    if !wants_html || !is_identity_failure(&response) {
        return response;
    }
    let mut redirect = Redirect::to("/login").into_response();
    for cookie in response.headers().get_all(SET_COOKIE) {
        redirect.headers_mut().append(SET_COOKIE, cookie.clone());
    }
    redirect
}

/// 401s, and the 403s that force a logout. A plain `access_denied` stays
/// on the page it was denied from.
fn is_identity_failure(response: &Response) -> bool {
    match response.status() {
        StatusCode::UNAUTHORIZED => true,
        StatusCode::FORBIDDEN => {
            let cleared = format!("{SESSION_COOKIE}=;");
            response
                .headers()
                .get_all(SET_COOKIE)
                .iter()
                .any(|value| value.to_str().is_ok_and(|v| v.starts_with(&cleared)))
        }
        _ => false,
    }
}

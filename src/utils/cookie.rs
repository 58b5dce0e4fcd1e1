use axum::http::HeaderMap;
use axum::http::header::COOKIE;

pub const SESSION_COOKIE: &str = "lectern_session";
pub const DEVICE_COOKIE: &str = "device_token";

/// Two years, the browser keeps the device identity across sessions.
pub const DEVICE_COOKIE_MAX_AGE: i64 = 60 * 60 * 24 * 365 * 2;

pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(COOKIE)
        .and_then(|value| value.to_str().ok())?
        .split(';')
        .map(|part| part.trim_start())
        .filter_map(|part| part.split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

pub fn session_cookie(token: &str, max_age_secs: i64) -> String {
    format!("{SESSION_COOKIE}={token}; Path=/; Max-Age={max_age_secs}; HttpOnly; SameSite=Lax")
}

pub fn device_cookie(token: &str) -> String {
    format!("{DEVICE_COOKIE}={token}; Path=/; Max-Age={DEVICE_COOKIE_MAX_AGE}; HttpOnly; SameSite=Lax")
}

pub fn clear_cookie(name: &str) -> String {
    format!("{name}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn reads_value_among_multiple_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; device_token=abc123; lectern_session=xyz"),
        );
        assert_eq!(
            read_cookie(&headers, DEVICE_COOKIE).as_deref(),
            Some("abc123")
        );
        assert_eq!(
            read_cookie(&headers, SESSION_COOKIE).as_deref(),
            Some("xyz")
        );
        assert_eq!(read_cookie(&headers, "missing"), None);
    }

    #[test]
    fn clearing_resets_max_age() {
        let cleared = clear_cookie(SESSION_COOKIE);
        assert!(cleared.starts_with("lectern_session=;"));
        assert!(cleared.contains("Max-Age=0"));
    }
}

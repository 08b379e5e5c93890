use axum::http::{header, HeaderMap};

pub const SESSION_COOKIE: &str = "studio_session";
pub const OAUTH_STATE_COOKIE: &str = "studio_oauth_state";

/// Value of a named cookie from the `Cookie` request headers.
pub fn read(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// `Set-Cookie` value for an HttpOnly, SameSite=Lax cookie on `/`.
pub fn build(name: &str, value: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        name,
        value,
        max_age_secs.max(0)
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn clear(name: &str, secure: bool) -> String {
    build(name, "", 0, secure)
}

/// Session token from `Authorization: Bearer` or the session cookie.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty());

    bearer.or_else(|| read(headers, SESSION_COOKIE))
}

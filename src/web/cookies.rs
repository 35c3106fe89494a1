//! Minimal cookie helpers for the portal's three cookies: the login
//! session, flash notices and the pending signup email.

use axum::http::{HeaderMap, HeaderValue, header::COOKIE, header::SET_COOKIE};
use axum::response::Response;

pub const SESSION_COOKIE: &str = "library_session";
pub const FLASH_COOKIE: &str = "library_flash";
pub const SIGNUP_COOKIE: &str = "library_signup";

/// Reads one cookie from the `Cookie` header.
///
/// Handles several cookies in one header by splitting on semicolons.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|header| header.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .find_map(|cookie| {
            let mut parts = cookie.trim().splitn(2, '=');
            match (parts.next(), parts.next()) {
                (Some(key), Some(value)) if key == name && !value.is_empty() => {
                    Some(value.to_string())
                }
                _ => None,
            }
        })
}

/// `Set-Cookie` value for an HTTP-only, same-site cookie scoped to `/`.
pub fn build_cookie(name: &str, value: &str, max_age_secs: i64, secure: bool) -> String {
    format!(
        "{name}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}{}",
        if secure { "; Secure" } else { "" }
    )
}

/// `Set-Cookie` value that makes the browser drop the cookie.
pub fn expired_cookie(name: &str) -> String {
    format!("{name}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// Appends a `Set-Cookie` header to a response.
pub fn append_cookie(response: &mut Response, cookie: &str) {
    match HeaderValue::from_str(cookie) {
        Ok(value) => {
            response.headers_mut().append(SET_COOKIE, value);
        }
        Err(e) => tracing::error!(error = %e, "Invalid Set-Cookie value"),
    }
}

/// Whether a response already sets the named cookie.
pub fn sets_cookie(response: &Response, name: &str) -> bool {
    let prefix = format!("{name}=");
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(|value| value.starts_with(&prefix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[test]
    fn test_read_cookie_among_several() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; library_session=abc123; other=1"),
        );

        assert_eq!(
            read_cookie(&headers, SESSION_COOKIE),
            Some("abc123".to_string())
        );
        assert_eq!(read_cookie(&headers, FLASH_COOKIE), None);
    }

    #[test]
    fn test_read_cookie_ignores_empty_value() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("library_session="));

        assert_eq!(read_cookie(&headers, SESSION_COOKIE), None);
    }

    #[test]
    fn test_build_cookie_flags() {
        let cookie = build_cookie(SESSION_COOKIE, "tok", 3600, true);
        assert!(cookie.starts_with("library_session=tok;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=3600"));
        assert!(cookie.ends_with("; Secure"));

        assert!(!build_cookie(SESSION_COOKIE, "tok", 60, false).contains("Secure"));
    }

    #[test]
    fn test_append_and_detect_cookie() {
        let mut response = "ok".into_response();
        assert!(!sets_cookie(&response, FLASH_COOKIE));

        append_cookie(&mut response, &expired_cookie(FLASH_COOKIE));
        assert!(sets_cookie(&response, FLASH_COOKIE));
        assert!(!sets_cookie(&response, SESSION_COOKIE));
    }
}

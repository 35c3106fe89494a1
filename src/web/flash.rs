//! One-shot notices carried across a redirect in a signed cookie.
//!
//! A handler finishes a form post with [`redirect`]; the next page render
//! picks the notices up through [`crate::web::page::PageContext`] and
//! [`layer`] clears the cookie once a non-redirect response goes out.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;
use crate::web::cookies::{
    FLASH_COOKIE, append_cookie, build_cookie, expired_cookie, read_cookie, sets_cookie,
};

/// Flash cookies only need to survive one redirect.
const FLASH_MAX_AGE_SECS: i64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Info,
    Warning,
    Error,
}

impl FlashKind {
    pub fn css_class(&self) -> &'static str {
        match self {
            Self::Success => "flash-success",
            Self::Info => "flash-info",
            Self::Warning => "flash-warning",
            Self::Error => "flash-error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    pub fn new(kind: FlashKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(FlashKind::Success, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(FlashKind::Info, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(FlashKind::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(FlashKind::Error, message)
    }

    /// Internal errors are logged and shown as a generic notice.
    pub fn from_error(err: &AppError) -> Self {
        match err {
            AppError::Internal { .. } => {
                tracing::error!(error = %err, "Request failed");
                Self::error("Something went wrong. Please try again.")
            }
            other => Self::error(other.message()),
        }
    }
}

/// Notices read from the incoming request.
#[derive(Debug, Clone, Default)]
pub struct Flashes(pub Vec<Flash>);

/// Redirects to `to`, showing `flash` on the next page.
pub fn redirect(st: &AppState, to: &str, flash: Flash) -> Response {
    redirect_with(st, to, vec![flash])
}

/// Redirects to `to`, showing every notice in `flashes` on the next page.
pub fn redirect_with(st: &AppState, to: &str, flashes: Vec<Flash>) -> Response {
    let mut response = Redirect::to(to).into_response();
    match serde_json::to_string(&flashes) {
        Ok(json) => append_cookie(
            &mut response,
            &build_cookie(
                FLASH_COOKIE,
                &st.signer.sign(&json),
                FLASH_MAX_AGE_SECS,
                st.secure_cookies,
            ),
        ),
        Err(e) => tracing::error!(error = %e, "Failed to encode flash messages"),
    }
    response
}

/// Maps a service error to a redirect with an error notice.
pub trait OrRedirect<T> {
    fn or_redirect(self, st: &AppState, to: &str) -> Result<T, Response>;
}

impl<T> OrRedirect<T> for Result<T, AppError> {
    fn or_redirect(self, st: &AppState, to: &str) -> Result<T, Response> {
        self.map_err(|e| redirect(st, to, Flash::from_error(&e)))
    }
}

fn decode(st: &AppState, raw: &str) -> Vec<Flash> {
    st.signer
        .verify(raw)
        .and_then(|json| serde_json::from_str(&json).ok())
        .unwrap_or_default()
}

/// Exposes pending notices to handlers and clears them once shown.
///
/// Redirect responses keep the cookie so the notice survives chained
/// redirects such as a login page bouncing to the dashboard.
pub async fn layer(State(st): State<AppState>, mut req: Request, next: Next) -> Response {
    let incoming = read_cookie(req.headers(), FLASH_COOKIE);
    let flashes = incoming
        .as_deref()
        .map(|raw| decode(&st, raw))
        .unwrap_or_default();
    req.extensions_mut().insert(Flashes(flashes));

    let mut response = next.run(req).await;

    if incoming.is_some()
        && !response.status().is_redirection()
        && !sets_cookie(&response, FLASH_COOKIE)
    {
        append_cookie(&mut response, &expired_cookie(FLASH_COOKIE));
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_error_hides_internal_details() {
        let flash = Flash::from_error(&AppError::internal("Database error", json!({})));
        assert_eq!(flash.kind, FlashKind::Error);
        assert_eq!(flash.message, "Something went wrong. Please try again.");

        let flash = Flash::from_error(&AppError::conflict("Book not available.", json!({})));
        assert_eq!(flash.message, "Book not available.");
    }

    #[test]
    fn test_flash_json_shape() {
        let json = serde_json::to_string(&vec![Flash::success("Done")]).unwrap();
        assert_eq!(json, r#"[{"kind":"success","message":"Done"}]"#);

        let back: Vec<Flash> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vec![Flash::success("Done")]);
    }
}

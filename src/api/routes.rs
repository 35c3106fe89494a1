//! JSON route configuration.
//!
//! Paths are absolute so the admin feed can sit behind the admin session
//! layer while search stays public.

use crate::api::handlers::{admin_stats_handler, search_books_handler};
use crate::state::AppState;
use axum::{Router, routing::get};

/// Routes open to everyone.
///
/// - `GET /api/books/search` - Catalog search for the live search page
pub fn public_routes() -> Router<AppState> {
    Router::new().route("/api/books/search", get(search_books_handler))
}

/// Routes requiring an admin session.
///
/// - `GET /api/admin/stats` - Library totals and monthly borrowings
pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/api/admin/stats", get(admin_stats_handler))
}

//! Top-level router combining the portals, the JSON API and static assets.
//!
//! # Route Structure
//!
//! - `GET  /health`             - Health check: DB, mail queue, predictor (public)
//! - `GET  /api/books/search`   - Catalog search JSON (public)
//! - `GET  /api/admin/stats`    - Library statistics JSON (admin session)
//! - student pages              - `library_session` cookie of a student
//! - admin pages                - `library_session` cookie of an admin
//! - `/static/*`                - Stylesheet and scripts
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Flash** - Loads notices from the flash cookie and clears them once shown
//! - **Rate limiting** - Per-IP token bucket, stricter on credential pages
//! - **Sessions** - Student, admin or super admin cookie session per group
//! - **Path normalization** - Trailing slash handling

use crate::api;
use crate::api::handlers::health_handler;
use crate::api::middleware::{rate_limit, tracing};
use crate::state::AppState;
use crate::web;
use crate::web::flash;
use crate::web::middleware::session;
use axum::routing::get;
use axum::{Router, middleware};
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::services::ServeDir;

/// Constructs the application router with all routes and middleware.
///
/// # Arguments
///
/// - `state` - shared application state injected into all handlers
/// - `behind_proxy` - when `true`, rate limiting reads client IP from
///   `X-Forwarded-For` / `X-Real-IP` headers instead of the peer socket address;
///   enable only when the service runs behind a trusted reverse proxy
pub fn app_router(state: AppState, behind_proxy: bool) -> NormalizePath<Router> {
    let public = web::routes::public_routes()
        .merge(api::routes::public_routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session::identify_layer,
        ))
        .layer(rate_limit::layer(behind_proxy));

    let credentials = web::routes::credential_routes()
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session::identify_layer,
        ))
        .layer(rate_limit::secure_layer(behind_proxy));

    let student = web::routes::student_routes()
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session::student_layer,
        ))
        .layer(rate_limit::layer(behind_proxy));

    let admin = web::routes::admin_routes()
        .merge(api::routes::admin_routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session::admin_layer,
        ))
        .layer(rate_limit::layer(behind_proxy));

    let super_admin = web::routes::super_admin_routes()
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session::super_admin_layer,
        ))
        .layer(rate_limit::secure_layer(behind_proxy));

    let router = Router::new()
        .route("/health", get(health_handler))
        .merge(public)
        .merge(credentials)
        .merge(student)
        .merge(admin)
        .merge(super_admin)
        .nest_service("/static", ServeDir::new("static"))
        .layer(middleware::from_fn_with_state(state.clone(), flash::layer))
        .with_state(state)
        .layer(tracing::layer());

    NormalizePathLayer::trim_trailing_slash().layer(router)
}

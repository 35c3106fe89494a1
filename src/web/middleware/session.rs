//! Cookie session middleware for the student and admin portals.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::domain::entities::Principal;
use crate::state::AppState;
use crate::web::cookies::{SESSION_COOKIE, read_cookie};
use crate::web::flash::{self, Flash};

/// Logged-in student, inserted by [`student_layer`].
#[derive(Debug, Clone)]
pub struct CurrentStudent {
    pub regno: String,
}

/// Logged-in admin, inserted by [`admin_layer`] and [`super_admin_layer`].
#[derive(Debug, Clone)]
pub struct CurrentAdmin {
    pub id: i64,
    pub email: String,
    pub is_super: bool,
}

/// Resolves the `library_session` cookie to its owner.
///
/// Lookup failures are logged and treated as logged out.
pub async fn principal(st: &AppState, headers: &HeaderMap) -> Option<Principal> {
    let token = read_cookie(headers, SESSION_COOKIE)?;
    match st.auth_service.resolve(&token).await {
        Ok(principal) => principal,
        Err(e) => {
            tracing::error!(error = %e, "Session lookup failed");
            None
        }
    }
}

/// Requires a student session, otherwise redirects to `/student_login`.
pub async fn student_layer(
    State(st): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    match principal(&st, req.headers()).await {
        Some(Principal::Student { regno }) => {
            req.extensions_mut().insert(CurrentStudent { regno });
            Ok(next.run(req).await)
        }
        _ => Err(flash::redirect(
            &st,
            "/student_login",
            Flash::error("Please log in first."),
        )),
    }
}

/// Requires an admin session, otherwise redirects to `/admin`.
pub async fn admin_layer(
    State(st): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    match principal(&st, req.headers()).await {
        Some(Principal::Admin { id, email }) => {
            let is_super = st.auth_service.is_super_admin(&email);
            req.extensions_mut().insert(CurrentAdmin {
                id,
                email,
                is_super,
            });
            Ok(next.run(req).await)
        }
        _ => Err(flash::redirect(
            &st,
            "/admin",
            Flash::error("Please log in as admin first."),
        )),
    }
}

/// Requires a super admin session. Regular admins go back to the panel.
pub async fn super_admin_layer(
    State(st): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    match principal(&st, req.headers()).await {
        Some(Principal::Admin { id, email }) if st.auth_service.is_super_admin(&email) => {
            req.extensions_mut().insert(CurrentAdmin {
                id,
                email,
                is_super: true,
            });
            Ok(next.run(req).await)
        }
        Some(Principal::Admin { .. }) => Err(flash::redirect(
            &st,
            "/admin_panel",
            Flash::error("Only super admins can do that."),
        )),
        _ => Err(flash::redirect(
            &st,
            "/admin",
            Flash::error("Please log in as admin first."),
        )),
    }
}

/// Attaches whoever is logged in, if anyone, without requiring a session.
///
/// Public pages use it so the navigation reflects the current login.
pub async fn identify_layer(State(st): State<AppState>, mut req: Request, next: Next) -> Response {
    match principal(&st, req.headers()).await {
        Some(Principal::Student { regno }) => {
            req.extensions_mut().insert(CurrentStudent { regno });
        }
        Some(Principal::Admin { id, email }) => {
            let is_super = st.auth_service.is_super_admin(&email);
            req.extensions_mut().insert(CurrentAdmin {
                id,
                email,
                is_super,
            });
        }
        None => {}
    }
    next.run(req).await
}

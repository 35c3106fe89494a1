//! Admin account management.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Extension, Form,
    extract::{Path, State},
    response::Response,
};
use validator::Validate;

use crate::error::AppError;
use crate::state::AppState;
use crate::web::cookies::{SESSION_COOKIE, append_cookie, expired_cookie};
use crate::web::flash::{self, Flash, OrRedirect};
use crate::web::forms::{AddAdminForm, UpdateAdminForm};
use crate::web::middleware::session::CurrentAdmin;
use crate::web::page::PageContext;

pub struct AdminRow {
    pub email: String,
    pub is_super: bool,
    pub is_self: bool,
    pub created: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "admin_management.html")]
pub struct AdminManagementTemplate {
    pub ctx: PageContext,
    pub admins: Vec<AdminRow>,
}

/// `GET /admin_management`
pub async fn admin_management_handler(
    State(st): State<AppState>,
    Extension(current): Extension<CurrentAdmin>,
    ctx: PageContext,
) -> Result<AdminManagementTemplate, Response> {
    let accounts = st
        .admin_service
        .admins()
        .await
        .or_redirect(&st, "/admin_panel")?;

    Ok(AdminManagementTemplate {
        ctx,
        admins: accounts
            .iter()
            .map(|a| AdminRow {
                email: a.admin.email.clone(),
                is_super: a.is_super,
                is_self: a.admin.id == current.id,
                created: a.admin.created_at.format("%Y-%m-%d").to_string(),
            })
            .collect(),
    })
}

/// `POST /add_admin_post`
pub async fn add_admin_handler(
    State(st): State<AppState>,
    Form(form): Form<AddAdminForm>,
) -> Result<Response, Response> {
    form.validate()
        .map_err(AppError::from)
        .or_redirect(&st, "/admin_management")?;

    let admin = st
        .admin_service
        .add_admin(&form.email, &form.password)
        .await
        .or_redirect(&st, "/admin_management")?;

    Ok(flash::redirect(
        &st,
        "/admin_management",
        Flash::success(format!("Admin {} added.", admin.email)),
    ))
}

/// `POST /delete_admin_post/{email}`
pub async fn delete_admin_handler(
    State(st): State<AppState>,
    Extension(current): Extension<CurrentAdmin>,
    Path(email): Path<String>,
) -> Result<Response, Response> {
    if email.eq_ignore_ascii_case(&current.email) {
        return Err(flash::redirect(
            &st,
            "/admin_management",
            Flash::error("You cannot delete your own account."),
        ));
    }

    st.admin_service
        .delete_admin(&email)
        .await
        .or_redirect(&st, "/admin_management")?;

    Ok(flash::redirect(
        &st,
        "/admin_management",
        Flash::success(format!("Admin {email} deleted.")),
    ))
}

/// `POST /update_admin`
///
/// Super admins only. All sessions of the account end, so the admin logs
/// in again with the new credentials.
pub async fn update_admin_handler(
    State(st): State<AppState>,
    Extension(current): Extension<CurrentAdmin>,
    Form(form): Form<UpdateAdminForm>,
) -> Result<Response, Response> {
    form.validate()
        .map_err(AppError::from)
        .or_redirect(&st, "/admin_management")?;

    let updated = st
        .admin_service
        .update_credentials(current.id, &form.new_email, &form.new_password)
        .await
        .or_redirect(&st, "/admin_management")?;

    let mut response = flash::redirect(
        &st,
        "/admin",
        Flash::success(format!(
            "Credentials updated. Please log in again as {}.",
            updated.email
        )),
    );
    append_cookie(&mut response, &expired_cookie(SESSION_COOKIE));
    Ok(response)
}

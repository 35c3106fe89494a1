//! Login, signup with email OTP, password reset and logout.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::HeaderMap,
    response::Response,
};
use chrono::Utc;
use validator::Validate;

use crate::application::services::password_reset_service::ResetRequestOutcome;
use crate::error::AppError;
use crate::state::AppState;
use crate::web::cookies::{
    SESSION_COOKIE, SIGNUP_COOKIE, append_cookie, build_cookie, expired_cookie, read_cookie,
};
use crate::web::flash::{self, Flash, OrRedirect};
use crate::web::forms::{
    AdminLoginForm, ForgotPasswordForm, OtpForm, ResetPasswordForm, SignupForm, StudentLoginForm,
};
use crate::web::page::PageContext;

/// The pending signup cookie outlives several resends.
const SIGNUP_COOKIE_MAX_AGE_SECS: i64 = 3600;

#[derive(Template, WebTemplate)]
#[template(path = "student_login.html")]
pub struct StudentLoginTemplate {
    pub ctx: PageContext,
}

#[derive(Template, WebTemplate)]
#[template(path = "admin.html")]
pub struct AdminLoginTemplate {
    pub ctx: PageContext,
}

#[derive(Template, WebTemplate)]
#[template(path = "student_signup.html")]
pub struct SignupTemplate {
    pub ctx: PageContext,
    pub email_domain: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "otp_verification.html")]
pub struct OtpTemplate {
    pub ctx: PageContext,
    pub email: String,
    pub seconds_left: i64,
    pub resend_wait_secs: i64,
}

#[derive(Template, WebTemplate)]
#[template(path = "forget_password.html")]
pub struct ForgetPasswordTemplate {
    pub ctx: PageContext,
}

#[derive(Template, WebTemplate)]
#[template(path = "reset_password.html")]
pub struct ResetPasswordTemplate {
    pub ctx: PageContext,
    pub token: String,
}

fn session_cookie(st: &AppState, token: &str) -> String {
    build_cookie(
        SESSION_COOKIE,
        token,
        st.session_ttl_hours * 3600,
        st.secure_cookies,
    )
}

/// `GET /student_login`
pub async fn student_login_handler(ctx: PageContext) -> StudentLoginTemplate {
    StudentLoginTemplate { ctx }
}

/// `POST /student_login`
///
/// On success sets the `library_session` cookie and opens the dashboard.
pub async fn student_login_submit_handler(
    State(st): State<AppState>,
    Form(form): Form<StudentLoginForm>,
) -> Result<Response, Response> {
    form.validate()
        .map_err(AppError::from)
        .or_redirect(&st, "/student_login")?;

    let token = st
        .auth_service
        .student_login(&form.regno, &form.password)
        .await
        .or_redirect(&st, "/student_login")?;

    let mut response = flash::redirect(&st, "/student_dashboard", Flash::success("Login successful!"));
    append_cookie(&mut response, &session_cookie(&st, &token));
    Ok(response)
}

/// `GET /admin`
pub async fn admin_login_handler(ctx: PageContext) -> AdminLoginTemplate {
    AdminLoginTemplate { ctx }
}

/// `POST /admin`
pub async fn admin_login_submit_handler(
    State(st): State<AppState>,
    Form(form): Form<AdminLoginForm>,
) -> Result<Response, Response> {
    form.validate()
        .map_err(AppError::from)
        .or_redirect(&st, "/admin")?;

    let token = st
        .auth_service
        .admin_login(&form.email, &form.password)
        .await
        .or_redirect(&st, "/admin")?;

    let mut response = flash::redirect(&st, "/admin_panel", Flash::success("Admin login successful!"));
    append_cookie(&mut response, &session_cookie(&st, &token));
    Ok(response)
}

/// `POST /logout`
///
/// Revokes the server-side session and drops the cookie.
pub async fn logout_handler(State(st): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = read_cookie(&headers, SESSION_COOKIE)
        && let Err(e) = st.auth_service.logout(&token).await
    {
        tracing::error!(error = %e, "Failed to revoke session");
    }

    let mut response = flash::redirect(&st, "/", Flash::info("You have been logged out."));
    append_cookie(&mut response, &expired_cookie(SESSION_COOKIE));
    response
}

/// `GET /student_signup`
pub async fn signup_handler(State(st): State<AppState>, ctx: PageContext) -> SignupTemplate {
    SignupTemplate {
        ctx,
        email_domain: st.signup_service.email_domain().to_string(),
    }
}

/// `POST /student_signup`
///
/// Mails an OTP and remembers the pending email in a signed cookie. An
/// already registered number is sent to the login page instead.
pub async fn signup_submit_handler(
    State(st): State<AppState>,
    Form(form): Form<SignupForm>,
) -> Result<Response, Response> {
    form.validate()
        .map_err(AppError::from)
        .or_redirect(&st, "/student_signup")?;

    let email = match st
        .signup_service
        .signup(&form.regno, &form.email, &form.password, Utc::now())
        .await
    {
        Ok(email) => email,
        Err(e @ AppError::Conflict { .. }) => {
            return Err(flash::redirect(&st, "/student_login", Flash::from_error(&e)));
        }
        Err(e) => return Err(flash::redirect(&st, "/student_signup", Flash::from_error(&e))),
    };

    let mut response = flash::redirect(
        &st,
        "/verify_otp",
        Flash::info(format!("An OTP has been sent to {email}.")),
    );
    append_cookie(
        &mut response,
        &build_cookie(
            SIGNUP_COOKIE,
            &st.signer.sign(&email),
            SIGNUP_COOKIE_MAX_AGE_SECS,
            st.secure_cookies,
        ),
    );
    Ok(response)
}

fn pending_email(st: &AppState, headers: &HeaderMap) -> Result<String, Response> {
    read_cookie(headers, SIGNUP_COOKIE)
        .and_then(|raw| st.signer.verify(&raw))
        .ok_or_else(|| {
            flash::redirect(
                st,
                "/student_signup",
                Flash::error("Please start the signup process again."),
            )
        })
}

/// `GET /verify_otp`
pub async fn verify_otp_handler(
    State(st): State<AppState>,
    headers: HeaderMap,
    ctx: PageContext,
) -> Result<OtpTemplate, Response> {
    let email = pending_email(&st, &headers)?;

    let status = st
        .signup_service
        .status(&email, Utc::now())
        .await
        .or_redirect(&st, "/student_signup")?
        .ok_or_else(|| {
            flash::redirect(
                &st,
                "/student_signup",
                Flash::error("No pending signup found. Please sign up again."),
            )
        })?;

    Ok(OtpTemplate {
        ctx,
        email,
        seconds_left: status.seconds_left,
        resend_wait_secs: status.resend_wait_secs,
    })
}

/// `POST /verify_otp`
///
/// `action=resend` requests a new code; anything else checks `otp`.
pub async fn verify_otp_submit_handler(
    State(st): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<OtpForm>,
) -> Result<Response, Response> {
    let email = pending_email(&st, &headers)?;

    if form.is_resend() {
        st.signup_service
            .resend_otp(&email, Utc::now())
            .await
            .or_redirect(&st, "/verify_otp")?;
        return Ok(flash::redirect(
            &st,
            "/verify_otp",
            Flash::info("A new OTP has been sent to your email."),
        ));
    }

    let student = st
        .signup_service
        .verify_otp(&email, &form.otp, Utc::now())
        .await
        .or_redirect(&st, "/verify_otp")?;

    let mut response = flash::redirect(
        &st,
        "/student_login",
        Flash::success(format!(
            "Signup successful for {}! Please log in.",
            student.regno
        )),
    );
    append_cookie(&mut response, &expired_cookie(SIGNUP_COOKIE));
    Ok(response)
}

/// `GET /forget_password`
pub async fn forget_password_handler(ctx: PageContext) -> ForgetPasswordTemplate {
    ForgetPasswordTemplate { ctx }
}

/// `POST /forget_password`
pub async fn forget_password_submit_handler(
    State(st): State<AppState>,
    Form(form): Form<ForgotPasswordForm>,
) -> Result<Response, Response> {
    form.validate()
        .map_err(AppError::from)
        .or_redirect(&st, "/forget_password")?;

    let outcome = st
        .reset_service
        .request_reset(&form.regno, Utc::now())
        .await
        .or_redirect(&st, "/forget_password")?;

    Ok(match outcome {
        ResetRequestOutcome::LinkSent => flash::redirect(
            &st,
            "/student_login",
            Flash::success("A password reset link has been sent to your registered email."),
        ),
        ResetRequestOutcome::AlreadyPending => flash::redirect(
            &st,
            "/student_login",
            Flash::info("A reset link was already sent. Please check your email."),
        ),
        ResetRequestOutcome::Expired => flash::redirect(
            &st,
            "/forget_password",
            Flash::warning("Your previous reset request expired. Please submit a new request."),
        ),
    })
}

/// `GET /reset_password/{token}`
pub async fn reset_password_handler(
    State(st): State<AppState>,
    Path(token): Path<String>,
    ctx: PageContext,
) -> Result<ResetPasswordTemplate, Response> {
    st.reset_service
        .validate_token(&token, Utc::now())
        .await
        .or_redirect(&st, "/forget_password")?;

    Ok(ResetPasswordTemplate { ctx, token })
}

/// `POST /reset_password/{token}`
pub async fn reset_password_submit_handler(
    State(st): State<AppState>,
    Path(token): Path<String>,
    Form(form): Form<ResetPasswordForm>,
) -> Result<Response, Response> {
    let back = format!("/reset_password/{token}");
    st.reset_service
        .reset_password(&token, &form.password, &form.confirm_password, Utc::now())
        .await
        .or_redirect(&st, &back)?;

    Ok(flash::redirect(
        &st,
        "/student_login",
        Flash::success("Your password has been reset. Please log in."),
    ))
}

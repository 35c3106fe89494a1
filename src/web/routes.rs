//! Portal route tables, grouped by the login they require.
//!
//! Session checks and rate limits are attached in [`crate::routes`].

use crate::state::AppState;
use crate::web::handlers::{
    admin, admin_accounts, admin_catalog, auth, circulation, fines, public, reader, student,
};
use axum::{
    Router,
    routing::{get, post},
};

/// Landing pages, open to everyone.
///
/// - `GET /` - Portal chooser
/// - `GET /student` - Student landing page
/// - `POST /logout` - Ends the current session
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(public::index_handler))
        .route("/student", get(public::student_portal_handler))
        .route("/logout", post(auth::logout_handler))
}

/// Login, signup and password recovery.
///
/// Kept apart so they can carry the stricter rate limit.
pub fn credential_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/student_login",
            get(auth::student_login_handler).post(auth::student_login_submit_handler),
        )
        .route(
            "/admin",
            get(auth::admin_login_handler).post(auth::admin_login_submit_handler),
        )
        .route(
            "/student_signup",
            get(auth::signup_handler).post(auth::signup_submit_handler),
        )
        .route(
            "/verify_otp",
            get(auth::verify_otp_handler).post(auth::verify_otp_submit_handler),
        )
        .route(
            "/forget_password",
            get(auth::forget_password_handler).post(auth::forget_password_submit_handler),
        )
        .route(
            "/reset_password/{token}",
            get(auth::reset_password_handler).post(auth::reset_password_submit_handler),
        )
}

/// Pages requiring a student session.
pub fn student_routes() -> Router<AppState> {
    Router::new()
        .route("/student_dashboard", get(student::dashboard_handler))
        .route("/borrowing_history", get(student::borrowing_history_handler))
        .route("/reading_analytics", get(student::reading_analytics_handler))
        .route("/my_recommendations", get(student::recommendations_handler))
        .route(
            "/rate_book/{loan_id}",
            get(student::rate_book_handler).post(student::rate_book_submit_handler),
        )
        .route("/check_books", get(circulation::check_books_handler))
        .route("/search_books", get(circulation::search_books_handler))
        .route(
            "/borrow_book/{id}",
            get(circulation::borrow_book_handler).post(circulation::borrow_book_submit_handler),
        )
        .route(
            "/reserve_book/{id}",
            get(circulation::reserve_book_handler).post(circulation::reserve_book_submit_handler),
        )
        .route("/my_reservations", get(circulation::my_reservations_handler))
        .route("/return", get(circulation::return_handler))
        .route(
            "/return_confirm/{loan_id}",
            post(circulation::return_confirm_handler),
        )
        .route("/wishlist", get(reader::wishlist_handler))
        .route("/add_to_wishlist/{id}", post(reader::add_to_wishlist_handler))
        .route(
            "/remove_from_wishlist/{id}",
            post(reader::remove_from_wishlist_handler),
        )
        .route("/social", get(reader::social_handler))
        .route("/follow/{regno}", post(reader::follow_handler))
        .route("/unfollow/{regno}", post(reader::unfollow_handler))
        .route("/my_fines", get(fines::my_fines_handler))
        .route(
            "/pay_fine/{id}",
            get(fines::pay_fine_handler).post(fines::pay_fine_submit_handler),
        )
}

/// Pages requiring an admin session.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin_panel", get(admin::admin_panel_handler))
        .route("/library_statistics", get(admin::library_statistics_handler))
        .route("/admin_password_resets", get(admin::password_resets_handler))
        .route(
            "/approve_password_reset/{regno}",
            post(admin::approve_password_reset_handler),
        )
        .route("/admin_reservations", get(admin::admin_reservations_handler))
        .route("/borrowed_books", get(admin::borrowed_books_handler))
        .route("/registered_students", get(admin::registered_students_handler))
        .route(
            "/delete_student_confirm/{regno}",
            get(admin::delete_student_handler).post(admin::delete_student_submit_handler),
        )
        .route("/view_record/{regno}", get(admin::view_record_handler))
        .route(
            "/edit_due/{loan_id}",
            get(admin::edit_due_handler).post(admin::edit_due_submit_handler),
        )
        .route("/send_reminders", post(admin::send_reminders_handler))
        .route("/admin_fines", get(fines::admin_fines_handler))
        .route("/all_books", get(admin_catalog::all_books_handler))
        .route(
            "/add_book",
            get(admin_catalog::add_book_handler).post(admin_catalog::add_book_submit_handler),
        )
        .route(
            "/update_copies/{id}",
            get(admin_catalog::update_copies_handler)
                .post(admin_catalog::update_copies_submit_handler),
        )
        .route(
            "/delete_book/{id}",
            get(admin_catalog::delete_book_handler).post(admin_catalog::delete_book_submit_handler),
        )
        .route(
            "/admin_management",
            get(admin_accounts::admin_management_handler),
        )
        .route("/add_admin_post", post(admin_accounts::add_admin_handler))
        .route(
            "/delete_admin_post/{email}",
            post(admin_accounts::delete_admin_handler),
        )
}

/// Pages requiring a super admin session.
///
/// - `POST /update_admin` - Change the super admin's own email and password
pub fn super_admin_routes() -> Router<AppState> {
    Router::new().route("/update_admin", post(admin_accounts::update_admin_handler))
}

#![allow(dead_code)]

use axum::routing::get;
use axum::{Router, middleware};
use chrono::NaiveDate;
use library_portal::api;
use library_portal::api::handlers::health_handler;
use library_portal::config::Config;
use library_portal::domain::mail::{MailMessage, Notifier};
use library_portal::domain::policy::LibraryPolicy;
use library_portal::infrastructure::predictor::DisabledPredictor;
use library_portal::state::AppState;
use library_portal::web;
use library_portal::web::flash;
use library_portal::web::middleware::session;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::mpsc;

pub const PASSWORD: &str = "correct-horse";
pub const SUPER_ADMIN: &str = "root@library.test";

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://localhost/test".to_string(),
        listen_addr: "127.0.0.1:0".to_string(),
        log_level: "debug".to_string(),
        log_format: "text".to_string(),
        behind_proxy: false,
        session_secret: "test-session-secret".to_string(),
        session_ttl_hours: 12,
        public_base_url: "http://localhost:3000".to_string(),
        student_email_domain: "@rgmcet.edu.in".to_string(),
        super_admin_emails: vec![SUPER_ADMIN.to_string()],
        super_admin_password: None,
        late_model_path: None,
        mail_queue_capacity: 100,
        bcrypt_cost: 4,
        policy: LibraryPolicy::default(),
        db_max_connections: 5,
        db_connect_timeout: 5,
        db_idle_timeout: 60,
        db_max_lifetime: 300,
    }
}

pub fn create_test_state(pool: PgPool) -> (AppState, mpsc::Receiver<MailMessage>) {
    let (tx, rx) = mpsc::channel(100);
    let state = AppState::new(
        &test_config(),
        Arc::new(pool),
        Notifier::new(tx),
        Arc::new(DisabledPredictor),
    );
    (state, rx)
}

/// The full router without rate limiting, which needs a peer address.
pub fn create_test_app(state: AppState) -> Router {
    let public = web::routes::public_routes()
        .merge(web::routes::credential_routes())
        .merge(api::routes::public_routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session::identify_layer,
        ));
    let student = web::routes::student_routes().route_layer(middleware::from_fn_with_state(
        state.clone(),
        session::student_layer,
    ));
    let admin = web::routes::admin_routes()
        .merge(api::routes::admin_routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session::admin_layer,
        ));
    let super_admin = web::routes::super_admin_routes().route_layer(
        middleware::from_fn_with_state(state.clone(), session::super_admin_layer),
    );

    Router::new()
        .route("/health", get(health_handler))
        .merge(public)
        .merge(student)
        .merge(admin)
        .merge(super_admin)
        .layer(middleware::from_fn_with_state(state.clone(), flash::layer))
        .with_state(state)
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub async fn create_test_student(pool: &PgPool, regno: &str) {
    let hash = bcrypt::hash(PASSWORD, 4).unwrap();
    sqlx::query("INSERT INTO students (regno, email, password_hash) VALUES ($1, $2, $3)")
        .bind(regno)
        .bind(format!("{}@rgmcet.edu.in", regno.to_lowercase()))
        .bind(hash)
        .execute(pool)
        .await
        .unwrap();
}

pub async fn create_test_admin(pool: &PgPool, email: &str) -> i64 {
    let hash = bcrypt::hash(PASSWORD, 4).unwrap();
    sqlx::query_scalar("INSERT INTO admins (email, password_hash) VALUES ($1, $2) RETURNING id")
        .bind(email)
        .bind(hash)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn create_test_book(pool: &PgPool, title: &str, author: &str, copies: i32) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO books (title, author, available_copies) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(title)
    .bind(author)
    .bind(copies)
    .fetch_one(pool)
    .await
    .unwrap()
}

/// Inserts an open loan directly, leaving the shelf count untouched.
pub async fn create_test_loan(
    pool: &PgPool,
    regno: &str,
    book_id: i64,
    borrow_date: NaiveDate,
    due_date: NaiveDate,
) -> i64 {
    sqlx::query_scalar(
        r#"
        INSERT INTO borrowed_books (regno, book_id, book_title, borrow_date, due_date)
        SELECT $1, id, title, $3, $4 FROM books WHERE id = $2
        RETURNING id
        "#,
    )
    .bind(regno)
    .bind(book_id)
    .bind(borrow_date)
    .bind(due_date)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn create_test_fine(pool: &PgPool, regno: &str, loan_id: i64, accrued_paise: i64) -> i64 {
    sqlx::query_scalar(
        r#"
        INSERT INTO fines (regno, loan_id, accrued_paise, due_date)
        SELECT $1, $2, $3, due_date FROM borrowed_books WHERE id = $2
        RETURNING id
        "#,
    )
    .bind(regno)
    .bind(loan_id)
    .bind(accrued_paise)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn available_copies(pool: &PgPool, book_id: i64) -> i32 {
    sqlx::query_scalar("SELECT available_copies FROM books WHERE id = $1")
        .bind(book_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

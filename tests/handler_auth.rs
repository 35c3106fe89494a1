mod common;

use axum::http::StatusCode;
use axum_test::TestServer;
use sqlx::PgPool;

fn server(pool: PgPool) -> (TestServer, tokio::sync::mpsc::Receiver<library_portal::domain::mail::MailMessage>) {
    let (state, rx) = common::create_test_state(pool);
    let server = TestServer::builder()
        .save_cookies()
        .build(common::create_test_app(state))
        .unwrap();
    (server, rx)
}

#[sqlx::test]
async fn test_login_page_renders(pool: PgPool) {
    let (server, _rx) = server(pool);

    let response = server.get("/student_login").await;

    response.assert_status_ok();
    assert!(response.text().contains("Student login"));
}

#[sqlx::test]
async fn test_protected_page_redirects_to_login(pool: PgPool) {
    let (server, _rx) = server(pool);

    let response = server.get("/student_dashboard").await;

    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(response.header("location"), "/student_login");
}

#[sqlx::test]
async fn test_wrong_password_redirects_back(pool: PgPool) {
    common::create_test_student(&pool, "21091A0501").await;
    let (server, _rx) = server(pool);

    let response = server
        .post("/student_login")
        .form(&[("regno", "21091A0501"), ("password", "wrong-password")])
        .await;

    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(response.header("location"), "/student_login");

    let dashboard = server.get("/student_dashboard").await;
    assert_eq!(dashboard.header("location"), "/student_login");
}

#[sqlx::test]
async fn test_login_opens_dashboard_and_logout_closes_it(pool: PgPool) {
    common::create_test_student(&pool, "21091A0501").await;
    let (server, _rx) = server(pool);

    let login = server
        .post("/student_login")
        .form(&[("regno", "21091A0501"), ("password", common::PASSWORD)])
        .await;
    login.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(login.header("location"), "/student_dashboard");

    let dashboard = server.get("/student_dashboard").await;
    dashboard.assert_status_ok();
    let html = dashboard.text();
    assert!(html.contains("Welcome, 21091A0501"));
    assert!(html.contains("Login successful!"));

    server.post("/logout").await.assert_status(StatusCode::SEE_OTHER);

    let after = server.get("/student_dashboard").await;
    assert_eq!(after.header("location"), "/student_login");
}

#[sqlx::test]
async fn test_student_session_cannot_open_admin_pages(pool: PgPool) {
    common::create_test_student(&pool, "21091A0501").await;
    let (server, _rx) = server(pool);
    server
        .post("/student_login")
        .form(&[("regno", "21091A0501"), ("password", common::PASSWORD)])
        .await;

    let response = server.get("/admin_panel").await;

    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(response.header("location"), "/admin");
}

#[sqlx::test]
async fn test_regular_admin_cannot_update_credentials(pool: PgPool) {
    common::create_test_admin(&pool, "desk@library.test").await;
    let (server, _rx) = server(pool);
    server
        .post("/admin")
        .form(&[("email", "desk@library.test"), ("password", common::PASSWORD)])
        .await;

    let response = server
        .post("/update_admin")
        .form(&[("new_email", "boss@library.test"), ("new_password", "new-password-1")])
        .await;

    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(response.header("location"), "/admin_panel");
}

#[sqlx::test]
async fn test_signup_with_otp(pool: PgPool) {
    let (server, mut rx) = server(pool.clone());

    let signup = server
        .post("/student_signup")
        .form(&[
            ("regno", "21091A0502"),
            ("email", "21091a0502@rgmcet.edu.in"),
            ("password", common::PASSWORD),
        ])
        .await;
    signup.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(signup.header("location"), "/verify_otp");

    let mail = rx.try_recv().unwrap();
    assert_eq!(mail.to, "21091a0502@rgmcet.edu.in");

    let code: String = sqlx::query_scalar("SELECT otp_code FROM otp_attempts WHERE email = $1")
        .bind("21091a0502@rgmcet.edu.in")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert!(mail.body.contains(&code));

    server.get("/verify_otp").await.assert_status_ok();

    let verify = server.post("/verify_otp").form(&[("otp", code.as_str())]).await;
    verify.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(verify.header("location"), "/student_login");

    let login = server
        .post("/student_login")
        .form(&[("regno", "21091A0502"), ("password", common::PASSWORD)])
        .await;
    assert_eq!(login.header("location"), "/student_dashboard");
}

#[sqlx::test]
async fn test_signup_rejects_foreign_domain(pool: PgPool) {
    let (server, mut rx) = server(pool);

    let response = server
        .post("/student_signup")
        .form(&[
            ("regno", "21091A0502"),
            ("email", "someone@gmail.com"),
            ("password", common::PASSWORD),
        ])
        .await;

    assert_eq!(response.header("location"), "/student_signup");
    assert!(rx.try_recv().is_err());
}

#[sqlx::test]
async fn test_password_reset_by_email_link(pool: PgPool) {
    common::create_test_student(&pool, "21091A0501").await;
    let (server, mut rx) = server(pool);

    let request = server
        .post("/forget_password")
        .form(&[("regno", "21091A0501")])
        .await;
    assert_eq!(request.header("location"), "/student_login");

    let mail = rx.try_recv().unwrap();
    let token = mail
        .body
        .split("/reset_password/")
        .nth(1)
        .and_then(|rest| rest.split_whitespace().next())
        .unwrap()
        .to_string();

    server
        .get(&format!("/reset_password/{token}"))
        .await
        .assert_status_ok();

    let reset = server
        .post(&format!("/reset_password/{token}"))
        .form(&[
            ("password", "brand-new-secret"),
            ("confirm_password", "brand-new-secret"),
        ])
        .await;
    assert_eq!(reset.header("location"), "/student_login");

    let login = server
        .post("/student_login")
        .form(&[("regno", "21091A0501"), ("password", "brand-new-secret")])
        .await;
    assert_eq!(login.header("location"), "/student_dashboard");
}

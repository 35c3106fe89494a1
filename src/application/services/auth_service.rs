//! Login sessions for students and admins.

use chrono::{Duration, Utc};
use serde_json::json;
use std::sync::Arc;

use crate::domain::entities::{Principal, SessionOwner};
use crate::domain::repositories::{AdminRepository, SessionRepository, StudentRepository};
use crate::error::AppError;
use crate::utils::password::PasswordHasher;
use crate::utils::tokens::{TokenSigner, generate_url_token};

/// Issues and resolves session tokens.
///
/// The browser holds a random token; only its HMAC-SHA256 hash (keyed by
/// `SESSION_SECRET`) is stored, so a database dump cannot be replayed as a
/// cookie.
pub struct AuthService {
    students: Arc<dyn StudentRepository>,
    admins: Arc<dyn AdminRepository>,
    sessions: Arc<dyn SessionRepository>,
    signer: TokenSigner,
    hasher: PasswordHasher,
    session_ttl: Duration,
    super_admins: Vec<String>,
}

impl AuthService {
    pub fn new(
        students: Arc<dyn StudentRepository>,
        admins: Arc<dyn AdminRepository>,
        sessions: Arc<dyn SessionRepository>,
        signer: TokenSigner,
        hasher: PasswordHasher,
        session_ttl_hours: i64,
        super_admins: Vec<String>,
    ) -> Self {
        Self {
            students,
            admins,
            sessions,
            signer,
            hasher,
            session_ttl: Duration::hours(session_ttl_hours),
            super_admins,
        }
    }

    fn invalid_credentials() -> AppError {
        AppError::unauthorized("Invalid credentials.", json!({}))
    }

    async fn open_session(&self, owner: SessionOwner) -> Result<String, AppError> {
        let token = generate_url_token();
        let expires_at = Utc::now() + self.session_ttl;

        self.sessions
            .create(&self.signer.hash_token(&token), owner, expires_at)
            .await?;

        Ok(token)
    }

    /// Checks a student's password and opens a session.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] for an unknown registration number,
    /// an account without a password or a wrong password.
    pub async fn student_login(&self, regno: &str, password: &str) -> Result<String, AppError> {
        let student = self
            .students
            .find(regno.trim())
            .await?
            .ok_or_else(Self::invalid_credentials)?;

        let Some(hash) = student.password_hash.as_deref() else {
            return Err(Self::invalid_credentials());
        };

        if !self.hasher.verify(password, hash).await {
            tracing::info!(regno = %student.regno, "Student login failed");
            return Err(Self::invalid_credentials());
        }

        tracing::info!(regno = %student.regno, "Student logged in");
        self.open_session(SessionOwner::Student(student.regno)).await
    }

    /// Checks an admin's password and opens a session.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] for an unknown email or a wrong password.
    pub async fn admin_login(&self, email: &str, password: &str) -> Result<String, AppError> {
        let admin = self
            .admins
            .find_by_email(email.trim())
            .await?
            .ok_or_else(Self::invalid_credentials)?;

        if !self.hasher.verify(password, &admin.password_hash).await {
            tracing::info!(email = %admin.email, "Admin login failed");
            return Err(Self::invalid_credentials());
        }

        tracing::info!(email = %admin.email, "Admin logged in");
        self.open_session(SessionOwner::Admin(admin.id)).await
    }

    /// Resolves a session cookie. Unknown and expired tokens yield `None`.
    pub async fn resolve(&self, token: &str) -> Result<Option<Principal>, AppError> {
        self.sessions.resolve(&self.signer.hash_token(token)).await
    }

    pub async fn logout(&self, token: &str) -> Result<(), AppError> {
        self.sessions.delete(&self.signer.hash_token(token)).await
    }

    pub fn is_super_admin(&self, email: &str) -> bool {
        self.super_admins
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(email))
    }

    pub async fn purge_expired(&self) -> Result<u64, AppError> {
        let removed = self.sessions.purge_expired().await?;
        if removed > 0 {
            tracing::debug!(removed, "Expired sessions purged");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Admin, Student};
    use crate::domain::repositories::{
        MockAdminRepository, MockSessionRepository, MockStudentRepository,
    };

    const SECRET: &str = "test-signing-secret";

    fn service(
        students: MockStudentRepository,
        admins: MockAdminRepository,
        sessions: MockSessionRepository,
    ) -> AuthService {
        AuthService::new(
            Arc::new(students),
            Arc::new(admins),
            Arc::new(sessions),
            TokenSigner::new(SECRET),
            PasswordHasher::new(4),
            12,
            vec!["root@library.test".to_string()],
        )
    }

    fn hashed(password: &str) -> String {
        bcrypt::hash(password, 4).unwrap()
    }

    #[tokio::test]
    async fn test_student_login_creates_hashed_session() {
        let mut students = MockStudentRepository::new();
        let hash = hashed("password123");
        students.expect_find().returning(move |regno| {
            Ok(Some(Student::new(
                regno.to_string(),
                "r1@rgmcet.edu.in".into(),
                Some(hash.clone()),
            )))
        });

        let mut sessions = MockSessionRepository::new();
        sessions
            .expect_create()
            .withf(|hash, owner, _| {
                hash.len() == 64 && *owner == SessionOwner::Student("R1".to_string())
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let service = service(students, MockAdminRepository::new(), sessions);
        let token = service.student_login(" R1 ", "password123").await.unwrap();

        assert_eq!(token.len(), 43);
    }

    #[tokio::test]
    async fn test_student_login_wrong_password() {
        let mut students = MockStudentRepository::new();
        let hash = hashed("password123");
        students.expect_find().returning(move |regno| {
            Ok(Some(Student::new(
                regno.to_string(),
                "r1@rgmcet.edu.in".into(),
                Some(hash.clone()),
            )))
        });

        let mut sessions = MockSessionRepository::new();
        sessions.expect_create().never();

        let service = service(students, MockAdminRepository::new(), sessions);
        let result = service.student_login("R1", "nope").await;

        assert!(matches!(result, Err(AppError::Unauthorized { .. })));
    }

    #[tokio::test]
    async fn test_student_without_password_cannot_log_in() {
        let mut students = MockStudentRepository::new();
        students.expect_find().returning(|regno| {
            Ok(Some(Student::new(
                regno.to_string(),
                "r1@rgmcet.edu.in".into(),
                None,
            )))
        });

        let service = service(
            students,
            MockAdminRepository::new(),
            MockSessionRepository::new(),
        );
        let result = service.student_login("R1", "anything").await;

        assert!(matches!(result, Err(AppError::Unauthorized { .. })));
    }

    #[tokio::test]
    async fn test_admin_login_unknown_email() {
        let mut admins = MockAdminRepository::new();
        admins.expect_find_by_email().returning(|_| Ok(None));

        let service = service(
            MockStudentRepository::new(),
            admins,
            MockSessionRepository::new(),
        );
        let result = service.admin_login("ghost@library.test", "x").await;

        assert!(matches!(result, Err(AppError::Unauthorized { .. })));
    }

    #[tokio::test]
    async fn test_admin_login_success() {
        let mut admins = MockAdminRepository::new();
        let hash = hashed("adminpass");
        admins
            .expect_find_by_email()
            .returning(move |email| Ok(Some(Admin::new(7, email.to_string(), hash.clone()))));

        let mut sessions = MockSessionRepository::new();
        sessions
            .expect_create()
            .withf(|_, owner, _| *owner == SessionOwner::Admin(7))
            .times(1)
            .returning(|_, _, _| Ok(()));

        let service = service(MockStudentRepository::new(), admins, sessions);
        assert!(service.admin_login("a@library.test", "adminpass").await.is_ok());
    }

    #[tokio::test]
    async fn test_resolve_looks_up_token_hash() {
        let expected = TokenSigner::new(SECRET).hash_token("raw-token");

        let mut sessions = MockSessionRepository::new();
        sessions
            .expect_resolve()
            .withf(move |hash| hash == &expected)
            .times(1)
            .returning(|_| {
                Ok(Some(Principal::Student {
                    regno: "R1".into(),
                }))
            });

        let service = service(
            MockStudentRepository::new(),
            MockAdminRepository::new(),
            sessions,
        );
        let principal = service.resolve("raw-token").await.unwrap();

        assert_eq!(
            principal,
            Some(Principal::Student {
                regno: "R1".into()
            })
        );
    }

    #[test]
    fn test_super_admin_match_ignores_case() {
        let service = service(
            MockStudentRepository::new(),
            MockAdminRepository::new(),
            MockSessionRepository::new(),
        );

        assert!(service.is_super_admin("ROOT@library.test"));
        assert!(!service.is_super_admin("other@library.test"));
    }
}

//! Student self-registration with an emailed one-time code.

use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use std::sync::Arc;

use crate::domain::entities::account::{
    MIN_PASSWORD_LEN, OTP_ATTEMPTS_PER_HOUR, OTP_VALIDITY_MINUTES,
};
use crate::domain::entities::{NewOtpAttempt, NewStudent, OtpAttempt, Student};
use crate::domain::mail::{MailMessage, Notifier};
use crate::domain::repositories::{OtpRepository, StudentRepository};
use crate::error::AppError;
use crate::utils::password::PasswordHasher;
use crate::utils::tokens::generate_otp;

/// Countdowns shown on the verification page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OtpStatus {
    pub seconds_left: i64,
    pub resend_wait_secs: i64,
}

/// Runs signup, OTP verification and resending.
///
/// A signup does not create the student. The registration number and the
/// password hash wait in the OTP attempt until the code is confirmed.
pub struct SignupService {
    students: Arc<dyn StudentRepository>,
    otps: Arc<dyn OtpRepository>,
    hasher: PasswordHasher,
    notifier: Notifier,
    email_domain: String,
}

impl SignupService {
    pub fn new(
        students: Arc<dyn StudentRepository>,
        otps: Arc<dyn OtpRepository>,
        hasher: PasswordHasher,
        notifier: Notifier,
        email_domain: String,
    ) -> Self {
        Self {
            students,
            otps,
            hasher,
            notifier,
            email_domain: email_domain.to_lowercase(),
        }
    }

    /// Required suffix of student emails, e.g. `@rgmcet.edu.in`.
    pub fn email_domain(&self) -> &str {
        &self.email_domain
    }

    async fn check_hourly_limit(&self, email: &str, now: DateTime<Utc>) -> Result<(), AppError> {
        let recent = self.otps.count_since(email, now - Duration::hours(1)).await?;
        if recent >= OTP_ATTEMPTS_PER_HOUR {
            return Err(AppError::bad_request(
                "Too many OTP requests. Please try again in an hour.",
                json!({ "limit": OTP_ATTEMPTS_PER_HOUR }),
            ));
        }
        Ok(())
    }

    fn send_code(&self, email: &str, code: &str) {
        if !self.notifier.send(MailMessage::otp(email, code)) {
            tracing::warn!(email, "OTP mail could not be queued");
        }
    }

    /// Starts a signup and mails a code. Returns the normalized email.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] for a short password, an email outside the
    ///   student domain or too many codes in the last hour
    /// - [`AppError::Conflict`] if the registration number is already registered
    pub async fn signup(
        &self,
        regno: &str,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<String, AppError> {
        let regno = regno.trim();
        let email = email.trim().to_lowercase();

        if regno.is_empty() {
            return Err(AppError::bad_request(
                "Registration number is required.",
                json!({}),
            ));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::bad_request(
                format!("Password must be at least {MIN_PASSWORD_LEN} characters long."),
                json!({}),
            ));
        }
        if !email.ends_with(&self.email_domain) || email.len() == self.email_domain.len() {
            return Err(AppError::bad_request(
                format!("Please use your college email ending with {}.", self.email_domain),
                json!({ "email": email }),
            ));
        }
        if self.students.find(regno).await?.is_some() {
            return Err(AppError::conflict(
                "Registration number already exists. Please log in.",
                json!({ "regno": regno }),
            ));
        }

        self.check_hourly_limit(&email, now).await?;

        let code = generate_otp();
        let password_hash = self.hasher.hash(password).await?;
        self.otps
            .create(NewOtpAttempt {
                email: email.clone(),
                regno: regno.to_string(),
                password_hash,
                otp_code: code.clone(),
                resend_count: 0,
            })
            .await?;

        self.send_code(&email, &code);
        tracing::info!(regno, email = %email, "Signup started, OTP sent");

        Ok(email)
    }

    async fn pending_attempt(&self, email: &str) -> Result<OtpAttempt, AppError> {
        self.otps
            .latest(email)
            .await?
            .filter(|attempt| !attempt.is_consumed())
            .ok_or_else(|| {
                AppError::bad_request(
                    "No pending signup found. Please sign up again.",
                    json!({ "email": email }),
                )
            })
    }

    /// Confirms the latest code and creates the student.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] when there is no pending signup, the
    /// code has expired or does not match, and [`AppError::Conflict`] when
    /// the registration number was taken in the meantime.
    pub async fn verify_otp(
        &self,
        email: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Student, AppError> {
        let attempt = self.pending_attempt(email).await?;

        if attempt.is_expired(now) {
            return Err(AppError::bad_request(
                format!("OTP expired. Codes are valid for {OTP_VALIDITY_MINUTES} minutes, please request a new one."),
                json!({}),
            ));
        }
        if attempt.otp_code != code.trim() {
            return Err(AppError::bad_request("Invalid OTP.", json!({})));
        }

        let student = self
            .students
            .create_from_signup(
                attempt.id,
                NewStudent {
                    regno: attempt.regno,
                    email: attempt.email,
                    password_hash: attempt.password_hash,
                },
            )
            .await?;

        tracing::info!(regno = %student.regno, "Student registered");
        Ok(student)
    }

    /// Sends a fresh code for the pending signup.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] when there is no pending signup, the
    /// hourly limit is reached or the cooldown has not passed.
    pub async fn resend_otp(&self, email: &str, now: DateTime<Utc>) -> Result<(), AppError> {
        let attempt = self.pending_attempt(email).await?;

        self.check_hourly_limit(email, now).await?;

        let wait = attempt.resend_wait_secs(now);
        if wait > 0 {
            return Err(AppError::bad_request(
                format!("Please wait {wait} seconds before requesting a new OTP."),
                json!({ "wait_secs": wait }),
            ));
        }

        let code = generate_otp();
        self.otps
            .create(NewOtpAttempt {
                email: attempt.email.clone(),
                regno: attempt.regno.clone(),
                password_hash: attempt.password_hash.clone(),
                otp_code: code.clone(),
                resend_count: attempt.resend_count + 1,
            })
            .await?;

        self.send_code(&attempt.email, &code);
        tracing::info!(email, resend_count = attempt.resend_count + 1, "OTP resent");

        Ok(())
    }

    /// Countdowns for the pending signup, if there is one.
    pub async fn status(&self, email: &str, now: DateTime<Utc>) -> Result<Option<OtpStatus>, AppError> {
        let attempt = self.otps.latest(email).await?;

        Ok(attempt
            .filter(|attempt| !attempt.is_consumed())
            .map(|attempt| OtpStatus {
                seconds_left: attempt.seconds_left(now),
                resend_wait_secs: attempt.resend_wait_secs(now),
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::{MockOtpRepository, MockStudentRepository};
    use tokio::sync::mpsc;

    const DOMAIN: &str = "@rgmcet.edu.in";

    fn attempt(created_at: DateTime<Utc>, code: &str) -> OtpAttempt {
        OtpAttempt {
            id: 5,
            email: "r1@rgmcet.edu.in".into(),
            regno: "R1".into(),
            password_hash: "hash".into(),
            otp_code: code.into(),
            created_at,
            resend_count: 0,
            consumed_at: None,
        }
    }

    fn service(
        students: MockStudentRepository,
        otps: MockOtpRepository,
    ) -> (SignupService, mpsc::Receiver<MailMessage>) {
        let (tx, rx) = mpsc::channel(8);
        let service = SignupService::new(
            Arc::new(students),
            Arc::new(otps),
            PasswordHasher::new(4),
            Notifier::new(tx),
            DOMAIN.to_string(),
        );
        (service, rx)
    }

    #[tokio::test]
    async fn test_signup_sends_code() {
        let mut students = MockStudentRepository::new();
        students.expect_find().returning(|_| Ok(None));

        let mut otps = MockOtpRepository::new();
        otps.expect_count_since().returning(|_, _| Ok(0));
        otps.expect_create()
            .withf(|a| a.regno == "R1" && a.email == "r1@rgmcet.edu.in" && a.otp_code.len() == 6)
            .times(1)
            .returning(|a| {
                Ok(OtpAttempt {
                    id: 1,
                    email: a.email,
                    regno: a.regno,
                    password_hash: a.password_hash,
                    otp_code: a.otp_code,
                    created_at: Utc::now(),
                    resend_count: a.resend_count,
                    consumed_at: None,
                })
            });

        let (service, mut rx) = service(students, otps);
        let email = service
            .signup("R1", "R1@RGMCET.edu.in", "password123", Utc::now())
            .await
            .unwrap();

        assert_eq!(email, "r1@rgmcet.edu.in");
        let mail = rx.try_recv().unwrap();
        assert_eq!(mail.to, "r1@rgmcet.edu.in");
    }

    #[tokio::test]
    async fn test_signup_rejects_foreign_domain() {
        let (service, _rx) = service(MockStudentRepository::new(), MockOtpRepository::new());
        let result = service
            .signup("R1", "r1@gmail.com", "password123", Utc::now())
            .await;

        assert!(matches!(result, Err(AppError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_signup_rejects_short_password() {
        let (service, _rx) = service(MockStudentRepository::new(), MockOtpRepository::new());
        let result = service
            .signup("R1", "r1@rgmcet.edu.in", "short", Utc::now())
            .await;

        assert!(matches!(result, Err(AppError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_signup_existing_regno_is_conflict() {
        let mut students = MockStudentRepository::new();
        students.expect_find().returning(|regno| {
            Ok(Some(Student::new(regno.to_string(), "x@rgmcet.edu.in".into(), None)))
        });

        let (service, _rx) = service(students, MockOtpRepository::new());
        let result = service
            .signup("R1", "r1@rgmcet.edu.in", "password123", Utc::now())
            .await;

        assert!(matches!(result, Err(AppError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_signup_hourly_limit() {
        let mut students = MockStudentRepository::new();
        students.expect_find().returning(|_| Ok(None));
        let mut otps = MockOtpRepository::new();
        otps.expect_count_since().returning(|_, _| Ok(3));
        otps.expect_create().never();

        let (service, _rx) = service(students, otps);
        let result = service
            .signup("R1", "r1@rgmcet.edu.in", "password123", Utc::now())
            .await;

        assert!(matches!(result, Err(AppError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_verify_otp_creates_student() {
        let now = Utc::now();
        let mut otps = MockOtpRepository::new();
        otps.expect_latest()
            .returning(move |_| Ok(Some(attempt(now - Duration::minutes(2), "123456"))));

        let mut students = MockStudentRepository::new();
        students
            .expect_create_from_signup()
            .withf(|id, s| *id == 5 && s.regno == "R1" && s.password_hash == "hash")
            .times(1)
            .returning(|_, s| Ok(Student::new(s.regno, s.email, Some(s.password_hash))));

        let (service, _rx) = service(students, otps);
        let student = service
            .verify_otp("r1@rgmcet.edu.in", " 123456 ", now)
            .await
            .unwrap();

        assert_eq!(student.regno, "R1");
    }

    #[tokio::test]
    async fn test_verify_otp_reports_taken_regno() {
        let now = Utc::now();
        let mut otps = MockOtpRepository::new();
        otps.expect_latest()
            .returning(move |_| Ok(Some(attempt(now, "123456"))));

        let mut students = MockStudentRepository::new();
        students
            .expect_create_from_signup()
            .times(1)
            .returning(|_, s| {
                Err(AppError::conflict(
                    "Registration number already exists. Please log in.",
                    json!({ "regno": s.regno }),
                ))
            });

        let (service, _rx) = service(students, otps);
        let result = service.verify_otp("r1@rgmcet.edu.in", "123456", now).await;

        assert!(matches!(result, Err(AppError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_verify_otp_expired() {
        let now = Utc::now();
        let mut otps = MockOtpRepository::new();
        otps.expect_latest()
            .returning(move |_| Ok(Some(attempt(now - Duration::minutes(11), "123456"))));

        let mut students = MockStudentRepository::new();
        students.expect_create_from_signup().never();

        let (service, _rx) = service(students, otps);
        let result = service.verify_otp("r1@rgmcet.edu.in", "123456", now).await;

        assert!(matches!(result, Err(AppError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_verify_otp_wrong_code() {
        let now = Utc::now();
        let mut otps = MockOtpRepository::new();
        otps.expect_latest()
            .returning(move |_| Ok(Some(attempt(now, "123456"))));

        let (service, _rx) = service(MockStudentRepository::new(), otps);
        let result = service.verify_otp("r1@rgmcet.edu.in", "654321", now).await;

        assert_eq!(result.unwrap_err().message(), "Invalid OTP.");
    }

    #[tokio::test]
    async fn test_resend_respects_cooldown() {
        let now = Utc::now();
        let mut otps = MockOtpRepository::new();
        otps.expect_latest()
            .returning(move |_| Ok(Some(attempt(now - Duration::seconds(30), "123456"))));
        otps.expect_count_since().returning(|_, _| Ok(1));
        otps.expect_create().never();

        let (service, _rx) = service(MockStudentRepository::new(), otps);
        let err = service
            .resend_otp("r1@rgmcet.edu.in", now)
            .await
            .unwrap_err();

        assert_eq!(
            err.message(),
            "Please wait 90 seconds before requesting a new OTP."
        );
    }

    #[tokio::test]
    async fn test_resend_increments_count() {
        let now = Utc::now();
        let mut otps = MockOtpRepository::new();
        otps.expect_latest()
            .returning(move |_| Ok(Some(attempt(now - Duration::minutes(3), "123456"))));
        otps.expect_count_since().returning(|_, _| Ok(1));
        otps.expect_create()
            .withf(|a| a.resend_count == 1 && a.regno == "R1")
            .times(1)
            .returning(move |a| {
                let mut next = attempt(now, &a.otp_code);
                next.resend_count = a.resend_count;
                Ok(next)
            });

        let (service, mut rx) = service(MockStudentRepository::new(), otps);
        service.resend_otp("r1@rgmcet.edu.in", now).await.unwrap();

        assert!(rx.try_recv().is_ok());
    }
}

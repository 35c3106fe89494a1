//! Account entities: students, admins, login sessions, signup OTPs and
//! password reset requests.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// OTP codes are accepted for this long after they are issued.
pub const OTP_VALIDITY_MINUTES: i64 = 10;
/// Maximum OTP attempts per email within one hour.
pub const OTP_ATTEMPTS_PER_HOUR: i64 = 3;
/// Minimum delay between two OTP emails.
pub const OTP_RESEND_COOLDOWN_SECS: i64 = 120;
/// Lifetime of an emailed password reset link.
pub const RESET_TOKEN_VALIDITY_HOURS: i64 = 1;
/// Minimum password length for students and admins.
pub const MIN_PASSWORD_LEN: usize = 8;

/// A registered student, keyed by registration number.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Student {
    pub regno: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Student {
    pub fn new(regno: String, email: String, password_hash: Option<String>) -> Self {
        Self {
            regno,
            email,
            password_hash,
            created_at: Utc::now(),
        }
    }
}

/// Input data for registering a student.
#[derive(Debug, Clone)]
pub struct NewStudent {
    pub regno: String,
    pub email: String,
    pub password_hash: String,
}

/// A library administrator.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Admin {
    pub id: i64,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl Admin {
    pub fn new(id: i64, email: String, password_hash: String) -> Self {
        Self {
            id,
            email,
            password_hash,
            created_at: Utc::now(),
        }
    }
}

/// Who a login session belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOwner {
    Student(String),
    Admin(i64),
}

/// An authenticated caller, resolved from a session cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    Student { regno: String },
    Admin { id: i64, email: String },
}

/// A pending signup waiting for its emailed one-time code.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct OtpAttempt {
    pub id: i64,
    pub email: String,
    pub regno: String,
    pub password_hash: String,
    pub otp_code: String,
    pub created_at: DateTime<Utc>,
    pub resend_count: i32,
    pub consumed_at: Option<DateTime<Utc>>,
}

impl OtpAttempt {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at > Duration::minutes(OTP_VALIDITY_MINUTES)
    }

    pub fn is_consumed(&self) -> bool {
        self.consumed_at.is_some()
    }

    /// Seconds until another code may be sent, zero when resending is allowed.
    pub fn resend_wait_secs(&self, now: DateTime<Utc>) -> i64 {
        let elapsed = (now - self.created_at).num_seconds();
        (OTP_RESEND_COOLDOWN_SECS - elapsed).max(0)
    }

    /// Seconds until the code expires, zero once it has.
    pub fn seconds_left(&self, now: DateTime<Utc>) -> i64 {
        let expires = self.created_at + Duration::minutes(OTP_VALIDITY_MINUTES);
        (expires - now).num_seconds().max(0)
    }
}

/// Input data for a new OTP attempt.
#[derive(Debug, Clone)]
pub struct NewOtpAttempt {
    pub email: String,
    pub regno: String,
    pub password_hash: String,
    pub otp_code: String,
    pub resend_count: i32,
}

/// Lifecycle of a password reset request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResetStatus {
    Pending,
    Completed,
    Approved,
}

impl ResetStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Approved => "approved",
        }
    }
}

impl TryFrom<String> for ResetStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "approved" => Ok(Self::Approved),
            other => Err(format!("unknown reset status '{other}'")),
        }
    }
}

/// A student's request to reset a forgotten password.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct PasswordResetRequest {
    pub id: i64,
    pub regno: String,
    #[sqlx(try_from = "String")]
    pub status: ResetStatus,
    pub token_hash: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl PasswordResetRequest {
    /// A request without an expiry never expires; admins can still approve it.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|e| now >= e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attempt(created_at: DateTime<Utc>) -> OtpAttempt {
        OtpAttempt {
            id: 1,
            email: "21091a0501@rgmcet.edu.in".into(),
            regno: "21091A0501".into(),
            password_hash: "hash".into(),
            otp_code: "123456".into(),
            created_at,
            resend_count: 0,
            consumed_at: None,
        }
    }

    #[test]
    fn test_otp_expiry() {
        let now = Utc::now();
        assert!(!attempt(now - Duration::minutes(9)).is_expired(now));
        assert!(attempt(now - Duration::minutes(11)).is_expired(now));
    }

    #[test]
    fn test_resend_cooldown() {
        let now = Utc::now();
        assert_eq!(attempt(now - Duration::seconds(30)).resend_wait_secs(now), 90);
        assert_eq!(attempt(now - Duration::seconds(200)).resend_wait_secs(now), 0);
    }

    #[test]
    fn test_seconds_left_floors_at_zero() {
        let now = Utc::now();
        assert_eq!(attempt(now - Duration::minutes(20)).seconds_left(now), 0);
        assert_eq!(attempt(now).seconds_left(now), OTP_VALIDITY_MINUTES * 60);
    }

    #[test]
    fn test_reset_status_parsing() {
        assert_eq!(
            ResetStatus::try_from("approved".to_string()),
            Ok(ResetStatus::Approved)
        );
        assert!(ResetStatus::try_from("bogus".to_string()).is_err());
    }

    #[test]
    fn test_reset_request_expiry() {
        let now = Utc::now();
        let mut request = PasswordResetRequest {
            id: 1,
            regno: "R1".into(),
            status: ResetStatus::Pending,
            token_hash: Some("h".into()),
            expires_at: Some(now + Duration::hours(1)),
            created_at: now,
        };
        assert!(!request.is_expired(now));
        request.expires_at = Some(now - Duration::seconds(1));
        assert!(request.is_expired(now));
        request.expires_at = None;
        assert!(!request.is_expired(now));
    }
}

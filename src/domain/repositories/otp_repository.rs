//! Repository trait for signup OTP attempts.

use crate::domain::entities::{NewOtpAttempt, OtpAttempt};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OtpRepository: Send + Sync {
    async fn create(&self, attempt: NewOtpAttempt) -> Result<OtpAttempt, AppError>;

    /// Number of attempts for `email` created at or after `since`.
    async fn count_since(&self, email: &str, since: DateTime<Utc>) -> Result<i64, AppError>;

    /// Most recent attempt for `email`, consumed or not.
    async fn latest(&self, email: &str) -> Result<Option<OtpAttempt>, AppError>;
}

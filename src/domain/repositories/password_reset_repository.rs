//! Repository trait for password reset requests.

use crate::domain::entities::{PasswordResetRequest, ResetStatus};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PasswordResetRepository: Send + Sync {
    async fn create(
        &self,
        regno: &str,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<PasswordResetRequest, AppError>;

    async fn find_pending_by_regno(
        &self,
        regno: &str,
    ) -> Result<Option<PasswordResetRequest>, AppError>;

    async fn find_pending_by_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<PasswordResetRequest>, AppError>;

    /// Pending requests, oldest first.
    async fn list_pending(&self) -> Result<Vec<PasswordResetRequest>, AppError>;

    async fn delete(&self, id: i64) -> Result<(), AppError>;

    /// Moves a pending request to `status` and sets the student's new
    /// password hash in one transaction. The token is cleared.
    async fn close_with_password(
        &self,
        id: i64,
        status: ResetStatus,
        password_hash: &str,
    ) -> Result<(), AppError>;
}

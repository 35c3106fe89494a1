//! Repository trait for administrator accounts.

use crate::domain::entities::Admin;
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for admins. Emails are stored lowercased.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AdminRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the email is taken.
    async fn create(&self, email: &str, password_hash: &str) -> Result<Admin, AppError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Admin>, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Admin>, AppError>;

    async fn list(&self) -> Result<Vec<Admin>, AppError>;

    /// Returns `false` if no admin had that email.
    async fn delete_by_email(&self, email: &str) -> Result<bool, AppError>;

    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the new email is taken and
    /// [`AppError::NotFound`] if the admin does not exist.
    async fn update_credentials(
        &self,
        id: i64,
        email: &str,
        password_hash: &str,
    ) -> Result<Admin, AppError>;
}

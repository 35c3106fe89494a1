//! Repository trait for student accounts.

use crate::domain::entities::{NewStudent, Student};
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for students.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgStudentRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StudentRepository: Send + Sync {
    /// Registers a student and consumes the signup attempt `otp_id` in one
    /// transaction.
    ///
    /// The attempt stays consumed when the registration number turns out
    /// to be taken.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] if the attempt was already consumed
    /// - [`AppError::Conflict`] if the registration number is taken
    async fn create_from_signup(
        &self,
        otp_id: i64,
        new_student: NewStudent,
    ) -> Result<Student, AppError>;

    async fn find(&self, regno: &str) -> Result<Option<Student>, AppError>;

    /// All students ordered by registration number.
    async fn list(&self) -> Result<Vec<Student>, AppError>;

    async fn count(&self) -> Result<i64, AppError>;

    async fn update_password(&self, regno: &str, password_hash: &str) -> Result<(), AppError>;

    /// Deletes a student with all of their records.
    ///
    /// Copies of books still on loan go back on the shelf in the same
    /// transaction. Returns the number of copies restored.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the student does not exist.
    async fn delete_with_loans(&self, regno: &str) -> Result<u64, AppError>;
}

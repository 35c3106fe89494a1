//! Repository trait for fines and fine payments.

use crate::domain::entities::{Fine, FineDetail, FinePayment, NewPayment, PaymentRecord};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Repository interface for fines.
///
/// The accrued amount of a fine only ever grows and the paid amount never
/// exceeds it; implementations keep both in one row so a payment and a
/// later accrual never overwrite each other.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgFineRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FineRepository: Send + Sync {
    async fn find(&self, id: i64) -> Result<Option<Fine>, AppError>;

    /// The non-waived fine of a loan, if any.
    async fn find_for_loan(&self, loan_id: i64) -> Result<Option<Fine>, AppError>;

    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the loan already has a non-waived fine.
    async fn create(
        &self,
        regno: &str,
        loan_id: i64,
        accrued_paise: i64,
        due_date: NaiveDate,
    ) -> Result<Fine, AppError>;

    /// Raises the accrued amount to `accrued_paise` if that is higher, and
    /// reopens the fine if money is owed again.
    async fn raise_accrued(&self, id: i64, accrued_paise: i64) -> Result<Fine, AppError>;

    /// Marks active fines with nothing outstanding as paid.
    async fn settle_cleared(&self, regno: &str) -> Result<u64, AppError>;

    /// Sum of outstanding amounts over the student's active fines.
    async fn outstanding_total(&self, regno: &str) -> Result<i64, AppError>;

    /// Active fines with something outstanding, oldest first.
    async fn active_for_student(&self, regno: &str) -> Result<Vec<FineDetail>, AppError>;

    /// All fines, or one student's, newest first.
    async fn list(&self, regno: Option<String>) -> Result<Vec<FineDetail>, AppError>;

    /// Adds a payment to a fine and records it, atomically.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the fine does not exist and
    /// [`AppError::Validation`] if the amount exceeds what is outstanding at
    /// commit time.
    async fn record_payment(&self, payment: NewPayment) -> Result<(Fine, FinePayment), AppError>;

    /// Completed payments of a student, newest first.
    async fn payment_history(&self, regno: &str) -> Result<Vec<PaymentRecord>, AppError>;
}

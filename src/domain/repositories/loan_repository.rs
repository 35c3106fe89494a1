//! Repository trait for loans (borrowed books).

use crate::domain::entities::{Loan, LoanWithAuthor, NewLoan, ReturnOutcome};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Repository interface for borrowing and returning books.
///
/// Borrowing and returning change both the loan and the book's shelf count;
/// implementations do both in one transaction.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLoanRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
///
/// # Examples
///
/// See integration tests: `tests/repository_loan.rs`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoanRepository: Send + Sync {
    /// Takes one copy off the shelf and records the loan.
    ///
    /// Marks `new_loan.fulfils_reservation` as fulfilled in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the book does not exist,
    /// [`AppError::Conflict`] if no copy is left or the student already has
    /// this book on loan.
    async fn borrow(&self, new_loan: NewLoan) -> Result<Loan, AppError>;

    /// Closes an open loan and puts the copy back on the shelf.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the loan does not exist and
    /// [`AppError::Conflict`] if it was already returned.
    async fn return_loan(&self, id: i64, returned_on: NaiveDate)
    -> Result<ReturnOutcome, AppError>;

    async fn find(&self, id: i64) -> Result<Option<Loan>, AppError>;

    /// Open loans of one student, oldest due date first.
    async fn open_for_student(&self, regno: &str) -> Result<Vec<Loan>, AppError>;

    /// Every loan of one student, newest first.
    async fn history(&self, regno: &str) -> Result<Vec<Loan>, AppError>;

    /// Like [`LoanRepository::history`], with the author of each book.
    async fn history_with_authors(&self, regno: &str) -> Result<Vec<LoanWithAuthor>, AppError>;

    /// Every open loan, newest first.
    async fn all_open(&self) -> Result<Vec<Loan>, AppError>;

    /// Open loans of any of `regnos`, newest first.
    async fn open_for_students(&self, regnos: &[String]) -> Result<Vec<Loan>, AppError>;

    /// Open loans of one student due before `today`.
    async fn overdue_for_student(
        &self,
        regno: &str,
        today: NaiveDate,
    ) -> Result<Vec<Loan>, AppError>;

    async fn count_open(&self) -> Result<i64, AppError>;

    async fn count_overdue(&self, today: NaiveDate) -> Result<i64, AppError>;

    /// Borrow dates of all loans started on or after `since`.
    async fn borrow_dates_since(&self, since: NaiveDate) -> Result<Vec<NaiveDate>, AppError>;

    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the loan does not exist.
    async fn update_due_date(&self, id: i64, due_date: NaiveDate) -> Result<Loan, AppError>;
}

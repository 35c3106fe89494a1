//! PostgreSQL implementation of the loan repository.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{Loan, LoanWithAuthor, NewLoan, ReturnOutcome};
use crate::domain::repositories::LoanRepository;
use crate::error::AppError;

const LOAN_COLUMNS: &str =
    "id, regno, book_id, book_title, borrow_date, due_date, actual_return_date";

pub struct PgLoanRepository {
    pool: Arc<PgPool>,
}

impl PgLoanRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    async fn fetch_where(&self, clause: &str, regno: &str) -> Result<Vec<Loan>, AppError> {
        let loans = sqlx::query_as::<_, Loan>(&format!(
            "SELECT {LOAN_COLUMNS} FROM borrowed_books WHERE {clause}"
        ))
        .bind(regno)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(loans)
    }
}

#[async_trait]
impl LoanRepository for PgLoanRepository {
    async fn borrow(&self, new_loan: NewLoan) -> Result<Loan, AppError> {
        let mut tx = self.pool.begin().await?;

        let title: Option<String> = sqlx::query_scalar(
            r#"
            UPDATE books SET available_copies = available_copies - 1
            WHERE id = $1 AND available_copies > 0
            RETURNING title
            "#,
        )
        .bind(new_loan.book_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(title) = title else {
            let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM books WHERE id = $1)")
                .bind(new_loan.book_id)
                .fetch_one(&mut *tx)
                .await?;
            tx.rollback().await?;

            return Err(if exists {
                AppError::conflict(
                    "Book not available.",
                    json!({ "book_id": new_loan.book_id }),
                )
            } else {
                AppError::not_found("Book not found.", json!({ "book_id": new_loan.book_id }))
            });
        };

        let loan = sqlx::query_as::<_, Loan>(&format!(
            r#"
            INSERT INTO borrowed_books (regno, book_id, book_title, borrow_date, due_date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {LOAN_COLUMNS}
            "#
        ))
        .bind(&new_loan.regno)
        .bind(new_loan.book_id)
        .bind(&title)
        .bind(new_loan.borrow_date)
        .bind(new_loan.due_date)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict { .. } => AppError::conflict(
                "You already have this book on loan.",
                json!({ "book_id": new_loan.book_id }),
            ),
            other => other,
        })?;

        if let Some(reservation_id) = new_loan.fulfils_reservation {
            sqlx::query(
                "UPDATE reservations SET status = 'fulfilled' WHERE id = $1 AND status = 'active'",
            )
            .bind(reservation_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::debug!(loan_id = loan.id, regno = %loan.regno, "Loan recorded");
        Ok(loan)
    }

    async fn return_loan(
        &self,
        id: i64,
        returned_on: NaiveDate,
    ) -> Result<ReturnOutcome, AppError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, Loan>(&format!(
            "SELECT {LOAN_COLUMNS} FROM borrowed_books WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found("Loan not found.", json!({ "loan_id": id })))?;

        if !current.is_open() {
            tx.rollback().await?;
            return Err(AppError::conflict(
                "This book has already been returned.",
                json!({ "loan_id": id }),
            ));
        }

        let loan = sqlx::query_as::<_, Loan>(&format!(
            r#"
            UPDATE borrowed_books SET actual_return_date = $2
            WHERE id = $1
            RETURNING {LOAN_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(returned_on)
        .fetch_one(&mut *tx)
        .await?;

        let copy_restored = match loan.book_id {
            Some(book_id) => {
                sqlx::query("UPDATE books SET available_copies = available_copies + 1 WHERE id = $1")
                    .bind(book_id)
                    .execute(&mut *tx)
                    .await?
                    .rows_affected()
                    > 0
            }
            None => false,
        };

        tx.commit().await?;

        Ok(ReturnOutcome {
            loan,
            copy_restored,
        })
    }

    async fn find(&self, id: i64) -> Result<Option<Loan>, AppError> {
        let loan = sqlx::query_as::<_, Loan>(&format!(
            "SELECT {LOAN_COLUMNS} FROM borrowed_books WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(loan)
    }

    async fn open_for_student(&self, regno: &str) -> Result<Vec<Loan>, AppError> {
        self.fetch_where(
            "regno = $1 AND actual_return_date IS NULL ORDER BY due_date, id",
            regno,
        )
        .await
    }

    async fn history(&self, regno: &str) -> Result<Vec<Loan>, AppError> {
        self.fetch_where("regno = $1 ORDER BY borrow_date DESC, id DESC", regno)
            .await
    }

    async fn history_with_authors(&self, regno: &str) -> Result<Vec<LoanWithAuthor>, AppError> {
        let rows = sqlx::query_as::<_, LoanWithAuthor>(
            r#"
            SELECT l.id, l.regno, l.book_id, l.book_title, l.borrow_date, l.due_date,
                   l.actual_return_date, b.author
            FROM borrowed_books l
            LEFT JOIN books b ON b.id = l.book_id
            WHERE l.regno = $1
            ORDER BY l.borrow_date DESC, l.id DESC
            "#,
        )
        .bind(regno)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows)
    }

    async fn all_open(&self) -> Result<Vec<Loan>, AppError> {
        let loans = sqlx::query_as::<_, Loan>(&format!(
            r#"
            SELECT {LOAN_COLUMNS} FROM borrowed_books
            WHERE actual_return_date IS NULL
            ORDER BY borrow_date DESC, id DESC
            "#
        ))
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(loans)
    }

    async fn open_for_students(&self, regnos: &[String]) -> Result<Vec<Loan>, AppError> {
        if regnos.is_empty() {
            return Ok(Vec::new());
        }

        let loans = sqlx::query_as::<_, Loan>(&format!(
            r#"
            SELECT {LOAN_COLUMNS} FROM borrowed_books
            WHERE regno = ANY($1) AND actual_return_date IS NULL
            ORDER BY borrow_date DESC, id DESC
            "#
        ))
        .bind(regnos)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(loans)
    }

    async fn overdue_for_student(
        &self,
        regno: &str,
        today: NaiveDate,
    ) -> Result<Vec<Loan>, AppError> {
        let loans = sqlx::query_as::<_, Loan>(&format!(
            r#"
            SELECT {LOAN_COLUMNS} FROM borrowed_books
            WHERE regno = $1 AND actual_return_date IS NULL AND due_date < $2
            ORDER BY due_date, id
            "#
        ))
        .bind(regno)
        .bind(today)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(loans)
    }

    async fn count_open(&self) -> Result<i64, AppError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM borrowed_books WHERE actual_return_date IS NULL")
                .fetch_one(self.pool.as_ref())
                .await?;

        Ok(count)
    }

    async fn count_overdue(&self, today: NaiveDate) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM borrowed_books WHERE actual_return_date IS NULL AND due_date < $1",
        )
        .bind(today)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(count)
    }

    async fn borrow_dates_since(&self, since: NaiveDate) -> Result<Vec<NaiveDate>, AppError> {
        let dates: Vec<NaiveDate> =
            sqlx::query_scalar("SELECT borrow_date FROM borrowed_books WHERE borrow_date >= $1")
                .bind(since)
                .fetch_all(self.pool.as_ref())
                .await?;

        Ok(dates)
    }

    async fn update_due_date(&self, id: i64, due_date: NaiveDate) -> Result<Loan, AppError> {
        let loan = sqlx::query_as::<_, Loan>(&format!(
            "UPDATE borrowed_books SET due_date = $2 WHERE id = $1 RETURNING {LOAN_COLUMNS}"
        ))
        .bind(id)
        .bind(due_date)
        .fetch_optional(self.pool.as_ref())
        .await?;

        loan.ok_or_else(|| AppError::not_found("Loan not found.", json!({ "loan_id": id })))
    }
}

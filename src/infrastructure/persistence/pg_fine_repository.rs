//! PostgreSQL implementation of the fine repository.

use async_trait::async_trait;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{Fine, FineDetail, FinePayment, NewPayment, PaymentRecord};
use crate::domain::repositories::FineRepository;
use crate::error::AppError;

const FINE_COLUMNS: &str =
    "id, regno, loan_id, accrued_paise, paid_paise, due_date, status, created_at, updated_at";

const DETAIL_SELECT: &str = r#"
    SELECT f.id, f.regno, f.loan_id, f.accrued_paise, f.paid_paise, f.due_date, f.status,
           f.created_at, f.updated_at,
           l.book_title, l.due_date AS loan_due_date, l.actual_return_date AS returned_on
    FROM fines f
    JOIN borrowed_books l ON l.id = f.loan_id
"#;

pub struct PgFineRepository {
    pool: Arc<PgPool>,
}

impl PgFineRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FineRepository for PgFineRepository {
    async fn find(&self, id: i64) -> Result<Option<Fine>, AppError> {
        let fine = sqlx::query_as::<_, Fine>(&format!("SELECT {FINE_COLUMNS} FROM fines WHERE id = $1"))
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(fine)
    }

    async fn find_for_loan(&self, loan_id: i64) -> Result<Option<Fine>, AppError> {
        let fine = sqlx::query_as::<_, Fine>(&format!(
            "SELECT {FINE_COLUMNS} FROM fines WHERE loan_id = $1 AND status <> 'waived'"
        ))
        .bind(loan_id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(fine)
    }

    async fn create(
        &self,
        regno: &str,
        loan_id: i64,
        accrued_paise: i64,
        due_date: chrono::NaiveDate,
    ) -> Result<Fine, AppError> {
        let fine = sqlx::query_as::<_, Fine>(&format!(
            r#"
            INSERT INTO fines (regno, loan_id, accrued_paise, due_date)
            VALUES ($1, $2, $3, $4)
            RETURNING {FINE_COLUMNS}
            "#
        ))
        .bind(regno)
        .bind(loan_id)
        .bind(accrued_paise)
        .bind(due_date)
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict { .. } => AppError::conflict(
                "A fine already exists for this loan.",
                json!({ "loan_id": loan_id }),
            ),
            other => other,
        })?;

        Ok(fine)
    }

    async fn raise_accrued(&self, id: i64, accrued_paise: i64) -> Result<Fine, AppError> {
        let fine = sqlx::query_as::<_, Fine>(&format!(
            r#"
            UPDATE fines
            SET accrued_paise = GREATEST(accrued_paise, $2),
                status = CASE
                    WHEN status = 'paid' AND GREATEST(accrued_paise, $2) > paid_paise THEN 'active'
                    ELSE status
                END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {FINE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(accrued_paise)
        .fetch_optional(self.pool.as_ref())
        .await?;

        fine.ok_or_else(|| AppError::not_found("Fine not found.", json!({ "fine_id": id })))
    }

    async fn settle_cleared(&self, regno: &str) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE fines SET status = 'paid', updated_at = NOW()
            WHERE regno = $1 AND status = 'active' AND paid_paise >= accrued_paise
            "#,
        )
        .bind(regno)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected())
    }

    async fn outstanding_total(&self, regno: &str) -> Result<i64, AppError> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(accrued_paise - paid_paise), 0)::bigint
            FROM fines
            WHERE regno = $1 AND status = 'active'
            "#,
        )
        .bind(regno)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(total)
    }

    async fn active_for_student(&self, regno: &str) -> Result<Vec<FineDetail>, AppError> {
        let rows = sqlx::query_as::<_, FineDetail>(&format!(
            r#"
            {DETAIL_SELECT}
            WHERE f.regno = $1 AND f.status = 'active' AND f.accrued_paise > f.paid_paise
            ORDER BY f.created_at, f.id
            "#
        ))
        .bind(regno)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows)
    }

    async fn list(&self, regno: Option<String>) -> Result<Vec<FineDetail>, AppError> {
        let rows = sqlx::query_as::<_, FineDetail>(&format!(
            r#"
            {DETAIL_SELECT}
            WHERE ($1::text IS NULL OR f.regno = $1)
            ORDER BY f.created_at DESC, f.id DESC
            "#
        ))
        .bind(regno)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows)
    }

    async fn record_payment(&self, payment: NewPayment) -> Result<(Fine, FinePayment), AppError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, Fine>(&format!(
            "SELECT {FINE_COLUMNS} FROM fines WHERE id = $1 FOR UPDATE"
        ))
        .bind(payment.fine_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            AppError::not_found("Fine not found.", json!({ "fine_id": payment.fine_id }))
        })?;

        let outstanding = current.outstanding();
        if payment.amount_paise > outstanding.paise() {
            tx.rollback().await?;
            return Err(AppError::bad_request(
                format!("Payment cannot exceed the outstanding amount of {outstanding}."),
                json!({ "fine_id": payment.fine_id }),
            ));
        }

        let fine = sqlx::query_as::<_, Fine>(&format!(
            r#"
            UPDATE fines
            SET paid_paise = paid_paise + $2,
                status = CASE WHEN paid_paise + $2 >= accrued_paise THEN 'paid' ELSE status END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {FINE_COLUMNS}
            "#
        ))
        .bind(payment.fine_id)
        .bind(payment.amount_paise)
        .fetch_one(&mut *tx)
        .await?;

        let recorded = sqlx::query_as::<_, FinePayment>(
            r#"
            INSERT INTO fine_payments (fine_id, amount_paise, transaction_id)
            VALUES ($1, $2, $3)
            RETURNING id, fine_id, amount_paise, payment_date, payment_method, transaction_id, status
            "#,
        )
        .bind(payment.fine_id)
        .bind(payment.amount_paise)
        .bind(&payment.transaction_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((fine, recorded))
    }

    async fn payment_history(&self, regno: &str) -> Result<Vec<PaymentRecord>, AppError> {
        let rows = sqlx::query_as::<_, PaymentRecord>(
            r#"
            SELECT p.id, p.fine_id, p.amount_paise, p.payment_date, p.payment_method,
                   p.transaction_id, p.status, l.book_title
            FROM fine_payments p
            JOIN fines f ON f.id = p.fine_id
            JOIN borrowed_books l ON l.id = f.loan_id
            WHERE f.regno = $1 AND p.status = 'completed'
            ORDER BY p.payment_date DESC, p.id DESC
            "#,
        )
        .bind(regno)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows)
    }
}

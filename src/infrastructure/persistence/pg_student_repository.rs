//! PostgreSQL implementation of the student repository.

use async_trait::async_trait;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{NewStudent, Student};
use crate::domain::repositories::StudentRepository;
use crate::error::AppError;

pub struct PgStudentRepository {
    pool: Arc<PgPool>,
}

impl PgStudentRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StudentRepository for PgStudentRepository {
    async fn create_from_signup(
        &self,
        otp_id: i64,
        new_student: NewStudent,
    ) -> Result<Student, AppError> {
        let mut tx = self.pool.begin().await?;

        let consumed = sqlx::query(
            "UPDATE otp_attempts SET consumed_at = NOW() WHERE id = $1 AND consumed_at IS NULL",
        )
        .bind(otp_id)
        .execute(&mut *tx)
        .await?;

        if consumed.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(AppError::bad_request(
                "No pending signup found. Please sign up again.",
                json!({ "regno": new_student.regno }),
            ));
        }

        let student = sqlx::query_as::<_, Student>(
            r#"
            INSERT INTO students (regno, email, password_hash)
            VALUES ($1, $2, $3)
            ON CONFLICT (regno) DO NOTHING
            RETURNING regno, email, password_hash, created_at
            "#,
        )
        .bind(&new_student.regno)
        .bind(&new_student.email)
        .bind(&new_student.password_hash)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;

        student.ok_or_else(|| {
            AppError::conflict(
                "Registration number already exists. Please log in.",
                json!({ "regno": new_student.regno }),
            )
        })
    }

    async fn find(&self, regno: &str) -> Result<Option<Student>, AppError> {
        let student = sqlx::query_as::<_, Student>(
            "SELECT regno, email, password_hash, created_at FROM students WHERE regno = $1",
        )
        .bind(regno)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(student)
    }

    async fn list(&self) -> Result<Vec<Student>, AppError> {
        let students = sqlx::query_as::<_, Student>(
            "SELECT regno, email, password_hash, created_at FROM students ORDER BY regno",
        )
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(students)
    }

    async fn count(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM students")
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(count)
    }

    async fn update_password(&self, regno: &str, password_hash: &str) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE students SET password_hash = $2 WHERE regno = $1")
            .bind(regno)
            .bind(password_hash)
            .execute(self.pool.as_ref())
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(
                "Student not found",
                json!({ "regno": regno }),
            ));
        }

        Ok(())
    }

    async fn delete_with_loans(&self, regno: &str) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await?;

        let restored = sqlx::query(
            r#"
            UPDATE books b
            SET available_copies = b.available_copies + open_loans.n
            FROM (
                SELECT book_id, COUNT(*)::int AS n
                FROM borrowed_books
                WHERE regno = $1 AND actual_return_date IS NULL AND book_id IS NOT NULL
                GROUP BY book_id
            ) AS open_loans
            WHERE b.id = open_loans.book_id
            "#,
        )
        .bind(regno)
        .execute(&mut *tx)
        .await?;

        let deleted = sqlx::query("DELETE FROM students WHERE regno = $1")
            .bind(regno)
            .execute(&mut *tx)
            .await?;

        if deleted.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(AppError::not_found(
                "Student not found",
                json!({ "regno": regno }),
            ));
        }

        tx.commit().await?;
        Ok(restored.rows_affected())
    }
}

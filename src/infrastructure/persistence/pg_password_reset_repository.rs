//! PostgreSQL implementation of the password reset repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{PasswordResetRequest, ResetStatus};
use crate::domain::repositories::PasswordResetRepository;
use crate::error::AppError;

const RESET_COLUMNS: &str = "id, regno, status, token_hash, expires_at, created_at";

pub struct PgPasswordResetRepository {
    pool: Arc<PgPool>,
}

impl PgPasswordResetRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PasswordResetRepository for PgPasswordResetRepository {
    async fn create(
        &self,
        regno: &str,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<PasswordResetRequest, AppError> {
        let row = sqlx::query_as::<_, PasswordResetRequest>(&format!(
            r#"
            INSERT INTO password_reset_requests (regno, token_hash, expires_at)
            VALUES ($1, $2, $3)
            RETURNING {RESET_COLUMNS}
            "#
        ))
        .bind(regno)
        .bind(token_hash)
        .bind(expires_at)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(row)
    }

    async fn find_pending_by_regno(
        &self,
        regno: &str,
    ) -> Result<Option<PasswordResetRequest>, AppError> {
        let row = sqlx::query_as::<_, PasswordResetRequest>(&format!(
            r#"
            SELECT {RESET_COLUMNS} FROM password_reset_requests
            WHERE regno = $1 AND status = 'pending'
            ORDER BY created_at DESC
            LIMIT 1
            "#
        ))
        .bind(regno)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row)
    }

    async fn find_pending_by_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<PasswordResetRequest>, AppError> {
        let row = sqlx::query_as::<_, PasswordResetRequest>(&format!(
            "SELECT {RESET_COLUMNS} FROM password_reset_requests WHERE token_hash = $1 AND status = 'pending'"
        ))
        .bind(token_hash)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row)
    }

    async fn list_pending(&self) -> Result<Vec<PasswordResetRequest>, AppError> {
        let rows = sqlx::query_as::<_, PasswordResetRequest>(&format!(
            "SELECT {RESET_COLUMNS} FROM password_reset_requests WHERE status = 'pending' ORDER BY created_at"
        ))
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows)
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        sqlx::query("DELETE FROM password_reset_requests WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(())
    }

    async fn close_with_password(
        &self,
        id: i64,
        status: ResetStatus,
        password_hash: &str,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let regno: Option<String> = sqlx::query_scalar(
            r#"
            UPDATE password_reset_requests
            SET status = $2, token_hash = NULL, expires_at = NULL
            WHERE id = $1 AND status = 'pending'
            RETURNING regno
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(regno) = regno else {
            tx.rollback().await?;
            return Err(AppError::not_found(
                "Password reset request not found",
                json!({ "id": id }),
            ));
        };

        sqlx::query("UPDATE students SET password_hash = $2 WHERE regno = $1")
            .bind(&regno)
            .bind(password_hash)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

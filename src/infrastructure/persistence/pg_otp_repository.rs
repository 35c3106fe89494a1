//! PostgreSQL implementation of the OTP attempt repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{NewOtpAttempt, OtpAttempt};
use crate::domain::repositories::OtpRepository;
use crate::error::AppError;

const OTP_COLUMNS: &str =
    "id, email, regno, password_hash, otp_code, created_at, resend_count, consumed_at";

pub struct PgOtpRepository {
    pool: Arc<PgPool>,
}

impl PgOtpRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OtpRepository for PgOtpRepository {
    async fn create(&self, attempt: NewOtpAttempt) -> Result<OtpAttempt, AppError> {
        let row = sqlx::query_as::<_, OtpAttempt>(&format!(
            r#"
            INSERT INTO otp_attempts (email, regno, password_hash, otp_code, resend_count)
            VALUES (LOWER($1), $2, $3, $4, $5)
            RETURNING {OTP_COLUMNS}
            "#
        ))
        .bind(&attempt.email)
        .bind(&attempt.regno)
        .bind(&attempt.password_hash)
        .bind(&attempt.otp_code)
        .bind(attempt.resend_count)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(row)
    }

    async fn count_since(&self, email: &str, since: DateTime<Utc>) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM otp_attempts WHERE email = LOWER($1) AND created_at >= $2",
        )
        .bind(email)
        .bind(since)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(count)
    }

    async fn latest(&self, email: &str) -> Result<Option<OtpAttempt>, AppError> {
        let row = sqlx::query_as::<_, OtpAttempt>(&format!(
            r#"
            SELECT {OTP_COLUMNS} FROM otp_attempts
            WHERE email = LOWER($1)
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#
        ))
        .bind(email)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row)
    }
}

//! PostgreSQL implementation of the outgoing mail log.

use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{DeliveryStatus, OutboundEmail};
use crate::domain::mail::MailMessage;
use crate::domain::repositories::OutboxRepository;
use crate::error::AppError;

pub struct PgOutboxRepository {
    pool: Arc<PgPool>,
}

impl PgOutboxRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OutboxRepository for PgOutboxRepository {
    async fn record(
        &self,
        message: &MailMessage,
        status: DeliveryStatus,
        attempts: i32,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO outbound_emails (recipient, subject, body, status, attempts)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&message.to)
        .bind(&message.subject)
        .bind(&message.body)
        .bind(status.as_str())
        .bind(attempts)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn recent(&self, limit: i64) -> Result<Vec<OutboundEmail>, AppError> {
        let rows = sqlx::query_as::<_, OutboundEmail>(
            r#"
            SELECT id, recipient, subject, body, status, attempts, created_at
            FROM outbound_emails
            ORDER BY created_at DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows)
    }
}

//! PostgreSQL implementation of the session repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{Principal, SessionOwner};
use crate::domain::repositories::SessionRepository;
use crate::error::AppError;

pub struct PgSessionRepository {
    pool: Arc<PgPool>,
}

impl PgSessionRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    student_regno: Option<String>,
    admin_id: Option<i64>,
    admin_email: Option<String>,
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn create(
        &self,
        token_hash: &str,
        owner: SessionOwner,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let (regno, admin_id) = match owner {
            SessionOwner::Student(regno) => (Some(regno), None),
            SessionOwner::Admin(id) => (None, Some(id)),
        };

        sqlx::query(
            r#"
            INSERT INTO sessions (token_hash, student_regno, admin_id, expires_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(token_hash)
        .bind(regno)
        .bind(admin_id)
        .bind(expires_at)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn resolve(&self, token_hash: &str) -> Result<Option<Principal>, AppError> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT s.student_regno, s.admin_id, a.email AS admin_email
            FROM sessions s
            LEFT JOIN admins a ON a.id = s.admin_id
            WHERE s.token_hash = $1 AND s.expires_at > NOW()
            "#,
        )
        .bind(token_hash)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.and_then(|r| match (r.student_regno, r.admin_id, r.admin_email) {
            (Some(regno), _, _) => Some(Principal::Student { regno }),
            (None, Some(id), Some(email)) => Some(Principal::Admin { id, email }),
            _ => None,
        }))
    }

    async fn delete(&self, token_hash: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
            .bind(token_hash)
            .execute(self.pool.as_ref())
            .await?;

        Ok(())
    }

    async fn delete_for_admin(&self, admin_id: i64) -> Result<(), AppError> {
        sqlx::query("DELETE FROM sessions WHERE admin_id = $1")
            .bind(admin_id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= NOW()")
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected())
    }
}

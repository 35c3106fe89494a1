//! PostgreSQL implementation of the admin repository.

use async_trait::async_trait;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::Admin;
use crate::domain::repositories::AdminRepository;
use crate::error::AppError;

pub struct PgAdminRepository {
    pool: Arc<PgPool>,
}

impl PgAdminRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

fn email_taken(email: &str) -> impl FnOnce(sqlx::Error) -> AppError + '_ {
    move |e| match AppError::from(e) {
        AppError::Conflict { .. } => AppError::conflict(
            "Admin with this email already exists.",
            json!({ "email": email }),
        ),
        other => other,
    }
}

#[async_trait]
impl AdminRepository for PgAdminRepository {
    async fn create(&self, email: &str, password_hash: &str) -> Result<Admin, AppError> {
        let admin = sqlx::query_as::<_, Admin>(
            r#"
            INSERT INTO admins (email, password_hash)
            VALUES (LOWER($1), $2)
            RETURNING id, email, password_hash, created_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(email_taken(email))?;

        Ok(admin)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Admin>, AppError> {
        let admin = sqlx::query_as::<_, Admin>(
            "SELECT id, email, password_hash, created_at FROM admins WHERE email = LOWER($1)",
        )
        .bind(email)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(admin)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Admin>, AppError> {
        let admin = sqlx::query_as::<_, Admin>(
            "SELECT id, email, password_hash, created_at FROM admins WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(admin)
    }

    async fn list(&self) -> Result<Vec<Admin>, AppError> {
        let admins = sqlx::query_as::<_, Admin>(
            "SELECT id, email, password_hash, created_at FROM admins ORDER BY email",
        )
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(admins)
    }

    async fn delete_by_email(&self, email: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM admins WHERE email = LOWER($1)")
            .bind(email)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_credentials(
        &self,
        id: i64,
        email: &str,
        password_hash: &str,
    ) -> Result<Admin, AppError> {
        let admin = sqlx::query_as::<_, Admin>(
            r#"
            UPDATE admins SET email = LOWER($2), password_hash = $3
            WHERE id = $1
            RETURNING id, email, password_hash, created_at
            "#,
        )
        .bind(id)
        .bind(email)
        .bind(password_hash)
        .fetch_optional(self.pool.as_ref())
        .await
        .map_err(email_taken(email))?;

        admin.ok_or_else(|| AppError::not_found("Admin not found", json!({ "id": id })))
    }
}

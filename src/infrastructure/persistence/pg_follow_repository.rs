//! PostgreSQL implementation of the follow repository.

use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::Follow;
use crate::domain::repositories::FollowRepository;
use crate::error::AppError;

pub struct PgFollowRepository {
    pool: Arc<PgPool>,
}

impl PgFollowRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FollowRepository for PgFollowRepository {
    async fn follow(&self, follower: &str, followed: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO followings (follower_regno, followed_regno) VALUES ($1, $2)
            ON CONFLICT (follower_regno, followed_regno) DO NOTHING
            "#,
        )
        .bind(follower)
        .bind(followed)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn unfollow(&self, follower: &str, followed: &str) -> Result<bool, AppError> {
        let result =
            sqlx::query("DELETE FROM followings WHERE follower_regno = $1 AND followed_regno = $2")
                .bind(follower)
                .bind(followed)
                .execute(self.pool.as_ref())
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn following(&self, regno: &str) -> Result<Vec<Follow>, AppError> {
        let rows = sqlx::query_as::<_, Follow>(
            r#"
            SELECT id, follower_regno, followed_regno, created_at
            FROM followings WHERE follower_regno = $1
            ORDER BY followed_regno
            "#,
        )
        .bind(regno)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows)
    }

    async fn followers(&self, regno: &str) -> Result<Vec<Follow>, AppError> {
        let rows = sqlx::query_as::<_, Follow>(
            r#"
            SELECT id, follower_regno, followed_regno, created_at
            FROM followings WHERE followed_regno = $1
            ORDER BY follower_regno
            "#,
        )
        .bind(regno)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows)
    }
}

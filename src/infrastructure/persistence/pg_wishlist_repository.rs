//! PostgreSQL implementation of the wishlist repository.

use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::WishlistEntry;
use crate::domain::repositories::WishlistRepository;
use crate::error::AppError;

const WISHLIST_SELECT: &str = r#"
    SELECT w.id, w.regno, w.book_id, w.added_at, b.title, b.author, b.available_copies
    FROM wishlist w
    JOIN books b ON b.id = w.book_id
"#;

pub struct PgWishlistRepository {
    pool: Arc<PgPool>,
}

impl PgWishlistRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WishlistRepository for PgWishlistRepository {
    async fn add(&self, regno: &str, book_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO wishlist (regno, book_id) VALUES ($1, $2)
            ON CONFLICT (regno, book_id) DO NOTHING
            "#,
        )
        .bind(regno)
        .bind(book_id)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find(&self, id: i64) -> Result<Option<WishlistEntry>, AppError> {
        let entry = sqlx::query_as::<_, WishlistEntry>(&format!("{WISHLIST_SELECT} WHERE w.id = $1"))
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(entry)
    }

    async fn remove(&self, id: i64) -> Result<(), AppError> {
        sqlx::query("DELETE FROM wishlist WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(())
    }

    async fn for_student(&self, regno: &str) -> Result<Vec<WishlistEntry>, AppError> {
        let entries = sqlx::query_as::<_, WishlistEntry>(&format!(
            "{WISHLIST_SELECT} WHERE w.regno = $1 ORDER BY w.added_at DESC"
        ))
        .bind(regno)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(entries)
    }
}

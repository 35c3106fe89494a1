//! PostgreSQL implementation of the rating repository.

use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::BookRating;
use crate::domain::repositories::RatingRepository;
use crate::error::AppError;

pub struct PgRatingRepository {
    pool: Arc<PgPool>,
}

impl PgRatingRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RatingRepository for PgRatingRepository {
    async fn upsert(
        &self,
        regno: &str,
        book_id: i64,
        rating: i16,
        review: Option<String>,
    ) -> Result<BookRating, AppError> {
        let row = sqlx::query_as::<_, BookRating>(
            r#"
            INSERT INTO book_ratings (regno, book_id, rating, review)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (regno, book_id)
            DO UPDATE SET rating = EXCLUDED.rating, review = EXCLUDED.review, created_at = NOW()
            RETURNING id, regno, book_id, rating, review, created_at
            "#,
        )
        .bind(regno)
        .bind(book_id)
        .bind(rating)
        .bind(review)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(row)
    }

    async fn for_student(&self, regno: &str) -> Result<Vec<BookRating>, AppError> {
        let rows = sqlx::query_as::<_, BookRating>(
            r#"
            SELECT id, regno, book_id, rating, review, created_at
            FROM book_ratings WHERE regno = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(regno)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows)
    }
}

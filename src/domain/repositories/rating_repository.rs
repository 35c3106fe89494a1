//! Repository trait for book ratings.

use crate::domain::entities::BookRating;
use crate::error::AppError;
use async_trait::async_trait;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RatingRepository: Send + Sync {
    /// Inserts a rating or replaces the student's previous one for the book.
    async fn upsert(
        &self,
        regno: &str,
        book_id: i64,
        rating: i16,
        review: Option<String>,
    ) -> Result<BookRating, AppError>;

    async fn for_student(&self, regno: &str) -> Result<Vec<BookRating>, AppError>;
}

//! Repository trait for student wishlists.

use crate::domain::entities::WishlistEntry;
use crate::error::AppError;
use async_trait::async_trait;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WishlistRepository: Send + Sync {
    /// Returns `false` if the book was already on the wishlist.
    async fn add(&self, regno: &str, book_id: i64) -> Result<bool, AppError>;

    async fn find(&self, id: i64) -> Result<Option<WishlistEntry>, AppError>;

    async fn remove(&self, id: i64) -> Result<(), AppError>;

    /// Entries of one student, most recently added first.
    async fn for_student(&self, regno: &str) -> Result<Vec<WishlistEntry>, AppError>;
}

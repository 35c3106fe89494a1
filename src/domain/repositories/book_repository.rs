//! Repository trait for the book catalog.

use crate::domain::entities::{Book, BookSearch, CopyRemoval, NewBook, RatingSummary};
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for catalog entries and their shelf counts.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgBookRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
///
/// # Examples
///
/// See integration tests: `tests/repository_book.rs`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// Adds a book.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if a book with the same title and author exists.
    async fn create(&self, new_book: NewBook) -> Result<Book, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Book>, AppError>;

    /// Exact match on title and author.
    async fn find_by_title_author(
        &self,
        title: &str,
        author: &str,
    ) -> Result<Option<Book>, AppError>;

    /// Case-insensitive substring search with availability filter and sort.
    async fn search(&self, search: &BookSearch) -> Result<Vec<Book>, AppError>;

    /// Puts `copies` more copies on the shelf.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the book does not exist.
    async fn add_copies(&self, id: i64, copies: i32) -> Result<Book, AppError>;

    /// Removes `copies` copies; removing all of them deletes the book.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the book does not exist.
    async fn remove_copies(&self, id: i64, copies: i32) -> Result<CopyRemoval, AppError>;

    async fn count(&self) -> Result<i64, AppError>;

    /// Books by any of `authors`, excluding `exclude_ids`, ordered by title.
    async fn by_authors_excluding(
        &self,
        authors: &[String],
        exclude_ids: &[i64],
        limit: i64,
    ) -> Result<Vec<Book>, AppError>;

    /// Random books, excluding `exclude_ids`.
    async fn random_excluding(&self, exclude_ids: &[i64], limit: i64)
    -> Result<Vec<Book>, AppError>;

    /// Average rating and rating count for every rated book.
    async fn rating_summaries(&self) -> Result<Vec<RatingSummary>, AppError>;
}

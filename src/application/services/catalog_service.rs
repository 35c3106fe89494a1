//! Catalog search and maintenance.

use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::entities::{Book, BookSearch, CopyRemoval, NewBook, RatingSummary};
use crate::domain::repositories::BookRepository;
use crate::error::AppError;

/// A search hit with its average rating, if anyone rated it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogEntry {
    #[serde(flatten)]
    pub book: Book,
    #[serde(skip)]
    pub rating: Option<RatingSummary>,
}

/// Result of adding a book.
#[derive(Debug, Clone, PartialEq)]
pub enum AddBookOutcome {
    Created(Book),
    /// The title and author are already catalogued; add copies instead.
    AlreadyExists(Book),
}

pub struct CatalogService {
    books: Arc<dyn BookRepository>,
}

impl CatalogService {
    pub fn new(books: Arc<dyn BookRepository>) -> Self {
        Self { books }
    }

    pub async fn search(&self, search: &BookSearch) -> Result<Vec<Book>, AppError> {
        self.books.search(search).await
    }

    /// Search results joined with rating summaries.
    pub async fn search_with_ratings(
        &self,
        search: &BookSearch,
    ) -> Result<Vec<CatalogEntry>, AppError> {
        let books = self.books.search(search).await?;
        let mut ratings: HashMap<i64, RatingSummary> = self
            .books
            .rating_summaries()
            .await?
            .into_iter()
            .map(|summary| (summary.book_id, summary))
            .collect();

        Ok(books
            .into_iter()
            .map(|book| CatalogEntry {
                rating: ratings.remove(&book.id),
                book,
            })
            .collect())
    }

    /// Every book, ordered by title.
    pub async fn all(&self) -> Result<Vec<Book>, AppError> {
        self.books.search(&BookSearch::default()).await
    }

    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the book does not exist.
    pub async fn get(&self, id: i64) -> Result<Book, AppError> {
        self.books
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Book not found.", json!({ "book_id": id })))
    }

    /// Adds a book, or reports the existing entry for the same title and author.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for an empty title or author or fewer
    /// than one copy.
    pub async fn add_book(&self, new_book: NewBook) -> Result<AddBookOutcome, AppError> {
        let title = new_book.title.trim().to_string();
        let author = new_book.author.trim().to_string();

        if title.is_empty() || author.is_empty() {
            return Err(AppError::bad_request(
                "Title and author are required.",
                json!({}),
            ));
        }
        check_copies(new_book.copies)?;

        if let Some(existing) = self.books.find_by_title_author(&title, &author).await? {
            return Ok(AddBookOutcome::AlreadyExists(existing));
        }

        let book = self
            .books
            .create(NewBook {
                title,
                author,
                copies: new_book.copies,
            })
            .await?;

        tracing::info!(book_id = book.id, title = %book.title, copies = book.available_copies, "Book added");
        Ok(AddBookOutcome::Created(book))
    }

    pub async fn add_copies(&self, id: i64, copies: i32) -> Result<Book, AppError> {
        check_copies(copies)?;
        let book = self.books.add_copies(id, copies).await?;
        tracing::info!(book_id = id, added = copies, available = book.available_copies, "Copies added");
        Ok(book)
    }

    /// Removes copies; taking away every copy deletes the book.
    pub async fn remove_copies(&self, id: i64, copies: i32) -> Result<CopyRemoval, AppError> {
        check_copies(copies)?;
        let outcome = self.books.remove_copies(id, copies).await?;
        match &outcome {
            CopyRemoval::Removed(book) => {
                tracing::info!(book_id = id, removed = copies, available = book.available_copies, "Copies removed")
            }
            CopyRemoval::Deleted => tracing::info!(book_id = id, "Book deleted"),
        }
        Ok(outcome)
    }
}

fn check_copies(copies: i32) -> Result<(), AppError> {
    if copies < 1 {
        return Err(AppError::bad_request(
            "Number of copies must be at least 1.",
            json!({ "copies": copies }),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::MockBookRepository;

    fn dune() -> Book {
        Book::new(1, "Dune".into(), "Frank Herbert".into(), 2)
    }

    #[tokio::test]
    async fn test_add_book_trims_and_creates() {
        let mut books = MockBookRepository::new();
        books.expect_find_by_title_author().returning(|_, _| Ok(None));
        books
            .expect_create()
            .withf(|b| b.title == "Dune" && b.author == "Frank Herbert" && b.copies == 2)
            .times(1)
            .returning(|_| Ok(dune()));

        let service = CatalogService::new(Arc::new(books));
        let outcome = service
            .add_book(NewBook {
                title: "  Dune ".into(),
                author: "Frank Herbert ".into(),
                copies: 2,
            })
            .await
            .unwrap();

        assert_eq!(outcome, AddBookOutcome::Created(dune()));
    }

    #[tokio::test]
    async fn test_add_existing_book_reports_it() {
        let mut books = MockBookRepository::new();
        books
            .expect_find_by_title_author()
            .returning(|_, _| Ok(Some(dune())));
        books.expect_create().never();

        let service = CatalogService::new(Arc::new(books));
        let outcome = service
            .add_book(NewBook {
                title: "Dune".into(),
                author: "Frank Herbert".into(),
                copies: 1,
            })
            .await
            .unwrap();

        assert!(matches!(outcome, AddBookOutcome::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_add_book_requires_copies() {
        let service = CatalogService::new(Arc::new(MockBookRepository::new()));
        let result = service
            .add_book(NewBook {
                title: "Dune".into(),
                author: "Frank Herbert".into(),
                copies: 0,
            })
            .await;

        assert!(matches!(result, Err(AppError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_remove_copies_rejects_zero() {
        let mut books = MockBookRepository::new();
        books.expect_remove_copies().never();

        let service = CatalogService::new(Arc::new(books));
        assert!(service.remove_copies(1, 0).await.is_err());
    }

    #[tokio::test]
    async fn test_search_with_ratings_joins_summaries() {
        let mut books = MockBookRepository::new();
        books.expect_search().returning(|_| {
            Ok(vec![dune(), Book::new(2, "Emma".into(), "Jane Austen".into(), 0)])
        });
        books.expect_rating_summaries().returning(|| {
            Ok(vec![RatingSummary {
                book_id: 1,
                average: 4.5,
                count: 2,
            }])
        });

        let service = CatalogService::new(Arc::new(books));
        let entries = service
            .search_with_ratings(&BookSearch::default())
            .await
            .unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].rating.as_ref().map(|r| r.count), Some(2));
        assert!(entries[1].rating.is_none());
    }

    #[tokio::test]
    async fn test_get_missing_book() {
        let mut books = MockBookRepository::new();
        books.expect_find_by_id().returning(|_| Ok(None));

        let service = CatalogService::new(Arc::new(books));
        assert!(matches!(service.get(9).await, Err(AppError::NotFound { .. })));
    }
}

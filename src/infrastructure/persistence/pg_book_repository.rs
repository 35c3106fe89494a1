//! PostgreSQL implementation of the book repository.

use async_trait::async_trait;
use serde_json::json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::sync::Arc;

use crate::domain::entities::{
    Availability, Book, BookSearch, CopyRemoval, NewBook, RatingSummary,
};
use crate::domain::repositories::BookRepository;
use crate::error::AppError;

const BOOK_COLUMNS: &str = "id, title, author, available_copies, created_at";

pub struct PgBookRepository {
    pool: Arc<PgPool>,
}

impl PgBookRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

fn not_found(id: i64) -> AppError {
    AppError::not_found("Book not found", json!({ "id": id }))
}

/// Escapes `%`, `_` and `\` so user input matches literally inside `ILIKE`.
fn like_pattern(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len() + 2);
    escaped.push('%');
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[async_trait]
impl BookRepository for PgBookRepository {
    async fn create(&self, new_book: NewBook) -> Result<Book, AppError> {
        let book = sqlx::query_as::<_, Book>(&format!(
            "INSERT INTO books (title, author, available_copies) VALUES ($1, $2, $3) RETURNING {BOOK_COLUMNS}"
        ))
        .bind(&new_book.title)
        .bind(&new_book.author)
        .bind(new_book.copies)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(book)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Book>, AppError> {
        let book =
            sqlx::query_as::<_, Book>(&format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = $1"))
                .bind(id)
                .fetch_optional(self.pool.as_ref())
                .await?;

        Ok(book)
    }

    async fn find_by_title_author(
        &self,
        title: &str,
        author: &str,
    ) -> Result<Option<Book>, AppError> {
        let book = sqlx::query_as::<_, Book>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE title = $1 AND author = $2"
        ))
        .bind(title)
        .bind(author)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(book)
    }

    async fn search(&self, search: &BookSearch) -> Result<Vec<Book>, AppError> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {BOOK_COLUMNS} FROM books WHERE TRUE"));

        if !search.term.is_empty() {
            let pattern = like_pattern(&search.term);
            qb.push(" AND (title ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR author ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if !search.title.is_empty() {
            qb.push(" AND title ILIKE ")
                .push_bind(like_pattern(&search.title));
        }
        if !search.author.is_empty() {
            qb.push(" AND author ILIKE ")
                .push_bind(like_pattern(&search.author));
        }
        match search.availability {
            Availability::All => {}
            Availability::Available => {
                qb.push(" AND available_copies > 0");
            }
            Availability::Unavailable => {
                qb.push(" AND available_copies = 0");
            }
        }
        qb.push(" ORDER BY ").push(search.sort.order_by());

        let books = qb
            .build_query_as::<Book>()
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(books)
    }

    async fn add_copies(&self, id: i64, copies: i32) -> Result<Book, AppError> {
        let book = sqlx::query_as::<_, Book>(&format!(
            "UPDATE books SET available_copies = available_copies + $2 WHERE id = $1 RETURNING {BOOK_COLUMNS}"
        ))
        .bind(id)
        .bind(copies)
        .fetch_optional(self.pool.as_ref())
        .await?;

        book.ok_or_else(|| not_found(id))
    }

    async fn remove_copies(&self, id: i64, copies: i32) -> Result<CopyRemoval, AppError> {
        let mut tx = self.pool.begin().await?;

        let current: Option<i32> =
            sqlx::query_scalar("SELECT available_copies FROM books WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some(current) = current else {
            tx.rollback().await?;
            return Err(not_found(id));
        };

        let outcome = if copies >= current {
            sqlx::query("DELETE FROM books WHERE id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            CopyRemoval::Deleted
        } else {
            let book = sqlx::query_as::<_, Book>(&format!(
                "UPDATE books SET available_copies = available_copies - $2 WHERE id = $1 RETURNING {BOOK_COLUMNS}"
            ))
            .bind(id)
            .bind(copies)
            .fetch_one(&mut *tx)
            .await?;
            CopyRemoval::Removed(book)
        };

        tx.commit().await?;
        Ok(outcome)
    }

    async fn count(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(count)
    }

    async fn by_authors_excluding(
        &self,
        authors: &[String],
        exclude_ids: &[i64],
        limit: i64,
    ) -> Result<Vec<Book>, AppError> {
        let books = sqlx::query_as::<_, Book>(&format!(
            r#"
            SELECT {BOOK_COLUMNS} FROM books
            WHERE author = ANY($1) AND NOT (id = ANY($2))
            ORDER BY title, id
            LIMIT $3
            "#
        ))
        .bind(authors)
        .bind(exclude_ids)
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(books)
    }

    async fn random_excluding(
        &self,
        exclude_ids: &[i64],
        limit: i64,
    ) -> Result<Vec<Book>, AppError> {
        let books = sqlx::query_as::<_, Book>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE NOT (id = ANY($1)) ORDER BY RANDOM() LIMIT $2"
        ))
        .bind(exclude_ids)
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(books)
    }

    async fn rating_summaries(&self) -> Result<Vec<RatingSummary>, AppError> {
        let rows = sqlx::query_as::<_, RatingSummary>(
            r#"
            SELECT book_id, AVG(rating)::float8 AS average, COUNT(*) AS count
            FROM book_ratings
            GROUP BY book_id
            "#,
        )
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows)
    }
}

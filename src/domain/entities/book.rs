//! Catalog entities: books, search filters and rating summaries.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A catalog entry. Copies are tracked as a single shelf count.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub available_copies: i32,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
}

impl Book {
    pub fn new(id: i64, title: String, author: String, available_copies: i32) -> Self {
        Self {
            id,
            title,
            author,
            available_copies,
            created_at: Utc::now(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.available_copies > 0
    }
}

/// Input data for adding a book to the catalog.
#[derive(Debug, Clone)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub copies: i32,
}

/// Result of removing copies from the shelf.
#[derive(Debug, Clone, PartialEq)]
pub enum CopyRemoval {
    /// The book stays in the catalog with fewer copies.
    Removed(Book),
    /// Every copy was removed, so the book was deleted.
    Deleted,
}

/// Availability filter for catalog search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Availability {
    #[default]
    All,
    Available,
    Unavailable,
}

impl Availability {
    /// Parses a query-string value; anything unknown means "all".
    pub fn parse(raw: &str) -> Self {
        match raw {
            "available" => Self::Available,
            "unavailable" => Self::Unavailable,
            _ => Self::All,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Available => "available",
            Self::Unavailable => "unavailable",
        }
    }
}

/// Sort order for catalog search.
///
/// `available_copies` lists the best stocked books first, `-available_copies`
/// the scarcest first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BookSort {
    #[default]
    TitleAsc,
    TitleDesc,
    AuthorAsc,
    AuthorDesc,
    MostCopies,
    FewestCopies,
}

impl BookSort {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "-title" => Self::TitleDesc,
            "author" => Self::AuthorAsc,
            "-author" => Self::AuthorDesc,
            "available_copies" => Self::MostCopies,
            "-available_copies" => Self::FewestCopies,
            _ => Self::TitleAsc,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::TitleAsc => "title",
            Self::TitleDesc => "-title",
            Self::AuthorAsc => "author",
            Self::AuthorDesc => "-author",
            Self::MostCopies => "available_copies",
            Self::FewestCopies => "-available_copies",
        }
    }

    /// SQL `ORDER BY` clause for this sort. Ties fall back to the id.
    pub fn order_by(self) -> &'static str {
        match self {
            Self::TitleAsc => "title ASC, id ASC",
            Self::TitleDesc => "title DESC, id ASC",
            Self::AuthorAsc => "author ASC, id ASC",
            Self::AuthorDesc => "author DESC, id ASC",
            Self::MostCopies => "available_copies DESC, id ASC",
            Self::FewestCopies => "available_copies ASC, id ASC",
        }
    }
}

/// Catalog search filters. Empty strings mean "no filter".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookSearch {
    /// Matches title or author.
    pub term: String,
    pub title: String,
    pub author: String,
    pub availability: Availability,
    pub sort: BookSort,
}

impl BookSearch {
    pub fn is_empty(&self) -> bool {
        self.term.is_empty()
            && self.title.is_empty()
            && self.author.is_empty()
            && self.availability == Availability::All
    }
}

/// Average rating of a book across all students.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct RatingSummary {
    pub book_id: i64,
    pub average: f64,
    pub count: i64,
}

impl RatingSummary {
    /// Average rounded to one decimal for display.
    pub fn display_average(&self) -> String {
        format!("{:.1}", self.average)
    }
}

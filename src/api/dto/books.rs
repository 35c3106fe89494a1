//! Book search parameters and results.

use serde::{Deserialize, Serialize};

use crate::domain::entities::{Availability, Book, BookSearch, BookSort};

/// Query string accepted by `/api/books/search` and `/search_books`.
///
/// ```text
/// ?q=tolkien&availability=available&sort=-title
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct BookSearchParams {
    /// Matches title or author.
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    /// `all`, `available` or `unavailable`.
    #[serde(default)]
    pub availability: String,
    /// `title`, `-title`, `author`, `-author`, `available_copies` or `-available_copies`.
    #[serde(default)]
    pub sort: String,
}

impl BookSearchParams {
    pub fn to_search(&self) -> BookSearch {
        BookSearch {
            term: self.q.trim().to_string(),
            title: self.title.trim().to_string(),
            author: self.author.trim().to_string(),
            availability: Availability::parse(self.availability.trim()),
            sort: BookSort::parse(self.sort.trim()),
        }
    }
}

/// `{"books": [...]}`.
#[derive(Debug, Serialize)]
pub struct BookListResponse {
    pub books: Vec<Book>,
}

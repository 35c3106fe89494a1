//! Ratings, wishlists, recommendations and reading analytics.

use chrono::NaiveDate;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::domain::analytics::{ReadingAnalytics, reading_analytics};
use crate::domain::entities::reader::{MAX_RATING, MIN_RATING};
use crate::domain::entities::{Book, BookRating, Loan, WishlistEntry};
use crate::domain::repositories::{
    BookRepository, LoanRepository, RatingRepository, ReservationRepository, WishlistRepository,
};
use crate::error::AppError;

/// How many recommendations the dashboard shows.
pub const RECOMMENDATION_LIMIT: usize = 5;

/// A past or current loan with the student's rating of that book.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub loan: Loan,
    pub rating: Option<BookRating>,
}

/// A wishlist entry and whether the student already queued for it.
#[derive(Debug, Clone, PartialEq)]
pub struct WishlistItem {
    pub entry: WishlistEntry,
    pub reserved: bool,
}

pub struct ReaderService {
    books: Arc<dyn BookRepository>,
    loans: Arc<dyn LoanRepository>,
    ratings: Arc<dyn RatingRepository>,
    wishlist: Arc<dyn WishlistRepository>,
    reservations: Arc<dyn ReservationRepository>,
}

impl ReaderService {
    pub fn new(
        books: Arc<dyn BookRepository>,
        loans: Arc<dyn LoanRepository>,
        ratings: Arc<dyn RatingRepository>,
        wishlist: Arc<dyn WishlistRepository>,
        reservations: Arc<dyn ReservationRepository>,
    ) -> Self {
        Self {
            books,
            loans,
            ratings,
            wishlist,
            reservations,
        }
    }

    async fn own_loan(&self, regno: &str, loan_id: i64) -> Result<Loan, AppError> {
        self.loans
            .find(loan_id)
            .await?
            .filter(|loan| loan.regno == regno)
            .ok_or_else(|| {
                AppError::not_found(
                    "Loan not found or not authorized.",
                    json!({ "loan_id": loan_id }),
                )
            })
    }

    /// The loan being rated, with the student's current rating of its book.
    pub async fn rating_form(&self, regno: &str, loan_id: i64) -> Result<HistoryEntry, AppError> {
        let loan = self.own_loan(regno, loan_id).await?;
        let rating = self
            .ratings
            .for_student(regno)
            .await?
            .into_iter()
            .find(|r| Some(r.book_id) == loan.book_id);

        Ok(HistoryEntry { loan, rating })
    }

    /// Rates the book of one of the student's loans. Re-rating replaces.
    ///
    /// # Errors
    ///
    /// - [`AppError::NotFound`] when the loan is not the student's or its
    ///   book left the catalog
    /// - [`AppError::Validation`] for a rating outside 1..=5
    pub async fn rate_book(
        &self,
        regno: &str,
        loan_id: i64,
        rating: i16,
        review: Option<String>,
    ) -> Result<BookRating, AppError> {
        let loan = self.own_loan(regno, loan_id).await?;
        let Some(book_id) = loan.book_id else {
            return Err(AppError::not_found(
                "This book is no longer in the catalog.",
                json!({ "loan_id": loan_id }),
            ));
        };

        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(AppError::bad_request(
                format!("Rating must be between {MIN_RATING} and {MAX_RATING}."),
                json!({ "rating": rating }),
            ));
        }

        let review = review
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        let saved = self.ratings.upsert(regno, book_id, rating, review).await?;

        tracing::info!(regno, book_id, rating, "Book rated");
        Ok(saved)
    }

    /// Every loan of the student, newest first, with their ratings.
    pub async fn history(&self, regno: &str) -> Result<Vec<HistoryEntry>, AppError> {
        let loans = self.loans.history(regno).await?;
        let ratings: HashMap<i64, BookRating> = self
            .ratings
            .for_student(regno)
            .await?
            .into_iter()
            .map(|r| (r.book_id, r))
            .collect();

        Ok(loans
            .into_iter()
            .map(|loan| HistoryEntry {
                rating: loan.book_id.and_then(|id| ratings.get(&id).cloned()),
                loan,
            })
            .collect())
    }

    pub async fn wishlist(&self, regno: &str) -> Result<Vec<WishlistItem>, AppError> {
        let reserved: HashSet<i64> = self
            .reservations
            .for_student(regno)
            .await?
            .into_iter()
            .filter(|r| r.is_active())
            .map(|r| r.book_id)
            .collect();

        Ok(self
            .wishlist
            .for_student(regno)
            .await?
            .into_iter()
            .map(|entry| WishlistItem {
                reserved: reserved.contains(&entry.book_id),
                entry,
            })
            .collect())
    }

    /// Adds a book to the wishlist. Returns the book and whether it was new.
    pub async fn add_to_wishlist(&self, regno: &str, book_id: i64) -> Result<(Book, bool), AppError> {
        let book = self
            .books
            .find_by_id(book_id)
            .await?
            .ok_or_else(|| AppError::not_found("Book not found.", json!({ "book_id": book_id })))?;

        let added = self.wishlist.add(regno, book_id).await?;
        if added {
            tracing::debug!(regno, book_id, "Added to wishlist");
        }
        Ok((book, added))
    }

    pub async fn remove_from_wishlist(&self, regno: &str, entry_id: i64) -> Result<String, AppError> {
        let entry = self
            .wishlist
            .find(entry_id)
            .await?
            .filter(|entry| entry.regno == regno)
            .ok_or_else(|| {
                AppError::not_found(
                    "Wishlist item not found.",
                    json!({ "id": entry_id }),
                )
            })?;

        self.wishlist.remove(entry.id).await?;
        Ok(entry.title)
    }

    /// Unread books by authors the student already borrowed, topped up
    /// with random unread books. Random books when there is no history.
    pub async fn recommendations(&self, regno: &str, limit: usize) -> Result<Vec<Book>, AppError> {
        let history = self.loans.history_with_authors(regno).await?;
        let limit_i64 = limit as i64;

        if history.is_empty() {
            return self.books.random_excluding(&[], limit_i64).await;
        }

        let mut exclude: Vec<i64> = history.iter().filter_map(|h| h.loan.book_id).collect();
        let mut authors: Vec<String> = history.iter().filter_map(|h| h.author.clone()).collect();
        authors.sort();
        authors.dedup();

        let mut picks = self
            .books
            .by_authors_excluding(&authors, &exclude, limit_i64)
            .await?;

        if picks.len() < limit {
            exclude.extend(picks.iter().map(|b| b.id));
            let missing = (limit - picks.len()) as i64;
            picks.extend(self.books.random_excluding(&exclude, missing).await?);
        }

        Ok(picks)
    }

    pub async fn analytics(&self, regno: &str, today: NaiveDate) -> Result<ReadingAnalytics, AppError> {
        let history = self.loans.history_with_authors(regno).await?;
        Ok(reading_analytics(&history, today))
    }
}

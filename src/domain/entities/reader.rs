//! Reader entities: ratings, wishlist entries and social follows.

use chrono::{DateTime, Utc};
use serde::Serialize;

pub const MIN_RATING: i16 = 1;
pub const MAX_RATING: i16 = 5;

/// A student's rating of a book. One per student and book.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct BookRating {
    pub id: i64,
    pub regno: String,
    pub book_id: i64,
    pub rating: i16,
    pub review: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A wishlist entry joined with the current state of its book.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct WishlistEntry {
    pub id: i64,
    pub regno: String,
    pub book_id: i64,
    pub added_at: DateTime<Utc>,
    pub title: String,
    pub author: String,
    pub available_copies: i32,
}

/// `follower_regno` follows `followed_regno`.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Follow {
    pub id: i64,
    pub follower_regno: String,
    pub followed_regno: String,
    pub created_at: DateTime<Utc>,
}

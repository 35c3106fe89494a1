//! HTTP request handlers for the JSON endpoints.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod books;
pub mod health;
pub mod stats;

pub use books::search_books_handler;
pub use health::health_handler;
pub use stats::admin_stats_handler;

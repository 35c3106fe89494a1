//! Data Transfer Objects for the JSON endpoints.
//!
//! Responses are serialized with Serde; query strings are deserialized into
//! the same filter types the HTML search page uses.

pub mod books;
pub mod health;
pub mod stats;

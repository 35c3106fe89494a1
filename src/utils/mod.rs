//! Utility functions shared by services and handlers.
//!
//! - [`tokens`] - Random tokens, one-time codes and HMAC signing
//! - [`password`] - bcrypt hashing off the async runtime
//! - [`clock`] - Today's date for business rules

pub mod clock;
pub mod password;
pub mod tokens;

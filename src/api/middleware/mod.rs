//! HTTP middleware for request processing and protection.
//!
//! Provides rate limiting and observability middleware. Session checks for
//! the portal live in [`crate::web::middleware`].

pub mod rate_limit;
pub mod tracing;

//! Application layer services implementing business logic.
//!
//! This layer orchestrates domain operations by coordinating repository calls,
//! validation, and library policy. Services consume repository traits and
//! provide a clean API for HTTP handlers.
//!
//! # Available Services
//!
//! - [`services::AuthService`] - Login sessions
//! - [`services::SignupService`] - Student registration with OTP
//! - [`services::PasswordResetService`] - Reset links and admin approvals
//! - [`services::CatalogService`] - Search and catalog maintenance
//! - [`services::CirculationService`] - Borrowing, returns, reservations, reminders
//! - [`services::FineService`] - Fine accrual and payment
//! - [`services::ReaderService`] - Ratings, wishlist, recommendations, analytics
//! - [`services::SocialService`] - Following other students
//! - [`services::AdminService`] - Admin accounts and library statistics

pub mod services;

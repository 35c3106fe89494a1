//! Repository trait definitions for the domain layer.
//!
//! These traits abstract data access; concrete PostgreSQL implementations
//! live in `crate::infrastructure::persistence`. Mock implementations are
//! generated via `mockall` for service tests.
//!
//! # Available Repositories
//!
//! - [`BookRepository`] - Catalog and shelf counts
//! - [`StudentRepository`], [`AdminRepository`] - Accounts
//! - [`SessionRepository`], [`OtpRepository`], [`PasswordResetRepository`] - Authentication
//! - [`LoanRepository`], [`ReservationRepository`] - Circulation
//! - [`FineRepository`] - Fines and payments
//! - [`RatingRepository`], [`WishlistRepository`], [`FollowRepository`] - Reader features
//! - [`OutboxRepository`] - Outgoing mail log
//!
//! # Testing
//!
//! See integration tests in `tests/repository_*.rs` for usage examples.

pub mod admin_repository;
pub mod book_repository;
pub mod fine_repository;
pub mod follow_repository;
pub mod loan_repository;
pub mod otp_repository;
pub mod outbox_repository;
pub mod password_reset_repository;
pub mod rating_repository;
pub mod reservation_repository;
pub mod session_repository;
pub mod student_repository;
pub mod wishlist_repository;

pub use admin_repository::AdminRepository;
pub use book_repository::BookRepository;
pub use fine_repository::FineRepository;
pub use follow_repository::FollowRepository;
pub use loan_repository::LoanRepository;
pub use otp_repository::OtpRepository;
pub use outbox_repository::OutboxRepository;
pub use password_reset_repository::PasswordResetRepository;
pub use rating_repository::RatingRepository;
pub use reservation_repository::ReservationRepository;
pub use session_repository::SessionRepository;
pub use student_repository::StudentRepository;
pub use wishlist_repository::WishlistRepository;

#[cfg(test)]
pub use admin_repository::MockAdminRepository;
#[cfg(test)]
pub use book_repository::MockBookRepository;
#[cfg(test)]
pub use fine_repository::MockFineRepository;
#[cfg(test)]
pub use follow_repository::MockFollowRepository;
#[cfg(test)]
pub use loan_repository::MockLoanRepository;
#[cfg(test)]
pub use otp_repository::MockOtpRepository;
#[cfg(test)]
pub use outbox_repository::MockOutboxRepository;
#[cfg(test)]
pub use password_reset_repository::MockPasswordResetRepository;
#[cfg(test)]
pub use rating_repository::MockRatingRepository;
#[cfg(test)]
pub use reservation_repository::MockReservationRepository;
#[cfg(test)]
pub use session_repository::MockSessionRepository;
#[cfg(test)]
pub use student_repository::MockStudentRepository;
#[cfg(test)]
pub use wishlist_repository::MockWishlistRepository;

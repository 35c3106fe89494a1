//! PostgreSQL repository implementations.
//!
//! Concrete implementations of domain repository traits using SQLx runtime
//! queries mapped onto `FromRow` entities.
//!
//! # Repositories
//!
//! - [`PgBookRepository`] - Catalog, shelf counts and rating summaries
//! - [`PgStudentRepository`], [`PgAdminRepository`] - Accounts
//! - [`PgSessionRepository`], [`PgOtpRepository`], [`PgPasswordResetRepository`] - Authentication
//! - [`PgLoanRepository`], [`PgReservationRepository`] - Circulation
//! - [`PgFineRepository`] - Fines and payments
//! - [`PgRatingRepository`], [`PgWishlistRepository`], [`PgFollowRepository`] - Reader features
//! - [`PgOutboxRepository`] - Outgoing mail log

pub mod pg_admin_repository;
pub mod pg_book_repository;
pub mod pg_fine_repository;
pub mod pg_follow_repository;
pub mod pg_loan_repository;
pub mod pg_otp_repository;
pub mod pg_outbox_repository;
pub mod pg_password_reset_repository;
pub mod pg_rating_repository;
pub mod pg_reservation_repository;
pub mod pg_session_repository;
pub mod pg_student_repository;
pub mod pg_wishlist_repository;

pub use pg_admin_repository::PgAdminRepository;
pub use pg_book_repository::PgBookRepository;
pub use pg_fine_repository::PgFineRepository;
pub use pg_follow_repository::PgFollowRepository;
pub use pg_loan_repository::PgLoanRepository;
pub use pg_otp_repository::PgOtpRepository;
pub use pg_outbox_repository::PgOutboxRepository;
pub use pg_password_reset_repository::PgPasswordResetRepository;
pub use pg_rating_repository::PgRatingRepository;
pub use pg_reservation_repository::PgReservationRepository;
pub use pg_session_repository::PgSessionRepository;
pub use pg_student_repository::PgStudentRepository;
pub use pg_wishlist_repository::PgWishlistRepository;

use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::repositories::{
    AdminRepository, BookRepository, FineRepository, FollowRepository, LoanRepository,
    OtpRepository, OutboxRepository, PasswordResetRepository, RatingRepository,
    ReservationRepository, SessionRepository, StudentRepository, WishlistRepository,
};

/// Every repository behind a trait object, sharing one pool.
#[derive(Clone)]
pub struct Repositories {
    pub books: Arc<dyn BookRepository>,
    pub students: Arc<dyn StudentRepository>,
    pub admins: Arc<dyn AdminRepository>,
    pub sessions: Arc<dyn SessionRepository>,
    pub otps: Arc<dyn OtpRepository>,
    pub resets: Arc<dyn PasswordResetRepository>,
    pub loans: Arc<dyn LoanRepository>,
    pub reservations: Arc<dyn ReservationRepository>,
    pub ratings: Arc<dyn RatingRepository>,
    pub wishlist: Arc<dyn WishlistRepository>,
    pub fines: Arc<dyn FineRepository>,
    pub follows: Arc<dyn FollowRepository>,
    pub outbox: Arc<dyn OutboxRepository>,
}

impl Repositories {
    pub fn postgres(pool: Arc<PgPool>) -> Self {
        Self {
            books: Arc::new(PgBookRepository::new(pool.clone())),
            students: Arc::new(PgStudentRepository::new(pool.clone())),
            admins: Arc::new(PgAdminRepository::new(pool.clone())),
            sessions: Arc::new(PgSessionRepository::new(pool.clone())),
            otps: Arc::new(PgOtpRepository::new(pool.clone())),
            resets: Arc::new(PgPasswordResetRepository::new(pool.clone())),
            loans: Arc::new(PgLoanRepository::new(pool.clone())),
            reservations: Arc::new(PgReservationRepository::new(pool.clone())),
            ratings: Arc::new(PgRatingRepository::new(pool.clone())),
            wishlist: Arc::new(PgWishlistRepository::new(pool.clone())),
            fines: Arc::new(PgFineRepository::new(pool.clone())),
            follows: Arc::new(PgFollowRepository::new(pool.clone())),
            outbox: Arc::new(PgOutboxRepository::new(pool)),
        }
    }
}

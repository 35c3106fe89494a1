//! Core domain entities of the library.
//!
//! Entities are plain data structures mapped straight from their tables
//! (`sqlx::FromRow`). Status columns are stored as text and parsed into
//! enums on the way out.
//!
//! # Entity Types
//!
//! - [`Book`] - A catalog entry with its shelf count
//! - [`Student`], [`Admin`] - Accounts
//! - [`Loan`], [`Reservation`] - Circulation
//! - [`Fine`], [`FinePayment`] - Overdue charges and payments against them
//! - [`BookRating`], [`WishlistEntry`], [`Follow`] - Reader features
//!
//! Creation inputs use separate structs (`NewBook`, `NewLoan`, ...).

pub mod account;
pub mod book;
pub mod fine;
pub mod loan;
pub mod money;
pub mod outbox;
pub mod reader;

pub use account::{
    Admin, NewOtpAttempt, NewStudent, OtpAttempt, PasswordResetRequest, Principal, ResetStatus,
    SessionOwner, Student,
};
pub use book::{Availability, Book, BookSearch, BookSort, CopyRemoval, NewBook, RatingSummary};
pub use fine::{Fine, FineDetail, FinePayment, FineStatus, NewPayment, PaymentRecord, PaymentStatus};
pub use loan::{
    Loan, LoanWithAuthor, NewLoan, Reservation, ReservationStatus, ReturnOutcome, queue_position,
};
pub use money::Money;
pub use outbox::{DeliveryStatus, OutboundEmail};
pub use reader::{BookRating, Follow, WishlistEntry};

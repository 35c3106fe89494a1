//! Repository trait for reservation queues.

use crate::domain::entities::Reservation;
use crate::error::AppError;
use async_trait::async_trait;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// Queues a new active reservation.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the student already holds an
    /// active reservation for the book.
    async fn create(&self, regno: &str, book_id: i64) -> Result<Reservation, AppError>;

    /// Active reservations for a book, first in line first.
    async fn active_queue(&self, book_id: i64) -> Result<Vec<Reservation>, AppError>;

    /// All reservations of a student, newest first.
    async fn for_student(&self, regno: &str) -> Result<Vec<Reservation>, AppError>;

    /// Every reservation, newest first.
    async fn all(&self) -> Result<Vec<Reservation>, AppError>;
}

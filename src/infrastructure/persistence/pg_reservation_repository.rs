//! PostgreSQL implementation of the reservation repository.

use async_trait::async_trait;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::Reservation;
use crate::domain::repositories::ReservationRepository;
use crate::error::AppError;

const RESERVATION_SELECT: &str = r#"
    SELECT r.id, r.regno, r.book_id, b.title AS book_title, r.reserved_at, r.status
    FROM reservations r
    JOIN books b ON b.id = r.book_id
"#;

pub struct PgReservationRepository {
    pool: Arc<PgPool>,
}

impl PgReservationRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReservationRepository for PgReservationRepository {
    async fn create(&self, regno: &str, book_id: i64) -> Result<Reservation, AppError> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO reservations (regno, book_id) VALUES ($1, $2) RETURNING id",
        )
        .bind(regno)
        .bind(book_id)
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict { .. } => AppError::conflict(
                "You have already reserved this book.",
                json!({ "book_id": book_id }),
            ),
            other => other,
        })?;

        let reservation =
            sqlx::query_as::<_, Reservation>(&format!("{RESERVATION_SELECT} WHERE r.id = $1"))
                .bind(id)
                .fetch_one(self.pool.as_ref())
                .await?;

        Ok(reservation)
    }

    async fn active_queue(&self, book_id: i64) -> Result<Vec<Reservation>, AppError> {
        let queue = sqlx::query_as::<_, Reservation>(&format!(
            "{RESERVATION_SELECT} WHERE r.book_id = $1 AND r.status = 'active' ORDER BY r.reserved_at, r.id"
        ))
        .bind(book_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(queue)
    }

    async fn for_student(&self, regno: &str) -> Result<Vec<Reservation>, AppError> {
        let rows = sqlx::query_as::<_, Reservation>(&format!(
            "{RESERVATION_SELECT} WHERE r.regno = $1 ORDER BY r.reserved_at DESC, r.id DESC"
        ))
        .bind(regno)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows)
    }

    async fn all(&self) -> Result<Vec<Reservation>, AppError> {
        let rows = sqlx::query_as::<_, Reservation>(&format!(
            "{RESERVATION_SELECT} ORDER BY r.reserved_at DESC, r.id DESC"
        ))
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows)
    }
}

mod common;

use library_portal::domain::repositories::ReservationRepository;
use library_portal::error::AppError;
use library_portal::infrastructure::persistence::PgReservationRepository;
use sqlx::PgPool;
use std::sync::Arc;

#[sqlx::test]
async fn test_create_reservation(pool: PgPool) {
    common::create_test_student(&pool, "R1").await;
    let book_id = common::create_test_book(&pool, "Dune", "Frank Herbert", 0).await;
    let repo = PgReservationRepository::new(Arc::new(pool));

    let reservation = repo.create("R1", book_id).await.unwrap();

    assert_eq!(reservation.regno, "R1");
    assert_eq!(reservation.book_title, "Dune");
    assert!(reservation.is_active());
}

#[sqlx::test]
async fn test_duplicate_active_reservation_conflicts(pool: PgPool) {
    common::create_test_student(&pool, "R1").await;
    let book_id = common::create_test_book(&pool, "Dune", "Frank Herbert", 0).await;
    let repo = PgReservationRepository::new(Arc::new(pool));

    repo.create("R1", book_id).await.unwrap();
    let second = repo.create("R1", book_id).await;

    assert!(matches!(second, Err(AppError::Conflict { .. })));
}

#[sqlx::test]
async fn test_queue_is_first_come_first_served(pool: PgPool) {
    for regno in ["R1", "R2", "R3"] {
        common::create_test_student(&pool, regno).await;
    }
    let book_id = common::create_test_book(&pool, "Dune", "Frank Herbert", 0).await;
    let other = common::create_test_book(&pool, "Emma", "Jane Austen", 0).await;
    let repo = PgReservationRepository::new(Arc::new(pool));

    repo.create("R2", book_id).await.unwrap();
    repo.create("R1", book_id).await.unwrap();
    repo.create("R3", other).await.unwrap();

    let queue = repo.active_queue(book_id).await.unwrap();
    let order: Vec<_> = queue.iter().map(|r| r.regno.as_str()).collect();
    assert_eq!(order, vec!["R2", "R1"]);

    assert_eq!(repo.for_student("R3").await.unwrap().len(), 1);
    assert_eq!(repo.all().await.unwrap().len(), 3);
}

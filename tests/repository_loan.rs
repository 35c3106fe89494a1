mod common;

use common::date;
use library_portal::domain::entities::NewLoan;
use library_portal::domain::repositories::{LoanRepository, ReservationRepository};
use library_portal::error::AppError;
use library_portal::infrastructure::persistence::{PgLoanRepository, PgReservationRepository};
use sqlx::PgPool;
use std::sync::Arc;

const REGNO: &str = "21091A0501";

fn new_loan(book_id: i64) -> NewLoan {
    NewLoan {
        regno: REGNO.to_string(),
        book_id,
        borrow_date: date(2026, 3, 1),
        due_date: date(2026, 3, 15),
        fulfils_reservation: None,
    }
}

#[sqlx::test]
async fn test_borrow_takes_copy_off_shelf(pool: PgPool) {
    common::create_test_student(&pool, REGNO).await;
    let book_id = common::create_test_book(&pool, "Dune", "Frank Herbert", 2).await;
    let repo = PgLoanRepository::new(Arc::new(pool.clone()));

    let loan = repo.borrow(new_loan(book_id)).await.unwrap();

    assert_eq!(loan.regno, REGNO);
    assert_eq!(loan.book_title, "Dune");
    assert_eq!(loan.due_date, date(2026, 3, 15));
    assert!(loan.is_open());
    assert_eq!(common::available_copies(&pool, book_id).await, 1);
}

#[sqlx::test]
async fn test_borrow_without_copies_conflicts(pool: PgPool) {
    common::create_test_student(&pool, REGNO).await;
    let book_id = common::create_test_book(&pool, "Dune", "Frank Herbert", 0).await;
    let repo = PgLoanRepository::new(Arc::new(pool.clone()));

    let result = repo.borrow(new_loan(book_id)).await;

    assert!(matches!(result, Err(AppError::Conflict { .. })));
    assert_eq!(common::available_copies(&pool, book_id).await, 0);
}

#[sqlx::test]
async fn test_borrow_unknown_book_not_found(pool: PgPool) {
    common::create_test_student(&pool, REGNO).await;
    let repo = PgLoanRepository::new(Arc::new(pool));

    let result = repo.borrow(new_loan(999)).await;

    assert!(matches!(result, Err(AppError::NotFound { .. })));
}

#[sqlx::test]
async fn test_borrow_same_book_twice_conflicts_and_keeps_copies(pool: PgPool) {
    common::create_test_student(&pool, REGNO).await;
    let book_id = common::create_test_book(&pool, "Dune", "Frank Herbert", 3).await;
    let repo = PgLoanRepository::new(Arc::new(pool.clone()));

    repo.borrow(new_loan(book_id)).await.unwrap();
    let second = repo.borrow(new_loan(book_id)).await;

    assert!(matches!(second, Err(AppError::Conflict { .. })));
    assert_eq!(common::available_copies(&pool, book_id).await, 2);
}

#[sqlx::test]
async fn test_borrow_fulfils_reservation(pool: PgPool) {
    common::create_test_student(&pool, REGNO).await;
    let book_id = common::create_test_book(&pool, "Dune", "Frank Herbert", 1).await;
    let pool = Arc::new(pool);
    let reservations = PgReservationRepository::new(pool.clone());
    let loans = PgLoanRepository::new(pool);

    let reservation = reservations.create(REGNO, book_id).await.unwrap();
    loans
        .borrow(NewLoan {
            fulfils_reservation: Some(reservation.id),
            ..new_loan(book_id)
        })
        .await
        .unwrap();

    assert!(reservations.active_queue(book_id).await.unwrap().is_empty());
    let mine = reservations.for_student(REGNO).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert!(!mine[0].is_active());
}

#[sqlx::test]
async fn test_return_restores_copy(pool: PgPool) {
    common::create_test_student(&pool, REGNO).await;
    let book_id = common::create_test_book(&pool, "Dune", "Frank Herbert", 1).await;
    let repo = PgLoanRepository::new(Arc::new(pool.clone()));
    let loan = repo.borrow(new_loan(book_id)).await.unwrap();

    let outcome = repo.return_loan(loan.id, date(2026, 3, 10)).await.unwrap();

    assert!(outcome.copy_restored);
    assert_eq!(outcome.loan.actual_return_date, Some(date(2026, 3, 10)));
    assert_eq!(common::available_copies(&pool, book_id).await, 1);

    let again = repo.return_loan(loan.id, date(2026, 3, 11)).await;
    assert!(matches!(again, Err(AppError::Conflict { .. })));
    assert_eq!(common::available_copies(&pool, book_id).await, 1);
}

#[sqlx::test]
async fn test_return_after_book_deleted(pool: PgPool) {
    common::create_test_student(&pool, REGNO).await;
    let book_id = common::create_test_book(&pool, "Dune", "Frank Herbert", 1).await;
    let repo = PgLoanRepository::new(Arc::new(pool.clone()));
    let loan = repo.borrow(new_loan(book_id)).await.unwrap();
    sqlx::query("DELETE FROM books WHERE id = $1")
        .bind(book_id)
        .execute(&pool)
        .await
        .unwrap();

    let outcome = repo.return_loan(loan.id, date(2026, 3, 10)).await.unwrap();

    assert!(!outcome.copy_restored);
    assert_eq!(outcome.loan.book_id, None);
    assert_eq!(outcome.loan.book_title, "Dune");
}

#[sqlx::test]
async fn test_overdue_queries(pool: PgPool) {
    common::create_test_student(&pool, REGNO).await;
    let late = common::create_test_book(&pool, "Late", "A", 1).await;
    let fine = common::create_test_book(&pool, "On time", "B", 1).await;
    common::create_test_loan(&pool, REGNO, late, date(2026, 2, 1), date(2026, 2, 15)).await;
    common::create_test_loan(&pool, REGNO, fine, date(2026, 3, 1), date(2026, 3, 15)).await;
    let repo = PgLoanRepository::new(Arc::new(pool));

    let today = date(2026, 3, 10);
    let overdue = repo.overdue_for_student(REGNO, today).await.unwrap();

    assert_eq!(overdue.len(), 1);
    assert_eq!(overdue[0].book_title, "Late");
    assert_eq!(repo.count_overdue(today).await.unwrap(), 1);
    assert_eq!(repo.count_open().await.unwrap(), 2);
    assert_eq!(repo.open_for_student(REGNO).await.unwrap()[0].book_title, "Late");
}

#[sqlx::test]
async fn test_history_with_authors_and_borrow_dates(pool: PgPool) {
    common::create_test_student(&pool, REGNO).await;
    let a = common::create_test_book(&pool, "Dune", "Frank Herbert", 1).await;
    let b = common::create_test_book(&pool, "Emma", "Jane Austen", 1).await;
    common::create_test_loan(&pool, REGNO, a, date(2026, 1, 5), date(2026, 1, 19)).await;
    common::create_test_loan(&pool, REGNO, b, date(2026, 3, 1), date(2026, 3, 15)).await;
    let repo = PgLoanRepository::new(Arc::new(pool));

    let history = repo.history_with_authors(REGNO).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].loan.book_title, "Emma");
    assert_eq!(history[0].author.as_deref(), Some("Jane Austen"));

    let dates = repo.borrow_dates_since(date(2026, 2, 1)).await.unwrap();
    assert_eq!(dates, vec![date(2026, 3, 1)]);
}

#[sqlx::test]
async fn test_update_due_date(pool: PgPool) {
    common::create_test_student(&pool, REGNO).await;
    let book_id = common::create_test_book(&pool, "Dune", "Frank Herbert", 1).await;
    let loan_id =
        common::create_test_loan(&pool, REGNO, book_id, date(2026, 3, 1), date(2026, 3, 15)).await;
    let repo = PgLoanRepository::new(Arc::new(pool));

    let loan = repo.update_due_date(loan_id, date(2026, 3, 29)).await.unwrap();

    assert_eq!(loan.due_date, date(2026, 3, 29));
    assert!(matches!(
        repo.update_due_date(loan_id + 1, date(2026, 3, 29)).await,
        Err(AppError::NotFound { .. })
    ));
}

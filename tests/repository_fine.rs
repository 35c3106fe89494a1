mod common;

use common::date;
use library_portal::domain::entities::{FineStatus, NewPayment};
use library_portal::domain::repositories::FineRepository;
use library_portal::error::AppError;
use library_portal::infrastructure::persistence::PgFineRepository;
use sqlx::PgPool;
use std::sync::Arc;

const REGNO: &str = "21091A0501";

async fn overdue_loan(pool: &PgPool) -> i64 {
    common::create_test_student(pool, REGNO).await;
    let book_id = common::create_test_book(pool, "Dune", "Frank Herbert", 1).await;
    common::create_test_loan(pool, REGNO, book_id, date(2026, 2, 1), date(2026, 2, 15)).await
}

fn payment(fine_id: i64, amount_paise: i64, transaction_id: &str) -> NewPayment {
    NewPayment {
        fine_id,
        amount_paise,
        transaction_id: transaction_id.to_string(),
    }
}

#[sqlx::test]
async fn test_create_fine_once_per_loan(pool: PgPool) {
    let loan_id = overdue_loan(&pool).await;
    let repo = PgFineRepository::new(Arc::new(pool));

    let fine = repo
        .create(REGNO, loan_id, 6_000, date(2026, 2, 15))
        .await
        .unwrap();

    assert_eq!(fine.accrued_paise, 6_000);
    assert_eq!(fine.paid_paise, 0);
    assert_eq!(fine.status, FineStatus::Active);
    assert_eq!(
        repo.find_for_loan(loan_id).await.unwrap().map(|f| f.id),
        Some(fine.id)
    );

    let duplicate = repo.create(REGNO, loan_id, 8_000, date(2026, 2, 15)).await;
    assert!(matches!(duplicate, Err(AppError::Conflict { .. })));
}

#[sqlx::test]
async fn test_raise_accrued_never_lowers(pool: PgPool) {
    let loan_id = overdue_loan(&pool).await;
    let fine_id = common::create_test_fine(&pool, REGNO, loan_id, 6_000).await;
    let repo = PgFineRepository::new(Arc::new(pool));

    let raised = repo.raise_accrued(fine_id, 10_000).await.unwrap();
    assert_eq!(raised.accrued_paise, 10_000);

    let unchanged = repo.raise_accrued(fine_id, 4_000).await.unwrap();
    assert_eq!(unchanged.accrued_paise, 10_000);
}

#[sqlx::test]
async fn test_raise_reopens_paid_fine(pool: PgPool) {
    let loan_id = overdue_loan(&pool).await;
    let fine_id = common::create_test_fine(&pool, REGNO, loan_id, 6_000).await;
    let repo = PgFineRepository::new(Arc::new(pool));
    let (paid, _) = repo
        .record_payment(payment(fine_id, 6_000, "TXN-1"))
        .await
        .unwrap();
    assert_eq!(paid.status, FineStatus::Paid);

    let reopened = repo.raise_accrued(fine_id, 8_000).await.unwrap();

    assert_eq!(reopened.status, FineStatus::Active);
    assert_eq!(reopened.paid_paise, 6_000);
    assert_eq!(repo.outstanding_total(REGNO).await.unwrap(), 2_000);
}

#[sqlx::test]
async fn test_partial_payment(pool: PgPool) {
    let loan_id = overdue_loan(&pool).await;
    let fine_id = common::create_test_fine(&pool, REGNO, loan_id, 6_000).await;
    let repo = PgFineRepository::new(Arc::new(pool));

    let (fine, recorded) = repo
        .record_payment(payment(fine_id, 2_500, "TXN-1"))
        .await
        .unwrap();

    assert_eq!(fine.paid_paise, 2_500);
    assert_eq!(fine.status, FineStatus::Active);
    assert_eq!(recorded.amount_paise, 2_500);
    assert_eq!(recorded.transaction_id.as_deref(), Some("TXN-1"));
    assert_eq!(repo.outstanding_total(REGNO).await.unwrap(), 3_500);

    let history = repo.payment_history(REGNO).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].book_title, "Dune");
}

#[sqlx::test]
async fn test_overpayment_rejected(pool: PgPool) {
    let loan_id = overdue_loan(&pool).await;
    let fine_id = common::create_test_fine(&pool, REGNO, loan_id, 6_000).await;
    let repo = PgFineRepository::new(Arc::new(pool));

    let result = repo.record_payment(payment(fine_id, 6_001, "TXN-1")).await;

    assert!(matches!(result, Err(AppError::Validation { .. })));
    assert_eq!(repo.outstanding_total(REGNO).await.unwrap(), 6_000);
    assert!(repo.payment_history(REGNO).await.unwrap().is_empty());
}

#[sqlx::test]
async fn test_payment_for_unknown_fine(pool: PgPool) {
    let repo = PgFineRepository::new(Arc::new(pool));

    let result = repo.record_payment(payment(42, 100, "TXN-1")).await;

    assert!(matches!(result, Err(AppError::NotFound { .. })));
}

#[sqlx::test]
async fn test_active_fines_and_listing(pool: PgPool) {
    let loan_id = overdue_loan(&pool).await;
    let fine_id = common::create_test_fine(&pool, REGNO, loan_id, 6_000).await;
    let repo = PgFineRepository::new(Arc::new(pool));

    let active = repo.active_for_student(REGNO).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].fine.id, fine_id);
    assert_eq!(active[0].loan_due_date, date(2026, 2, 15));

    assert_eq!(repo.list(Some(REGNO.to_string())).await.unwrap().len(), 1);
    assert!(repo.list(Some("OTHER".to_string())).await.unwrap().is_empty());
    assert_eq!(repo.list(None).await.unwrap().len(), 1);
}

#[sqlx::test]
async fn test_settle_cleared(pool: PgPool) {
    let loan_id = overdue_loan(&pool).await;
    let fine_id = common::create_test_fine(&pool, REGNO, loan_id, 0).await;
    let repo = PgFineRepository::new(Arc::new(pool));

    let settled = repo.settle_cleared(REGNO).await.unwrap();

    assert_eq!(settled, 1);
    let fine = repo.find(fine_id).await.unwrap().unwrap();
    assert_eq!(fine.status, FineStatus::Paid);
}

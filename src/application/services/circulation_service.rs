//! Borrowing, returning and reservation queues.

use chrono::NaiveDate;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

use super::FineService;
use crate::domain::entities::{
    Book, Loan, NewLoan, Reservation, Student, queue_position,
};
use crate::domain::mail::{MailMessage, Notifier};
use crate::domain::policy::{LibraryPolicy, Reminder};
use crate::domain::repositories::{
    BookRepository, LoanRepository, ReservationRepository, StudentRepository,
};
use crate::error::AppError;
use crate::infrastructure::predictor::{LateFeatures, LatePredictor};

/// A recorded loan, plus whether the late-return model expects it back late.
#[derive(Debug, Clone, PartialEq)]
pub struct BorrowOutcome {
    pub loan: Loan,
    pub predicted_late: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReserveOutcome {
    Queued { position: usize },
    AlreadyQueued { position: usize },
}

/// Queue state shown before reserving.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueView {
    pub book: Book,
    pub queue_length: usize,
    /// The student's own place, if already queued.
    pub position: Option<usize>,
}

/// An open loan with the borrower's email, for the admin overview.
#[derive(Debug, Clone, PartialEq)]
pub struct LoanWithEmail {
    pub loan: Loan,
    pub email: String,
}

pub struct CirculationService {
    books: Arc<dyn BookRepository>,
    students: Arc<dyn StudentRepository>,
    loans: Arc<dyn LoanRepository>,
    reservations: Arc<dyn ReservationRepository>,
    fines: Arc<FineService>,
    predictor: Arc<dyn LatePredictor>,
    notifier: Notifier,
    policy: LibraryPolicy,
}

impl CirculationService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        books: Arc<dyn BookRepository>,
        students: Arc<dyn StudentRepository>,
        loans: Arc<dyn LoanRepository>,
        reservations: Arc<dyn ReservationRepository>,
        fines: Arc<FineService>,
        predictor: Arc<dyn LatePredictor>,
        notifier: Notifier,
        policy: LibraryPolicy,
    ) -> Self {
        Self {
            books,
            students,
            loans,
            reservations,
            fines,
            predictor,
            notifier,
            policy,
        }
    }

    async fn student(&self, regno: &str) -> Result<Student, AppError> {
        self.students
            .find(regno)
            .await?
            .ok_or_else(|| AppError::not_found("Student not found.", json!({ "regno": regno })))
    }

    async fn book(&self, book_id: i64) -> Result<Book, AppError> {
        self.books
            .find_by_id(book_id)
            .await?
            .ok_or_else(|| AppError::not_found("Book not found.", json!({ "book_id": book_id })))
    }

    /// Lends a copy of a book.
    ///
    /// When the book has a reservation queue only its head may borrow, and
    /// doing so fulfils that reservation.
    ///
    /// # Errors
    ///
    /// - [`AppError::NotFound`] for an unknown student or book
    /// - [`AppError::Conflict`] when someone else heads the queue, no copy is
    ///   left or the student already has the book
    /// - [`AppError::Forbidden`] when outstanding fines reach the borrow limit
    pub async fn borrow(
        &self,
        regno: &str,
        book_id: i64,
        today: NaiveDate,
    ) -> Result<BorrowOutcome, AppError> {
        self.student(regno).await?;
        let book = self.book(book_id).await?;

        let queue = self.reservations.active_queue(book_id).await?;
        let fulfils_reservation = match queue.first() {
            Some(head) if head.regno != regno => {
                return Err(AppError::conflict(
                    "This book is reserved by another student.",
                    json!({ "book_id": book_id }),
                ));
            }
            Some(head) => Some(head.id),
            None => None,
        };

        if !book.is_available() {
            return Err(AppError::conflict(
                "Book not available.",
                json!({ "book_id": book_id }),
            ));
        }

        self.fines.accrue_for_student(regno, today).await?;
        let outstanding = self.fines.outstanding_total(regno).await?;
        if !self.policy.can_borrow(outstanding) {
            return Err(AppError::forbidden(
                format!(
                    "Your outstanding fines of {outstanding} reach the borrowing limit of {}. Please pay your fines first.",
                    self.policy.borrow_limit()
                ),
                json!({ "outstanding": outstanding.paise() }),
            ));
        }

        let features = self.late_features(regno).await;

        let loan = self
            .loans
            .borrow(NewLoan {
                regno: regno.to_string(),
                book_id,
                borrow_date: today,
                due_date: self.policy.due_date(today),
                fulfils_reservation,
            })
            .await?;

        tracing::info!(
            regno,
            book_id,
            loan_id = loan.id,
            due = %loan.due_date,
            reservation = ?fulfils_reservation,
            "Book borrowed"
        );

        let predicted_late = features.is_some_and(|f| self.predict_late(regno, &f));
        Ok(BorrowOutcome {
            loan,
            predicted_late,
        })
    }

    /// Model inputs from the loans the student had before this borrow.
    async fn late_features(&self, regno: &str) -> Option<LateFeatures> {
        if !self.predictor.is_enabled() {
            return None;
        }

        match self.loans.history(regno).await {
            Ok(history) => Some(LateFeatures::from_history(&history)),
            Err(e) => {
                tracing::warn!(regno, error = %e, "Skipping late return prediction");
                None
            }
        }
    }

    fn predict_late(&self, regno: &str, features: &LateFeatures) -> bool {
        let late = self.predictor.predict_late(features) == Some(true);
        tracing::debug!(regno, ?features, late, "Late return prediction");
        late
    }

    /// Returns a loan and puts the copy back on the shelf.
    ///
    /// # Errors
    ///
    /// - [`AppError::Forbidden`] when the student owes fines or the loan is
    ///   someone else's
    /// - [`AppError::NotFound`] for an unknown loan
    /// - [`AppError::Conflict`] when the loan is already closed
    pub async fn return_book(
        &self,
        regno: &str,
        loan_id: i64,
        today: NaiveDate,
    ) -> Result<Loan, AppError> {
        let loan = self.loan_for(regno, loan_id).await?;
        if !loan.is_open() {
            return Err(AppError::conflict(
                "This book has already been returned.",
                json!({ "loan_id": loan_id }),
            ));
        }

        self.fines.accrue_for_student(regno, today).await?;
        let outstanding = self.fines.outstanding_total(regno).await?;
        if outstanding.is_positive() {
            return Err(AppError::forbidden(
                format!("You have outstanding fines of {outstanding}. Please pay them before returning books."),
                json!({ "outstanding": outstanding.paise() }),
            ));
        }

        let outcome = self.loans.return_loan(loan_id, today).await?;
        if !outcome.copy_restored {
            tracing::warn!(regno, loan_id, title = %outcome.loan.book_title, "Returned book is no longer in the catalog");
        }

        tracing::info!(regno, loan_id, book_id = ?outcome.loan.book_id, "Book returned");
        Ok(outcome.loan)
    }

    /// Any loan, for admin pages.
    pub async fn loan(&self, loan_id: i64) -> Result<Loan, AppError> {
        self.loans
            .find(loan_id)
            .await?
            .ok_or_else(|| AppError::not_found("Loan not found.", json!({ "loan_id": loan_id })))
    }

    /// A loan owned by `regno`.
    pub async fn loan_for(&self, regno: &str, loan_id: i64) -> Result<Loan, AppError> {
        let loan = self.loan(loan_id).await?;
        if loan.regno != regno {
            return Err(AppError::forbidden(
                "This loan does not belong to you.",
                json!({ "loan_id": loan_id }),
            ));
        }
        Ok(loan)
    }

    pub async fn queue_view(&self, regno: &str, book_id: i64) -> Result<QueueView, AppError> {
        let book = self.book(book_id).await?;
        let queue = self.reservations.active_queue(book_id).await?;

        Ok(QueueView {
            book,
            queue_length: queue.len(),
            position: queue_position(&queue, regno),
        })
    }

    /// Joins the reservation queue of a book.
    pub async fn reserve(&self, regno: &str, book_id: i64) -> Result<ReserveOutcome, AppError> {
        self.book(book_id).await?;
        let queue = self.reservations.active_queue(book_id).await?;

        if let Some(position) = queue_position(&queue, regno) {
            return Ok(ReserveOutcome::AlreadyQueued { position });
        }

        self.reservations.create(regno, book_id).await?;
        let position = queue.len() + 1;

        tracing::info!(regno, book_id, position, "Book reserved");
        Ok(ReserveOutcome::Queued { position })
    }

    pub async fn reservations_for(&self, regno: &str) -> Result<Vec<Reservation>, AppError> {
        self.reservations.for_student(regno).await
    }

    pub async fn all_reservations(&self) -> Result<Vec<Reservation>, AppError> {
        self.reservations.all().await
    }

    pub async fn open_loans(&self, regno: &str) -> Result<Vec<Loan>, AppError> {
        self.loans.open_for_student(regno).await
    }

    /// Every open loan with its borrower's email.
    pub async fn borrowed_books(&self) -> Result<Vec<LoanWithEmail>, AppError> {
        let emails = self.email_index().await?;
        let loans = self.loans.all_open().await?;

        Ok(loans
            .into_iter()
            .map(|loan| LoanWithEmail {
                email: emails.get(&loan.regno).cloned().unwrap_or_default(),
                loan,
            })
            .collect())
    }

    async fn email_index(&self) -> Result<HashMap<String, String>, AppError> {
        Ok(self
            .students
            .list()
            .await?
            .into_iter()
            .map(|s| (s.regno, s.email))
            .collect())
    }

    /// A student with their full loan history.
    pub async fn student_record(&self, regno: &str) -> Result<(Student, Vec<Loan>), AppError> {
        let student = self.student(regno).await?;
        let loans = self.loans.history(regno).await?;
        Ok((student, loans))
    }

    /// Moves a loan's due date and tells the student.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] unless `due_date` is `YYYY-MM-DD`.
    pub async fn edit_due_date(&self, loan_id: i64, due_date: &str) -> Result<Loan, AppError> {
        let due_date = NaiveDate::parse_from_str(due_date.trim(), "%Y-%m-%d").map_err(|_| {
            AppError::bad_request(
                "Invalid date format. Use YYYY-MM-DD.",
                json!({ "due_date": due_date }),
            )
        })?;

        let loan = self.loans.update_due_date(loan_id, due_date).await?;
        tracing::info!(loan_id, regno = %loan.regno, due = %due_date, "Due date changed");

        if let Some(student) = self.students.find(&loan.regno).await? {
            self.notifier.send(MailMessage::due_date_changed(
                &student.email,
                &loan.regno,
                &loan.book_title,
                due_date,
            ));
        }

        Ok(loan)
    }

    /// Mails overdue and due-soon reminders. Returns how many were queued.
    pub async fn send_reminders(&self, today: NaiveDate) -> Result<usize, AppError> {
        let emails = self.email_index().await?;
        let mut sent = 0;

        for loan in self.loans.all_open().await? {
            let Some(reminder) = self.policy.reminder_for(&loan, today) else {
                continue;
            };
            let Some(email) = emails.get(&loan.regno) else {
                continue;
            };

            let message = match reminder {
                Reminder::Overdue { .. } => {
                    MailMessage::overdue_reminder(email, &loan.regno, &loan.book_title, loan.due_date)
                }
                Reminder::DueSoon { .. } => {
                    MailMessage::due_soon_reminder(email, &loan.regno, &loan.book_title, loan.due_date)
                }
            };

            if self.notifier.send(message) {
                sent += 1;
            }
        }

        tracing::info!(sent, "Reminders queued");
        Ok(sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{ReservationStatus, ReturnOutcome};
    use crate::domain::repositories::{
        MockBookRepository, MockFineRepository, MockLoanRepository, MockReservationRepository,
        MockStudentRepository,
    };
    use crate::infrastructure::predictor::MockLatePredictor;
    use chrono::Utc;
    use tokio::sync::mpsc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn today() -> NaiveDate {
        date(2026, 3, 1)
    }

    fn reservation(id: i64, regno: &str) -> Reservation {
        Reservation {
            id,
            regno: regno.into(),
            book_id: 1,
            book_title: "Dune".into(),
            reserved_at: Utc::now(),
            status: ReservationStatus::Active,
        }
    }

    fn loan(id: i64, regno: &str, due: NaiveDate) -> Loan {
        Loan::new(id, regno.into(), Some(1), "Dune".into(), date(2026, 2, 1), due)
    }

    struct Mocks {
        books: MockBookRepository,
        students: MockStudentRepository,
        loans: MockLoanRepository,
        reservations: MockReservationRepository,
        fines: MockFineRepository,
        predictor: MockLatePredictor,
    }

    impl Mocks {
        fn new() -> Self {
            let mut students = MockStudentRepository::new();
            students.expect_find().returning(|regno| {
                Ok(Some(Student::new(
                    regno.to_string(),
                    format!("{}@rgmcet.edu.in", regno.to_lowercase()),
                    None,
                )))
            });
            let mut books = MockBookRepository::new();
            books
                .expect_find_by_id()
                .returning(|id| Ok(Some(Book::new(id, "Dune".into(), "Frank Herbert".into(), 1))));
            let mut predictor = MockLatePredictor::new();
            predictor.expect_is_enabled().return_const(false);

            Self {
                books,
                students,
                loans: MockLoanRepository::new(),
                reservations: MockReservationRepository::new(),
                fines: MockFineRepository::new(),
                predictor,
            }
        }

        fn no_fines(mut self) -> Self {
            self.loans
                .expect_overdue_for_student()
                .returning(|_, _| Ok(vec![]));
            self.fines.expect_settle_cleared().returning(|_| Ok(0));
            self.fines.expect_outstanding_total().returning(|_| Ok(0));
            self
        }

        fn build(self) -> (CirculationService, mpsc::Receiver<MailMessage>) {
            let (tx, rx) = mpsc::channel(16);
            let notifier = Notifier::new(tx);
            let loans: Arc<dyn LoanRepository> = Arc::new(self.loans);
            let students: Arc<dyn StudentRepository> = Arc::new(self.students);
            let fines = Arc::new(FineService::new(
                Arc::new(self.fines),
                loans.clone(),
                students.clone(),
                notifier.clone(),
                LibraryPolicy::default(),
            ));

            let service = CirculationService::new(
                Arc::new(self.books),
                students,
                loans,
                Arc::new(self.reservations),
                fines,
                Arc::new(self.predictor),
                notifier,
                LibraryPolicy::default(),
            );
            (service, rx)
        }
    }

    #[tokio::test]
    async fn test_borrow_sets_due_date() {
        let mut mocks = Mocks::new().no_fines();
        mocks
            .reservations
            .expect_active_queue()
            .returning(|_| Ok(vec![]));
        mocks
            .loans
            .expect_borrow()
            .withf(|l| l.due_date == date(2026, 3, 15) && l.fulfils_reservation.is_none())
            .times(1)
            .returning(|l| Ok(loan(1, &l.regno, l.due_date)));

        let (service, _rx) = mocks.build();
        let outcome = service.borrow("R1", 1, today()).await.unwrap();

        assert_eq!(outcome.loan.due_date, date(2026, 3, 15));
        assert!(!outcome.predicted_late);
    }

    #[tokio::test]
    async fn test_borrow_blocked_by_other_reservation() {
        let mut mocks = Mocks::new();
        mocks
            .reservations
            .expect_active_queue()
            .returning(|_| Ok(vec![reservation(4, "R2"), reservation(5, "R1")]));
        mocks.loans.expect_borrow().never();

        let (service, _rx) = mocks.build();
        let err = service.borrow("R1", 1, today()).await.unwrap_err();

        assert_eq!(err.message(), "This book is reserved by another student.");
    }

    #[tokio::test]
    async fn test_borrow_by_queue_head_fulfils_reservation() {
        let mut mocks = Mocks::new().no_fines();
        mocks
            .reservations
            .expect_active_queue()
            .returning(|_| Ok(vec![reservation(4, "R1"), reservation(5, "R2")]));
        mocks
            .loans
            .expect_borrow()
            .withf(|l| l.fulfils_reservation == Some(4))
            .times(1)
            .returning(|l| Ok(loan(1, &l.regno, l.due_date)));

        let (service, _rx) = mocks.build();
        assert!(service.borrow("R1", 1, today()).await.is_ok());
    }

    #[tokio::test]
    async fn test_borrow_without_copies() {
        let mut mocks = Mocks::new();
        mocks.books = MockBookRepository::new();
        mocks
            .books
            .expect_find_by_id()
            .returning(|id| Ok(Some(Book::new(id, "Dune".into(), "Frank Herbert".into(), 0))));
        mocks
            .reservations
            .expect_active_queue()
            .returning(|_| Ok(vec![]));
        mocks.loans.expect_borrow().never();

        let (service, _rx) = mocks.build();
        let result = service.borrow("R1", 1, today()).await;

        assert!(matches!(result, Err(AppError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_borrow_blocked_at_fine_limit() {
        let mut mocks = Mocks::new();
        mocks
            .reservations
            .expect_active_queue()
            .returning(|_| Ok(vec![]));
        mocks
            .loans
            .expect_overdue_for_student()
            .returning(|_, _| Ok(vec![]));
        mocks.fines.expect_settle_cleared().returning(|_| Ok(0));
        mocks
            .fines
            .expect_outstanding_total()
            .returning(|_| Ok(100_000));
        mocks.loans.expect_borrow().never();

        let (service, _rx) = mocks.build();
        let result = service.borrow("R1", 1, today()).await;

        assert!(matches!(result, Err(AppError::Forbidden { .. })));
    }

    #[tokio::test]
    async fn test_borrow_reports_predicted_late_return() {
        let mut mocks = Mocks::new().no_fines();
        mocks.predictor = MockLatePredictor::new();
        mocks.predictor.expect_is_enabled().return_const(true);
        mocks
            .predictor
            .expect_predict_late()
            .withf(|f| f.borrow_count == 2.0 && f.avg_days_late == 3.0)
            .times(1)
            .return_const(Some(true));
        mocks
            .reservations
            .expect_active_queue()
            .returning(|_| Ok(vec![]));
        mocks
            .loans
            .expect_history()
            .times(1)
            .returning(|regno| {
                let mut late = loan(1, regno, date(2026, 1, 10));
                late.actual_return_date = Some(date(2026, 1, 13));
                let mut on_time = loan(2, regno, date(2026, 2, 10));
                on_time.actual_return_date = Some(date(2026, 2, 9));
                Ok(vec![late, on_time])
            });
        mocks
            .loans
            .expect_borrow()
            .times(1)
            .returning(|l| Ok(loan(3, &l.regno, l.due_date)));

        let (service, _rx) = mocks.build();
        let outcome = service.borrow("R1", 1, today()).await.unwrap();

        assert!(outcome.predicted_late);
    }

    #[tokio::test]
    async fn test_return_blocked_by_outstanding_fine() {
        let mut mocks = Mocks::new();
        mocks
            .loans
            .expect_find()
            .returning(|id| Ok(Some(loan(id, "R1", date(2026, 2, 20)))));
        mocks
            .loans
            .expect_overdue_for_student()
            .returning(|_, _| Ok(vec![]));
        mocks.fines.expect_settle_cleared().returning(|_| Ok(0));
        mocks.fines.expect_outstanding_total().returning(|_| Ok(4_000));
        mocks.loans.expect_return_loan().never();

        let (service, _rx) = mocks.build();
        let result = service.return_book("R1", 3, today()).await;

        assert!(matches!(result, Err(AppError::Forbidden { .. })));
    }

    #[tokio::test]
    async fn test_return_other_students_loan() {
        let mut mocks = Mocks::new();
        mocks
            .loans
            .expect_find()
            .returning(|id| Ok(Some(loan(id, "R2", date(2026, 3, 10)))));
        mocks.loans.expect_return_loan().never();

        let (service, _rx) = mocks.build();
        let result = service.return_book("R1", 3, today()).await;

        assert!(matches!(result, Err(AppError::Forbidden { .. })));
    }

    #[tokio::test]
    async fn test_return_success() {
        let mut mocks = Mocks::new().no_fines();
        mocks
            .loans
            .expect_find()
            .returning(|id| Ok(Some(loan(id, "R1", date(2026, 3, 10)))));
        mocks
            .loans
            .expect_return_loan()
            .withf(|id, day| *id == 3 && *day == date(2026, 3, 1))
            .times(1)
            .returning(|id, day| {
                let mut returned = loan(id, "R1", date(2026, 3, 10));
                returned.actual_return_date = Some(day);
                Ok(ReturnOutcome {
                    loan: returned,
                    copy_restored: true,
                })
            });

        let (service, _rx) = mocks.build();
        let returned = service.return_book("R1", 3, today()).await.unwrap();

        assert_eq!(returned.actual_return_date, Some(today()));
    }

    #[tokio::test]
    async fn test_reserve_reports_existing_position() {
        let mut mocks = Mocks::new();
        mocks
            .reservations
            .expect_active_queue()
            .returning(|_| Ok(vec![reservation(4, "R2"), reservation(5, "R1")]));
        mocks.reservations.expect_create().never();

        let (service, _rx) = mocks.build();
        let outcome = service.reserve("R1", 1).await.unwrap();

        assert_eq!(outcome, ReserveOutcome::AlreadyQueued { position: 2 });
    }

    #[tokio::test]
    async fn test_reserve_joins_end_of_queue() {
        let mut mocks = Mocks::new();
        mocks
            .reservations
            .expect_active_queue()
            .returning(|_| Ok(vec![reservation(4, "R2")]));
        mocks
            .reservations
            .expect_create()
            .times(1)
            .returning(|regno, _| Ok(reservation(6, regno)));

        let (service, _rx) = mocks.build();
        let outcome = service.reserve("R1", 1).await.unwrap();

        assert_eq!(outcome, ReserveOutcome::Queued { position: 2 });
    }

    #[tokio::test]
    async fn test_edit_due_date_rejects_bad_format() {
        let mut mocks = Mocks::new();
        mocks.loans.expect_update_due_date().never();

        let (service, _rx) = mocks.build();
        let result = service.edit_due_date(1, "15/03/2026").await;

        assert!(matches!(result, Err(AppError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_edit_due_date_mails_student() {
        let mut mocks = Mocks::new();
        mocks
            .loans
            .expect_update_due_date()
            .returning(|id, due| Ok(loan(id, "R1", due)));

        let (service, mut rx) = mocks.build();
        let loan = service.edit_due_date(1, "2026-04-01").await.unwrap();

        assert_eq!(loan.due_date, date(2026, 4, 1));
        assert_eq!(rx.try_recv().unwrap().to, "r1@rgmcet.edu.in");
    }

    #[tokio::test]
    async fn test_send_reminders() {
        let mut mocks = Mocks::new();
        mocks.students.expect_list().returning(|| {
            Ok(vec![
                Student::new("R1".into(), "r1@rgmcet.edu.in".into(), None),
                Student::new("R2".into(), "r2@rgmcet.edu.in".into(), None),
            ])
        });
        mocks.loans.expect_all_open().returning(|| {
            Ok(vec![
                loan(1, "R1", date(2026, 2, 25)),
                loan(2, "R2", date(2026, 3, 2)),
                loan(3, "R2", date(2026, 3, 20)),
            ])
        });

        let (service, mut rx) = mocks.build();
        let sent = service.send_reminders(today()).await.unwrap();

        assert_eq!(sent, 2);
        assert!(rx.try_recv().unwrap().subject.contains("Overdue"));
    }
}

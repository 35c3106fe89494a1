//! Circulation entities: loans and reservations.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// A borrowed book. The title is kept so history survives book deletion.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Loan {
    pub id: i64,
    pub regno: String,
    pub book_id: Option<i64>,
    pub book_title: String,
    pub borrow_date: NaiveDate,
    pub due_date: NaiveDate,
    pub actual_return_date: Option<NaiveDate>,
}

impl Loan {
    pub fn new(
        id: i64,
        regno: String,
        book_id: Option<i64>,
        book_title: String,
        borrow_date: NaiveDate,
        due_date: NaiveDate,
    ) -> Self {
        Self {
            id,
            regno,
            book_id,
            book_title,
            borrow_date,
            due_date,
            actual_return_date: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.actual_return_date.is_none()
    }

    /// Whole days past the due date as of `today`, zero when not late.
    pub fn days_overdue(&self, today: NaiveDate) -> i64 {
        (today - self.due_date).num_days().max(0)
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.is_open() && self.days_overdue(today) > 0
    }

    /// Days between the due date and the return, for returned loans.
    ///
    /// Negative when the book came back early.
    pub fn days_late(&self) -> Option<i64> {
        self.actual_return_date
            .map(|returned| (returned - self.due_date).num_days())
    }

    /// Days left until the due date; negative once overdue.
    pub fn days_left(&self, today: NaiveDate) -> i64 {
        (self.due_date - today).num_days()
    }
}

/// Input data for recording a loan.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLoan {
    pub regno: String,
    pub book_id: i64,
    pub borrow_date: NaiveDate,
    pub due_date: NaiveDate,
    /// Reservation consumed by this loan, if the borrower headed the queue.
    pub fulfils_reservation: Option<i64>,
}

/// Outcome of closing a loan.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnOutcome {
    pub loan: Loan,
    /// False when the book was deleted while on loan.
    pub copy_restored: bool,
}

/// A loan together with the author of its book, when the book still exists.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct LoanWithAuthor {
    #[sqlx(flatten)]
    pub loan: Loan,
    pub author: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Active,
    Fulfilled,
}

impl ReservationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Fulfilled => "fulfilled",
        }
    }
}

impl TryFrom<String> for ReservationStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "active" => Ok(Self::Active),
            "fulfilled" => Ok(Self::Fulfilled),
            other => Err(format!("unknown reservation status '{other}'")),
        }
    }
}

/// A place in a book's waiting queue, joined with the book title.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Reservation {
    pub id: i64,
    pub regno: String,
    pub book_id: i64,
    pub book_title: String,
    pub reserved_at: DateTime<Utc>,
    #[sqlx(try_from = "String")]
    pub status: ReservationStatus,
}

impl Reservation {
    pub fn is_active(&self) -> bool {
        self.status == ReservationStatus::Active
    }
}

/// 1-based position of `regno` in an ordered active queue.
pub fn queue_position(queue: &[Reservation], regno: &str) -> Option<usize> {
    queue.iter().position(|r| r.regno == regno).map(|i| i + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn loan() -> Loan {
        Loan::new(
            1,
            "R1".into(),
            Some(10),
            "Dune".into(),
            date(2026, 3, 1),
            date(2026, 3, 15),
        )
    }

    #[test]
    fn test_overdue_days() {
        let loan = loan();
        assert_eq!(loan.days_overdue(date(2026, 3, 10)), 0);
        assert_eq!(loan.days_overdue(date(2026, 3, 15)), 0);
        assert_eq!(loan.days_overdue(date(2026, 3, 18)), 3);
        assert!(loan.is_overdue(date(2026, 3, 16)));
        assert!(!loan.is_overdue(date(2026, 3, 15)));
    }

    #[test]
    fn test_returned_loan_is_not_overdue() {
        let mut loan = loan();
        loan.actual_return_date = Some(date(2026, 3, 20));
        assert!(!loan.is_open());
        assert!(!loan.is_overdue(date(2026, 4, 1)));
        assert_eq!(loan.days_late(), Some(5));
    }

    #[test]
    fn test_days_left() {
        let loan = loan();
        assert_eq!(loan.days_left(date(2026, 3, 13)), 2);
        assert_eq!(loan.days_left(date(2026, 3, 17)), -2);
    }

    #[test]
    fn test_queue_position() {
        let make = |id, regno: &str| Reservation {
            id,
            regno: regno.into(),
            book_id: 10,
            book_title: "Dune".into(),
            reserved_at: Utc::now(),
            status: ReservationStatus::Active,
        };
        let queue = vec![make(1, "A"), make(2, "B")];
        assert_eq!(queue_position(&queue, "A"), Some(1));
        assert_eq!(queue_position(&queue, "B"), Some(2));
        assert_eq!(queue_position(&queue, "C"), None);
    }
}

//! Display rows shared by several templates.
//!
//! Templates stay free of date arithmetic and money formatting; handlers
//! build these rows with today's date and the library policy.

use chrono::NaiveDate;

use crate::domain::analytics::MonthCount;
use crate::domain::entities::{Book, FineDetail, Loan, PaymentRecord, RatingSummary};
use crate::domain::policy::LibraryPolicy;

/// One loan as shown in history, return and admin tables.
#[derive(Debug, Clone, PartialEq)]
pub struct LoanRow {
    pub id: i64,
    pub regno: String,
    pub title: String,
    pub in_catalog: bool,
    pub borrow_date: String,
    pub due_date: String,
    pub returned_on: String,
    pub is_open: bool,
    pub is_overdue: bool,
    /// `Borrowed`, `Overdue`, `Returned` or `Returned late`.
    pub status: &'static str,
    /// Days overdue for open loans, days late for returned ones.
    pub days_late: i64,
    pub days_left: i64,
}

impl LoanRow {
    pub fn new(loan: &Loan, today: NaiveDate) -> Self {
        let days_late = match loan.days_late() {
            Some(days) => days.max(0),
            None => loan.days_overdue(today),
        };
        let status = match (loan.is_open(), days_late > 0) {
            (true, true) => "Overdue",
            (true, false) => "Borrowed",
            (false, true) => "Returned late",
            (false, false) => "Returned",
        };

        Self {
            id: loan.id,
            regno: loan.regno.clone(),
            title: loan.book_title.clone(),
            in_catalog: loan.book_id.is_some(),
            borrow_date: loan.borrow_date.to_string(),
            due_date: loan.due_date.to_string(),
            returned_on: loan
                .actual_return_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string()),
            is_open: loan.is_open(),
            is_overdue: loan.is_overdue(today),
            status,
            days_late,
            days_left: loan.days_left(today),
        }
    }

    pub fn rows(loans: &[Loan], today: NaiveDate) -> Vec<Self> {
        loans.iter().map(|loan| Self::new(loan, today)).collect()
    }
}

/// One fine with the amounts already formatted.
#[derive(Debug, Clone, PartialEq)]
pub struct FineRow {
    pub id: i64,
    pub regno: String,
    pub title: String,
    pub loan_due_date: String,
    pub returned_on: String,
    pub days_overdue: i64,
    pub accrued: String,
    pub paid: String,
    pub outstanding: String,
    pub minimum_payment: String,
    pub status: &'static str,
    pub payable: bool,
}

impl FineRow {
    pub fn new(detail: &FineDetail, today: NaiveDate, policy: &LibraryPolicy) -> Self {
        let outstanding = detail.fine.outstanding();
        Self {
            id: detail.fine.id,
            regno: detail.fine.regno.clone(),
            title: detail.book_title.clone(),
            loan_due_date: detail.loan_due_date.to_string(),
            returned_on: detail
                .returned_on
                .map(|d| d.to_string())
                .unwrap_or_else(|| "Not returned".to_string()),
            days_overdue: detail.days_overdue(today),
            accrued: detail.fine.accrued().to_string(),
            paid: detail.fine.paid().to_string(),
            outstanding: outstanding.to_string(),
            minimum_payment: policy.minimum_payment(outstanding).to_string(),
            status: detail.fine.status.as_str(),
            payable: detail.fine.is_active() && outstanding.is_positive(),
        }
    }

    pub fn rows(details: &[FineDetail], today: NaiveDate, policy: &LibraryPolicy) -> Vec<Self> {
        details
            .iter()
            .map(|detail| Self::new(detail, today, policy))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRow {
    pub title: String,
    pub amount: String,
    pub date: String,
    pub method: String,
    pub transaction_id: String,
}

impl From<&PaymentRecord> for PaymentRow {
    fn from(record: &PaymentRecord) -> Self {
        Self {
            title: record.book_title.clone(),
            amount: record.payment.amount().to_string(),
            date: record.payment.payment_date.format("%Y-%m-%d %H:%M").to_string(),
            method: record.payment.payment_method.clone(),
            transaction_id: record.payment.transaction_id.clone().unwrap_or_default(),
        }
    }
}

/// A catalog entry with its rating summary, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct BookRow {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub available_copies: i32,
    pub available: bool,
    /// `"4.5 (12)"`, or empty when unrated.
    pub rating: String,
}

impl BookRow {
    pub fn new(book: &Book, rating: Option<&RatingSummary>) -> Self {
        Self {
            id: book.id,
            title: book.title.clone(),
            author: book.author.clone(),
            available_copies: book.available_copies,
            available: book.is_available(),
            rating: rating
                .map(|r| format!("{} ({})", r.display_average(), r.count))
                .unwrap_or_default(),
        }
    }
}

impl From<&Book> for BookRow {
    fn from(book: &Book) -> Self {
        Self::new(book, None)
    }
}

/// One bar of a monthly borrowing chart.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthRow {
    pub label: String,
    pub count: usize,
    /// Bar width relative to the busiest month.
    pub percent: usize,
}

impl MonthRow {
    pub fn rows(months: &[MonthCount]) -> Vec<Self> {
        let max = months.iter().map(|m| m.count).max().unwrap_or(0).max(1);
        months
            .iter()
            .map(|m| Self {
                label: m.label(),
                count: m.count,
                percent: m.count * 100 / max,
            })
            .collect()
    }
}

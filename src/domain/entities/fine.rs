//! Fine entities. Amounts are paise, see [`super::Money`].

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FineStatus {
    Active,
    Paid,
    Waived,
}

impl FineStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paid => "paid",
            Self::Waived => "waived",
        }
    }
}

impl TryFrom<String> for FineStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "active" => Ok(Self::Active),
            "paid" => Ok(Self::Paid),
            "waived" => Ok(Self::Waived),
            other => Err(format!("unknown fine status '{other}'")),
        }
    }
}

/// A fine attached to one overdue loan.
///
/// `accrued_paise` is everything charged so far, `paid_paise` everything
/// paid against it; the database enforces `paid <= accrued`.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Fine {
    pub id: i64,
    pub regno: String,
    pub loan_id: i64,
    pub accrued_paise: i64,
    pub paid_paise: i64,
    pub due_date: NaiveDate,
    #[sqlx(try_from = "String")]
    pub status: FineStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Fine {
    pub fn accrued(&self) -> Money {
        Money::from_paise(self.accrued_paise)
    }

    pub fn paid(&self) -> Money {
        Money::from_paise(self.paid_paise)
    }

    /// Amount still owed, never negative.
    pub fn outstanding(&self) -> Money {
        Money::from_paise((self.accrued_paise - self.paid_paise).max(0))
    }

    pub fn is_active(&self) -> bool {
        self.status == FineStatus::Active
    }
}

/// A fine joined with the loan it belongs to.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct FineDetail {
    #[sqlx(flatten)]
    pub fine: Fine,
    pub book_title: String,
    pub loan_due_date: NaiveDate,
    pub returned_on: Option<NaiveDate>,
}

impl FineDetail {
    /// Days overdue as of `today`, or as of the return for returned loans.
    pub fn days_overdue(&self, today: NaiveDate) -> i64 {
        let until = self.returned_on.unwrap_or(today);
        (until - self.loan_due_date).num_days().max(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Completed,
    Pending,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Pending => "pending",
            Self::Failed => "failed",
        }
    }
}

impl TryFrom<String> for PaymentStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "completed" => Ok(Self::Completed),
            "pending" => Ok(Self::Pending),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown payment status '{other}'")),
        }
    }
}

/// A recorded payment against a fine.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct FinePayment {
    pub id: i64,
    pub fine_id: i64,
    pub amount_paise: i64,
    pub payment_date: DateTime<Utc>,
    pub payment_method: String,
    pub transaction_id: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: PaymentStatus,
}

impl FinePayment {
    pub fn amount(&self) -> Money {
        Money::from_paise(self.amount_paise)
    }
}

/// A payment joined with the title of the book it paid for.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct PaymentRecord {
    #[sqlx(flatten)]
    pub payment: FinePayment,
    pub book_title: String,
}

/// Input data for recording a payment.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPayment {
    pub fine_id: i64,
    pub amount_paise: i64,
    pub transaction_id: String,
}

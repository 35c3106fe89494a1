//! Lending rules: loan period, overdue charges, payment minimums and
//! reminder windows.
//!
//! Everything here is pure so services and the admin CLI share one
//! definition of the rules.

use chrono::{Duration, NaiveDate};
use serde_json::json;

use crate::domain::entities::{Fine, Loan, Money};
use crate::error::AppError;

/// Tunable library rules. Amounts are paise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LibraryPolicy {
    pub loan_period_days: i64,
    pub fine_per_day_paise: i64,
    /// Borrowing is blocked once outstanding fines reach this amount.
    pub borrow_limit_paise: i64,
    /// A fine reaching this amount triggers an email.
    pub notify_threshold_paise: i64,
    /// A growing fine also triggers an email each time it passes a multiple of this.
    pub notify_step_paise: i64,
    pub min_payment_percent: i64,
    /// Loans due within this many days get a due-soon reminder.
    pub reminder_window_days: i64,
}

impl Default for LibraryPolicy {
    fn default() -> Self {
        Self {
            loan_period_days: 14,
            fine_per_day_paise: 2_000,
            borrow_limit_paise: 100_000,
            notify_threshold_paise: 50_000,
            notify_step_paise: 10_000,
            min_payment_percent: 20,
            reminder_window_days: 2,
        }
    }
}

/// What fine accrual should do for one overdue loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accrual {
    /// The loan has no fine yet.
    Create { accrued: Money, notify: bool },
    /// The existing fine grows to `accrued`. Payments are kept.
    Raise { accrued: Money, notify: bool },
    Unchanged,
}

/// Which reminder a loan is due for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reminder {
    Overdue { days: i64 },
    DueSoon { days_left: i64 },
}

impl LibraryPolicy {
    /// Checks that the rules make sense together.
    pub fn validate(&self) -> Result<(), String> {
        if self.loan_period_days <= 0 {
            return Err("LOAN_PERIOD_DAYS must be greater than 0".to_string());
        }
        if self.fine_per_day_paise < 0 {
            return Err("FINE_PER_DAY must not be negative".to_string());
        }
        if self.borrow_limit_paise <= 0 {
            return Err("BORROW_FINE_LIMIT must be greater than 0".to_string());
        }
        if self.notify_threshold_paise <= 0 || self.notify_step_paise <= 0 {
            return Err("FINE_NOTIFY_THRESHOLD must be greater than 0".to_string());
        }
        if !(1..=100).contains(&self.min_payment_percent) {
            return Err(format!(
                "MIN_PAYMENT_PERCENT must be between 1 and 100, got {}",
                self.min_payment_percent
            ));
        }
        if self.reminder_window_days < 0 {
            return Err("reminder window must not be negative".to_string());
        }
        Ok(())
    }

    pub fn due_date(&self, borrowed_on: NaiveDate) -> NaiveDate {
        borrowed_on + Duration::days(self.loan_period_days)
    }

    /// Total charge for an open loan as of `today`.
    pub fn overdue_charge(&self, loan: &Loan, today: NaiveDate) -> Money {
        if !loan.is_open() {
            return Money::ZERO;
        }
        Money::from_paise(loan.days_overdue(today) * self.fine_per_day_paise)
    }

    /// Decides how the fine for a loan changes when the total charge is `charge`.
    ///
    /// The accrued amount only ever grows, so re-running accrual on the same
    /// day never counts a day twice and payments already made stay valid.
    pub fn accrue(&self, existing: Option<&Fine>, charge: Money) -> Accrual {
        if !charge.is_positive() {
            return Accrual::Unchanged;
        }

        match existing {
            None => Accrual::Create {
                accrued: charge,
                notify: charge.paise() >= self.notify_threshold_paise,
            },
            Some(fine) if charge.paise() > fine.accrued_paise => Accrual::Raise {
                accrued: charge,
                notify: self.should_notify(fine.accrued_paise, charge.paise()),
            },
            Some(_) => Accrual::Unchanged,
        }
    }

    /// A growing fine notifies when it crosses the threshold or a new step.
    fn should_notify(&self, old: i64, new: i64) -> bool {
        let crossed_threshold =
            old < self.notify_threshold_paise && new >= self.notify_threshold_paise;
        let crossed_step = new / self.notify_step_paise > old / self.notify_step_paise;
        crossed_threshold || crossed_step
    }

    /// Smallest accepted payment, rounded up to the paisa.
    pub fn minimum_payment(&self, outstanding: Money) -> Money {
        let scaled = outstanding.paise().max(0) * self.min_payment_percent;
        Money::from_paise((scaled + 99) / 100)
    }

    /// Validates a payment of `amount` against a fine with `outstanding` left.
    pub fn check_payment(&self, outstanding: Money, amount: Money) -> Result<(), AppError> {
        if !outstanding.is_positive() {
            return Err(AppError::bad_request(
                "This fine has already been paid.",
                json!({}),
            ));
        }
        if !amount.is_positive() {
            return Err(AppError::bad_request(
                "Payment amount must be greater than zero.",
                json!({ "amount": amount.paise() }),
            ));
        }
        let minimum = self.minimum_payment(outstanding);
        if amount < minimum {
            return Err(AppError::bad_request(
                format!("Minimum payment is {minimum}."),
                json!({ "minimum": minimum.paise() }),
            ));
        }
        if amount > outstanding {
            return Err(AppError::bad_request(
                format!("Payment cannot exceed the outstanding amount of {outstanding}."),
                json!({ "outstanding": outstanding.paise() }),
            ));
        }
        Ok(())
    }

    pub fn can_borrow(&self, outstanding_total: Money) -> bool {
        outstanding_total.paise() < self.borrow_limit_paise
    }

    pub fn borrow_limit(&self) -> Money {
        Money::from_paise(self.borrow_limit_paise)
    }

    /// Reminder for an open loan, if one is due today.
    pub fn reminder_for(&self, loan: &Loan, today: NaiveDate) -> Option<Reminder> {
        if !loan.is_open() {
            return None;
        }
        let days_left = loan.days_left(today);
        if days_left < 0 {
            Some(Reminder::Overdue { days: -days_left })
        } else if days_left <= self.reminder_window_days {
            Some(Reminder::DueSoon { days_left })
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::FineStatus;
    use chrono::Utc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn loan(due: NaiveDate) -> Loan {
        Loan::new(1, "R1".into(), Some(1), "Dune".into(), due - Duration::days(14), due)
    }

    fn fine(accrued: i64, paid: i64) -> Fine {
        Fine {
            id: 1,
            regno: "R1".into(),
            loan_id: 1,
            accrued_paise: accrued,
            paid_paise: paid,
            due_date: date(2026, 3, 1),
            status: FineStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_default_policy_is_valid() {
        assert!(LibraryPolicy::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut policy = LibraryPolicy::default();
        policy.min_payment_percent = 0;
        assert!(policy.validate().is_err());

        let mut policy = LibraryPolicy::default();
        policy.borrow_limit_paise = 0;
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_due_date() {
        let policy = LibraryPolicy::default();
        assert_eq!(policy.due_date(date(2026, 3, 1)), date(2026, 3, 15));
    }

    #[test]
    fn test_overdue_charge() {
        let policy = LibraryPolicy::default();
        let loan = loan(date(2026, 3, 1));
        assert_eq!(policy.overdue_charge(&loan, date(2026, 3, 1)), Money::ZERO);
        assert_eq!(
            policy.overdue_charge(&loan, date(2026, 3, 4)),
            Money::from_rupees(60)
        );
    }

    #[test]
    fn test_accrue_creates_fine_once() {
        let policy = LibraryPolicy::default();
        assert_eq!(
            policy.accrue(None, Money::from_rupees(60)),
            Accrual::Create {
                accrued: Money::from_rupees(60),
                notify: false
            }
        );
        assert_eq!(
            policy.accrue(None, Money::from_rupees(500)),
            Accrual::Create {
                accrued: Money::from_rupees(500),
                notify: true
            }
        );
        assert_eq!(policy.accrue(None, Money::ZERO), Accrual::Unchanged);
    }

    #[test]
    fn test_accrue_never_double_counts() {
        let policy = LibraryPolicy::default();
        let existing = fine(6000, 0);
        assert_eq!(
            policy.accrue(Some(&existing), Money::from_paise(6000)),
            Accrual::Unchanged
        );
        assert_eq!(
            policy.accrue(Some(&existing), Money::from_paise(4000)),
            Accrual::Unchanged
        );
    }

    #[test]
    fn test_accrue_raise_keeps_payments_and_notifies_on_steps() {
        let policy = LibraryPolicy::default();
        let existing = fine(8000, 8000);

        assert_eq!(
            policy.accrue(Some(&existing), Money::from_paise(10_000)),
            Accrual::Raise {
                accrued: Money::from_paise(10_000),
                notify: true
            }
        );
        assert_eq!(
            policy.accrue(Some(&existing), Money::from_paise(9_000)),
            Accrual::Raise {
                accrued: Money::from_paise(9_000),
                notify: false
            }
        );
    }

    #[test]
    fn test_accrue_notifies_when_crossing_threshold() {
        let policy = LibraryPolicy {
            notify_step_paise: 1_000_000,
            ..LibraryPolicy::default()
        };
        let existing = fine(48_000, 0);
        assert_eq!(
            policy.accrue(Some(&existing), Money::from_paise(50_000)),
            Accrual::Raise {
                accrued: Money::from_paise(50_000),
                notify: true
            }
        );
    }

    #[test]
    fn test_minimum_payment_rounds_up() {
        let policy = LibraryPolicy::default();
        assert_eq!(
            policy.minimum_payment(Money::from_rupees(100)),
            Money::from_rupees(20)
        );
        assert_eq!(
            policy.minimum_payment(Money::from_paise(101)),
            Money::from_paise(21)
        );
    }

    #[test]
    fn test_check_payment_bounds() {
        let policy = LibraryPolicy::default();
        let outstanding = Money::from_rupees(100);

        assert!(policy.check_payment(outstanding, Money::ZERO).is_err());
        assert!(policy.check_payment(outstanding, Money::from_rupees(19)).is_err());
        assert!(policy.check_payment(outstanding, Money::from_rupees(101)).is_err());
        assert!(policy.check_payment(outstanding, Money::from_rupees(20)).is_ok());
        assert!(policy.check_payment(outstanding, Money::from_rupees(100)).is_ok());
        assert!(policy.check_payment(Money::ZERO, Money::from_rupees(1)).is_err());
    }

    #[test]
    fn test_can_borrow_below_limit_only() {
        let policy = LibraryPolicy::default();
        assert!(policy.can_borrow(Money::from_paise(99_999)));
        assert!(!policy.can_borrow(Money::from_rupees(1000)));
    }

    #[test]
    fn test_reminders() {
        let policy = LibraryPolicy::default();
        let loan = loan(date(2026, 3, 10));

        assert_eq!(policy.reminder_for(&loan, date(2026, 3, 1)), None);
        assert_eq!(
            policy.reminder_for(&loan, date(2026, 3, 8)),
            Some(Reminder::DueSoon { days_left: 2 })
        );
        assert_eq!(
            policy.reminder_for(&loan, date(2026, 3, 10)),
            Some(Reminder::DueSoon { days_left: 0 })
        );
        assert_eq!(
            policy.reminder_for(&loan, date(2026, 3, 13)),
            Some(Reminder::Overdue { days: 3 })
        );
    }
}

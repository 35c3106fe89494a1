//! Fine accrual and payment.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::json;
use std::sync::Arc;

use crate::domain::entities::{Fine, FineDetail, FinePayment, Money, NewPayment, PaymentRecord};
use crate::domain::mail::{MailMessage, Notifier};
use crate::domain::policy::{Accrual, LibraryPolicy};
use crate::domain::repositories::{FineRepository, LoanRepository, StudentRepository};
use crate::error::AppError;
use crate::utils::tokens::generate_transaction_id;

/// Counts from one accrual run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccrualReport {
    pub created: usize,
    pub raised: usize,
    pub notified: usize,
}

impl AccrualReport {
    fn merge(&mut self, other: AccrualReport) {
        self.created += other.created;
        self.raised += other.raised;
        self.notified += other.notified;
    }
}

/// What a student sees on the fines page.
#[derive(Debug, Clone, PartialEq)]
pub struct FineOverview {
    pub fines: Vec<FineDetail>,
    pub total: Money,
    pub payments: Vec<PaymentRecord>,
    pub can_borrow: bool,
}

/// Keeps fines in step with overdue loans and records payments.
///
/// Accrual is idempotent for a given day: a fine's accrued amount is raised
/// to the current charge, never incremented, so running it on every page
/// load is safe.
pub struct FineService {
    fines: Arc<dyn FineRepository>,
    loans: Arc<dyn LoanRepository>,
    students: Arc<dyn StudentRepository>,
    notifier: Notifier,
    policy: LibraryPolicy,
}

impl FineService {
    pub fn new(
        fines: Arc<dyn FineRepository>,
        loans: Arc<dyn LoanRepository>,
        students: Arc<dyn StudentRepository>,
        notifier: Notifier,
        policy: LibraryPolicy,
    ) -> Self {
        Self {
            fines,
            loans,
            students,
            notifier,
            policy,
        }
    }

    pub fn policy(&self) -> &LibraryPolicy {
        &self.policy
    }

    /// Brings the student's fines up to date as of `today`.
    pub async fn accrue_for_student(
        &self,
        regno: &str,
        today: NaiveDate,
    ) -> Result<AccrualReport, AppError> {
        let mut report = AccrualReport::default();
        let mut notify = false;

        for loan in self.loans.overdue_for_student(regno, today).await? {
            let charge = self.policy.overdue_charge(&loan, today);
            let existing = self.fines.find_for_loan(loan.id).await?;

            match self.policy.accrue(existing.as_ref(), charge) {
                Accrual::Create { accrued, notify: n } => {
                    match self
                        .fines
                        .create(regno, loan.id, accrued.paise(), loan.due_date)
                        .await
                    {
                        Ok(fine) => {
                            tracing::info!(regno, fine_id = fine.id, loan_id = loan.id, amount = %accrued, "Fine created");
                            report.created += 1;
                            notify |= n;
                        }
                        // Another request accrued the same loan first.
                        Err(AppError::Conflict { .. }) => {}
                        Err(e) => return Err(e),
                    }
                }
                Accrual::Raise { accrued, notify: n } => {
                    if let Some(fine) = existing {
                        self.fines.raise_accrued(fine.id, accrued.paise()).await?;
                        tracing::debug!(regno, fine_id = fine.id, amount = %accrued, "Fine raised");
                        report.raised += 1;
                        notify |= n;
                    }
                }
                Accrual::Unchanged => {}
            }
        }

        self.fines.settle_cleared(regno).await?;

        if notify && self.send_fine_notice(regno).await? {
            report.notified += 1;
        }

        Ok(report)
    }

    async fn send_fine_notice(&self, regno: &str) -> Result<bool, AppError> {
        let Some(student) = self.students.find(regno).await? else {
            return Ok(false);
        };
        let total = self.outstanding_total(regno).await?;

        Ok(self.notifier.send(MailMessage::fine_notice(
            &student.email,
            regno,
            total,
            self.policy.borrow_limit(),
        )))
    }

    /// Accrues fines for every student.
    pub async fn accrue_all(&self, today: NaiveDate) -> Result<AccrualReport, AppError> {
        let mut report = AccrualReport::default();
        for student in self.students.list().await? {
            report.merge(self.accrue_for_student(&student.regno, today).await?);
        }

        if report != AccrualReport::default() {
            tracing::info!(
                created = report.created,
                raised = report.raised,
                notified = report.notified,
                "Fines accrued"
            );
        }
        Ok(report)
    }

    pub async fn outstanding_total(&self, regno: &str) -> Result<Money, AppError> {
        Ok(Money::from_paise(self.fines.outstanding_total(regno).await?))
    }

    pub async fn can_borrow(&self, regno: &str) -> Result<bool, AppError> {
        Ok(self.policy.can_borrow(self.outstanding_total(regno).await?))
    }

    pub fn minimum_payment(&self, outstanding: Money) -> Money {
        self.policy.minimum_payment(outstanding)
    }

    /// A fine owned by `regno`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the fine does not exist and
    /// [`AppError::Forbidden`] if it belongs to someone else.
    pub async fn fine_for(&self, regno: &str, fine_id: i64) -> Result<Fine, AppError> {
        let fine = self
            .fines
            .find(fine_id)
            .await?
            .ok_or_else(|| AppError::not_found("Fine not found.", json!({ "fine_id": fine_id })))?;

        if fine.regno != regno {
            return Err(AppError::forbidden(
                "This fine does not belong to you.",
                json!({ "fine_id": fine_id }),
            ));
        }
        Ok(fine)
    }

    /// Pays `amount` towards a fine.
    ///
    /// # Errors
    ///
    /// Besides the ownership errors of [`Self::fine_for`], returns
    /// [`AppError::Validation`] when the fine is already paid or the amount is
    /// below the minimum or above what is outstanding.
    pub async fn pay(
        &self,
        regno: &str,
        fine_id: i64,
        amount: Money,
        now: DateTime<Utc>,
    ) -> Result<(Fine, FinePayment), AppError> {
        let fine = self.fine_for(regno, fine_id).await?;
        self.policy.check_payment(fine.outstanding(), amount)?;

        let (fine, payment) = self
            .fines
            .record_payment(NewPayment {
                fine_id,
                amount_paise: amount.paise(),
                transaction_id: generate_transaction_id(now),
            })
            .await?;

        tracing::info!(
            regno,
            fine_id,
            amount = %amount,
            outstanding = %fine.outstanding(),
            transaction_id = payment.transaction_id.as_deref().unwrap_or_default(),
            "Fine payment recorded"
        );
        Ok((fine, payment))
    }

    /// Accrues, then collects the student's fines and payment history.
    pub async fn overview(&self, regno: &str, today: NaiveDate) -> Result<FineOverview, AppError> {
        self.accrue_for_student(regno, today).await?;

        let fines = self.fines.active_for_student(regno).await?;
        let total = self.outstanding_total(regno).await?;
        let payments = self.fines.payment_history(regno).await?;

        Ok(FineOverview {
            fines,
            can_borrow: self.policy.can_borrow(total),
            total,
            payments,
        })
    }

    /// Accrues for everybody, then lists fines, optionally for one student.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if `regno` names an unknown student.
    pub async fn admin_list(
        &self,
        regno: Option<String>,
        today: NaiveDate,
    ) -> Result<Vec<FineDetail>, AppError> {
        self.accrue_all(today).await?;

        let regno = regno
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());

        if let Some(regno) = &regno
            && self.students.find(regno).await?.is_none()
        {
            return Err(AppError::not_found(
                "Student not found.",
                json!({ "regno": regno }),
            ));
        }

        self.fines.list(regno).await
    }
}

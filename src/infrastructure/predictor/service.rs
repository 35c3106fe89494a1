//! Late-return predictor trait and its input features.

use thiserror::Error;

use crate::domain::entities::Loan;

/// Features the late-return model was trained on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LateFeatures {
    /// Every loan the student has ever had, open or returned.
    pub borrow_count: f64,
    /// Mean lateness in days over late returns only, zero without any.
    pub avg_days_late: f64,
}

impl LateFeatures {
    pub fn from_history(loans: &[Loan]) -> Self {
        let late: Vec<i64> = loans
            .iter()
            .filter_map(Loan::days_late)
            .filter(|days| *days > 0)
            .collect();

        let avg_days_late = if late.is_empty() {
            0.0
        } else {
            late.iter().sum::<i64>() as f64 / late.len() as f64
        };

        Self {
            borrow_count: loans.len() as f64,
            avg_days_late,
        }
    }

    pub fn as_vec(&self) -> [f64; 2] {
        [self.borrow_count, self.avg_days_late]
    }
}

/// Errors raised while loading a model.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read model file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse model file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid model: {0}")]
    Invalid(String),
}

/// Predicts whether a student will return a book late.
///
/// # Implementations
///
/// - [`crate::infrastructure::predictor::LogisticModel`] - Pre-trained logistic regression
/// - [`crate::infrastructure::predictor::DisabledPredictor`] - Used when no model is configured
#[cfg_attr(test, mockall::automock)]
pub trait LatePredictor: Send + Sync {
    /// `None` when prediction is unavailable.
    fn predict_late(&self, features: &LateFeatures) -> Option<bool>;

    fn is_enabled(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn loan(id: i64, returned_days_after_due: Option<i64>) -> Loan {
        let due = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        let mut loan = Loan::new(id, "R1".into(), Some(id), "B".into(), due - Duration::days(14), due);
        loan.actual_return_date = returned_days_after_due.map(|d| due + Duration::days(d));
        loan
    }

    #[test]
    fn test_features_from_history() {
        let loans = vec![loan(1, Some(-2)), loan(2, Some(4)), loan(3, Some(2)), loan(4, None)];
        let features = LateFeatures::from_history(&loans);

        assert_eq!(features.borrow_count, 4.0);
        assert_eq!(features.avg_days_late, 3.0);
    }

    #[test]
    fn test_features_without_late_returns() {
        let features = LateFeatures::from_history(&[loan(1, Some(0))]);
        assert_eq!(features.borrow_count, 1.0);
        assert_eq!(features.avg_days_late, 0.0);
    }
}

//! Form and query payloads for the HTML portal.
//!
//! Field-level checks run through `validator`; rules that need the
//! database or configuration stay in the services.

use regex::Regex;
use serde::Deserialize;
use serde_json::json;
use std::sync::LazyLock;
use validator::Validate;

use crate::domain::entities::Money;
use crate::error::AppError;

static REGNO_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]{1,20}$").expect("valid regno pattern"));

static COUNT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[0-9]{1,6}\s*$").expect("valid count pattern"));

#[derive(Debug, Deserialize, Validate)]
pub struct StudentLoginForm {
    #[validate(length(min = 1, message = "Registration number is required."))]
    pub regno: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AdminLoginForm {
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SignupForm {
    #[validate(regex(
        path = "*REGNO_REGEX",
        message = "Registration number must be letters and digits only."
    ))]
    pub regno: String,
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    #[validate(length(
        min = 8,
        message = "Password must be at least 8 characters long."
    ))]
    pub password: String,
}

/// `action=resend` asks for a new code instead of checking one.
#[derive(Debug, Deserialize)]
pub struct OtpForm {
    #[serde(default)]
    pub otp: String,
    #[serde(default)]
    pub action: String,
}

impl OtpForm {
    pub fn is_resend(&self) -> bool {
        self.action == "resend"
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordForm {
    #[validate(length(min = 1, message = "Registration number is required."))]
    pub regno: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordForm {
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RatingForm {
    #[validate(range(
        min = 1,
        max = 5,
        message = "Rating must be between 1 and 5."
    ))]
    pub rating: i16,
    #[serde(default)]
    #[validate(length(max = 2000, message = "Reviews are limited to 2000 characters."))]
    pub review: String,
}

impl RatingForm {
    pub fn review(&self) -> Option<String> {
        let review = self.review.trim();
        (!review.is_empty()).then(|| review.to_string())
    }
}

#[derive(Debug, Deserialize)]
pub struct PayFineForm {
    pub amount: String,
}

impl PayFineForm {
    pub fn amount(&self) -> Result<Money, AppError> {
        Money::parse(&self.amount)
            .filter(|amount| amount.is_positive())
            .ok_or_else(|| {
                AppError::bad_request(
                    "Enter a valid payment amount.",
                    json!({ "amount": self.amount }),
                )
            })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PanelQuery {
    pub search: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AdminFinesQuery {
    pub regno: Option<String>,
}

impl AdminFinesQuery {
    pub fn regno(&self) -> Option<String> {
        self.regno
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string)
    }
}

#[derive(Debug, Deserialize)]
pub struct EditDueForm {
    pub due_date: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddBookForm {
    #[validate(length(min = 1, max = 200, message = "Title and author are required."))]
    pub title: String,
    #[validate(length(min = 1, max = 200, message = "Title and author are required."))]
    pub author: String,
    #[validate(regex(path = "*COUNT_REGEX", message = "Number of copies must be a valid integer."))]
    pub copies: String,
}

/// Copy counts arrive as text so a typo becomes a notice, not a 422.
#[derive(Debug, Deserialize, Validate)]
pub struct CopiesForm {
    #[validate(regex(path = "*COUNT_REGEX", message = "Number of copies must be a valid integer."))]
    pub copies: String,
}

/// Parses a count already checked against the count pattern.
pub fn parse_count(raw: &str) -> Result<i32, AppError> {
    raw.trim().parse().map_err(|_| {
        AppError::bad_request(
            "Number of copies must be a valid integer.",
            json!({ "copies": raw }),
        )
    })
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddAdminForm {
    #[validate(length(min = 1, message = "Email and password are required."))]
    pub email: String,
    #[validate(length(min = 1, message = "Email and password are required."))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateAdminForm {
    #[validate(length(min = 1, message = "Email and password are required."))]
    pub new_email: String,
    #[validate(length(min = 1, message = "Email and password are required."))]
    pub new_password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signup_form_validation() {
        let form = SignupForm {
            regno: "21091A0501".into(),
            email: "21091a0501@rgmcet.edu.in".into(),
            password: "longenough".into(),
        };
        assert!(form.validate().is_ok());

        let form = SignupForm {
            regno: "21 09".into(),
            email: "21091a0501@rgmcet.edu.in".into(),
            password: "longenough".into(),
        };
        assert!(form.validate().is_err());

        let form = SignupForm {
            regno: "21091A0501".into(),
            email: "not-an-email".into(),
            password: "short".into(),
        };
        let message = AppError::from(form.validate().unwrap_err()).message().to_string();
        assert!(
            message == "Enter a valid email address."
                || message == "Password must be at least 8 characters long."
        );
    }

    #[test]
    fn test_admin_forms_only_require_values() {
        let form = UpdateAdminForm {
            new_email: "head@library.test".into(),
            new_password: "abc".into(),
        };
        assert!(form.validate().is_ok());

        let form = AddAdminForm {
            email: "desk".into(),
            password: String::new(),
        };
        let message = AppError::from(form.validate().unwrap_err()).message().to_string();
        assert_eq!(message, "Email and password are required.");
    }

    #[test]
    fn test_rating_form_bounds() {
        let form = |rating| RatingForm {
            rating,
            review: "  ".into(),
        };
        assert!(form(1).validate().is_ok());
        assert!(form(5).validate().is_ok());
        assert!(form(0).validate().is_err());
        assert!(form(6).validate().is_err());
        assert_eq!(form(3).review(), None);
    }

    #[test]
    fn test_pay_fine_amount() {
        let form = |amount: &str| PayFineForm {
            amount: amount.into(),
        };
        assert_eq!(form("150.50").amount().unwrap(), Money::from_paise(15_050));
        assert!(form("0").amount().is_err());
        assert!(form("-5").amount().is_err());
        assert!(form("abc").amount().is_err());
    }

    #[test]
    fn test_copies_form() {
        assert!(CopiesForm { copies: " 3 ".into() }.validate().is_ok());
        assert!(CopiesForm { copies: "three".into() }.validate().is_err());
        assert_eq!(parse_count(" 3 ").unwrap(), 3);
    }

    #[test]
    fn test_admin_fines_query_trims() {
        let query = AdminFinesQuery {
            regno: Some("  ".into()),
        };
        assert_eq!(query.regno(), None);
        let query = AdminFinesQuery {
            regno: Some(" R1 ".into()),
        };
        assert_eq!(query.regno(), Some("R1".into()));
    }
}

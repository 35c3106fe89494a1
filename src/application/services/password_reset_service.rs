//! Password recovery: emailed reset links and admin-approved resets.

use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use std::sync::Arc;

use crate::domain::entities::account::{MIN_PASSWORD_LEN, RESET_TOKEN_VALIDITY_HOURS};
use crate::domain::entities::{PasswordResetRequest, ResetStatus};
use crate::domain::mail::{MailMessage, Notifier};
use crate::domain::repositories::{PasswordResetRepository, StudentRepository};
use crate::error::AppError;
use crate::utils::password::PasswordHasher;
use crate::utils::tokens::{TokenSigner, generate_temporary_password, generate_url_token};

/// Result of asking for a reset link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetRequestOutcome {
    LinkSent,
    /// A link was sent recently and is still valid.
    AlreadyPending,
    /// The previous request had expired and was discarded.
    Expired,
}

pub struct PasswordResetService {
    students: Arc<dyn StudentRepository>,
    resets: Arc<dyn PasswordResetRepository>,
    signer: TokenSigner,
    hasher: PasswordHasher,
    notifier: Notifier,
    public_base_url: String,
}

impl PasswordResetService {
    pub fn new(
        students: Arc<dyn StudentRepository>,
        resets: Arc<dyn PasswordResetRepository>,
        signer: TokenSigner,
        hasher: PasswordHasher,
        notifier: Notifier,
        public_base_url: String,
    ) -> Self {
        Self {
            students,
            resets,
            signer,
            hasher,
            notifier,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Creates a one-hour reset token and mails the link.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] for an unknown registration number.
    pub async fn request_reset(
        &self,
        regno: &str,
        now: DateTime<Utc>,
    ) -> Result<ResetRequestOutcome, AppError> {
        let regno = regno.trim();
        let student = self.students.find(regno).await?.ok_or_else(|| {
            AppError::not_found("Registration number not found.", json!({ "regno": regno }))
        })?;

        if let Some(pending) = self.resets.find_pending_by_regno(regno).await? {
            if !pending.is_expired(now) {
                return Ok(ResetRequestOutcome::AlreadyPending);
            }
            self.resets.delete(pending.id).await?;
            tracing::info!(regno, "Expired password reset request discarded");
            return Ok(ResetRequestOutcome::Expired);
        }

        let token = generate_url_token();
        let expires_at = now + Duration::hours(RESET_TOKEN_VALIDITY_HOURS);
        self.resets
            .create(regno, &self.signer.hash_token(&token), expires_at)
            .await?;

        let link = format!("{}/reset_password/{token}", self.public_base_url);
        self.notifier
            .send(MailMessage::reset_link(&student.email, regno, &link));

        tracing::info!(regno, "Password reset link sent");
        Ok(ResetRequestOutcome::LinkSent)
    }

    /// Looks up a pending, unexpired request by its raw token.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for unknown, used or expired tokens.
    pub async fn validate_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<PasswordResetRequest, AppError> {
        self.resets
            .find_pending_by_token(&self.signer.hash_token(token))
            .await?
            .filter(|request| !request.is_expired(now))
            .ok_or_else(|| {
                AppError::bad_request("Invalid or expired reset link.", json!({}))
            })
    }

    pub async fn reset_password(
        &self,
        token: &str,
        password: &str,
        confirm: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let request = self.validate_token(token, now).await?;

        if password != confirm {
            return Err(AppError::bad_request("Passwords do not match.", json!({})));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::bad_request(
                format!("Password must be at least {MIN_PASSWORD_LEN} characters long."),
                json!({}),
            ));
        }

        let hash = self.hasher.hash(password).await?;
        self.resets
            .close_with_password(request.id, ResetStatus::Completed, &hash)
            .await?;

        tracing::info!(regno = %request.regno, "Password reset completed");
        Ok(())
    }

    /// Approves a pending request with a temporary password.
    ///
    /// Returns the temporary password so the admin can pass it on; the
    /// student also receives it by mail.
    pub async fn approve(&self, regno: &str) -> Result<String, AppError> {
        let student = self.students.find(regno).await?.ok_or_else(|| {
            AppError::not_found("Student not found.", json!({ "regno": regno }))
        })?;
        let request = self
            .resets
            .find_pending_by_regno(regno)
            .await?
            .ok_or_else(|| {
                AppError::not_found(
                    "No pending password reset request for this student.",
                    json!({ "regno": regno }),
                )
            })?;

        let temporary = generate_temporary_password();
        let hash = self.hasher.hash(&temporary).await?;
        self.resets
            .close_with_password(request.id, ResetStatus::Approved, &hash)
            .await?;

        let login_url = format!("{}/student_login", self.public_base_url);
        self.notifier.send(MailMessage::temporary_password(
            &student.email,
            regno,
            &temporary,
            &login_url,
        ));

        tracing::info!(regno, "Password reset approved by admin");
        Ok(temporary)
    }

    pub async fn pending(&self) -> Result<Vec<PasswordResetRequest>, AppError> {
        self.resets.list_pending().await
    }
}

//! Mail transport trait and error type.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::mail::MailMessage;

/// Errors returned by a mail transport.
#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail transport unavailable: {0}")]
    Unavailable(String),
    #[error("mail rejected: {0}")]
    Rejected(String),
}

impl MailError {
    /// Rejections are permanent; everything else is worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Delivers one message.
///
/// # Implementations
///
/// - [`crate::infrastructure::mail::LogMailer`] - Writes messages to the log
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn deliver(&self, message: &MailMessage) -> Result<(), MailError>;
}

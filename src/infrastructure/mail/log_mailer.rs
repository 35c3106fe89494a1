//! Mail transport that writes every message to the log.

use async_trait::async_trait;

use super::service::{MailError, Mailer};
use crate::domain::mail::MailMessage;

/// Logs messages instead of sending them.
///
/// The portal ships without an SMTP relay; operators read OTPs and reset
/// links from the log or from the `outbound_emails` table.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

impl LogMailer {
    pub fn new() -> Self {
        tracing::info!("Mail transport: log");
        Self
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn deliver(&self, message: &MailMessage) -> Result<(), MailError> {
        if !message.to.contains('@') {
            return Err(MailError::Rejected(format!(
                "invalid recipient '{}'",
                message.to
            )));
        }

        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            body = %message.body,
            "Email delivered"
        );
        Ok(())
    }
}

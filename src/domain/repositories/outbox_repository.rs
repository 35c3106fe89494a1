//! Repository trait for the outgoing mail log.

use crate::domain::entities::{DeliveryStatus, OutboundEmail};
use crate::domain::mail::MailMessage;
use crate::error::AppError;
use async_trait::async_trait;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OutboxRepository: Send + Sync {
    async fn record(
        &self,
        message: &MailMessage,
        status: DeliveryStatus,
        attempts: i32,
    ) -> Result<(), AppError>;

    /// Most recent messages first.
    async fn recent(&self, limit: i64) -> Result<Vec<OutboundEmail>, AppError>;
}

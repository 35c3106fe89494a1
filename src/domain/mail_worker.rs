//! Background delivery of queued mail.

use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};

use crate::domain::entities::DeliveryStatus;
use crate::domain::mail::MailMessage;
use crate::domain::repositories::OutboxRepository;
use crate::infrastructure::mail::{MailError, Mailer};

/// Total delivery attempts per message.
pub const MAX_ATTEMPTS: usize = 3;

/// Drains the mail queue until every sender is dropped.
pub async fn run_mail_worker(
    mut rx: mpsc::Receiver<MailMessage>,
    mailer: Arc<dyn Mailer>,
    outbox: Arc<dyn OutboxRepository>,
) {
    while let Some(message) = rx.recv().await {
        deliver_and_record(&message, mailer.as_ref(), outbox.as_ref()).await;
    }
    tracing::info!("Mail worker stopped");
}

/// Delivers one message with exponential backoff and records the outcome.
pub async fn deliver_and_record(
    message: &MailMessage,
    mailer: &dyn Mailer,
    outbox: &dyn OutboxRepository,
) -> DeliveryStatus {
    let strategy = ExponentialBackoff::from_millis(2)
        .factor(100)
        .max_delay(Duration::from_secs(5))
        .map(jitter)
        .take(MAX_ATTEMPTS - 1);

    let attempts = AtomicI32::new(0);
    let result = RetryIf::start(
        strategy,
        || {
            attempts.fetch_add(1, Ordering::Relaxed);
            mailer.deliver(message)
        },
        |e: &MailError| e.is_retryable(),
    )
    .await;

    let attempts = attempts.load(Ordering::Relaxed);
    let status = match result {
        Ok(()) => DeliveryStatus::Sent,
        Err(e) => {
            tracing::error!(to = %message.to, subject = %message.subject, attempts, error = %e, "Email delivery failed");
            DeliveryStatus::Failed
        }
    };

    if let Err(e) = outbox.record(message, status, attempts).await {
        tracing::error!(to = %message.to, error = %e, "Failed to record outgoing email");
    }

    status
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::MockOutboxRepository;
    use crate::infrastructure::mail::MockMailer;
    use mockall::Sequence;

    fn message() -> MailMessage {
        MailMessage::otp("student@rgmcet.edu.in", "123456")
    }

    #[tokio::test]
    async fn test_successful_delivery_is_recorded_once() {
        let mut mailer = MockMailer::new();
        mailer.expect_deliver().times(1).returning(|_| Ok(()));

        let mut outbox = MockOutboxRepository::new();
        outbox
            .expect_record()
            .withf(|_, status, attempts| *status == DeliveryStatus::Sent && *attempts == 1)
            .times(1)
            .returning(|_, _, _| Ok(()));

        let status = deliver_and_record(&message(), &mailer, &outbox).await;
        assert_eq!(status, DeliveryStatus::Sent);
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried() {
        let mut seq = Sequence::new();
        let mut mailer = MockMailer::new();
        mailer
            .expect_deliver()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(MailError::Unavailable("relay down".into())));
        mailer
            .expect_deliver()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let mut outbox = MockOutboxRepository::new();
        outbox
            .expect_record()
            .withf(|_, status, attempts| *status == DeliveryStatus::Sent && *attempts == 2)
            .times(1)
            .returning(|_, _, _| Ok(()));

        let status = deliver_and_record(&message(), &mailer, &outbox).await;
        assert_eq!(status, DeliveryStatus::Sent);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let mut mailer = MockMailer::new();
        mailer
            .expect_deliver()
            .times(MAX_ATTEMPTS)
            .returning(|_| Err(MailError::Unavailable("relay down".into())));

        let mut outbox = MockOutboxRepository::new();
        outbox
            .expect_record()
            .withf(|_, status, attempts| {
                *status == DeliveryStatus::Failed && *attempts == MAX_ATTEMPTS as i32
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let status = deliver_and_record(&message(), &mailer, &outbox).await;
        assert_eq!(status, DeliveryStatus::Failed);
    }

    #[tokio::test]
    async fn test_rejection_is_not_retried() {
        let mut mailer = MockMailer::new();
        mailer
            .expect_deliver()
            .times(1)
            .returning(|_| Err(MailError::Rejected("bad address".into())));

        let mut outbox = MockOutboxRepository::new();
        outbox
            .expect_record()
            .withf(|_, status, attempts| *status == DeliveryStatus::Failed && *attempts == 1)
            .times(1)
            .returning(|_, _, _| Ok(()));

        deliver_and_record(&message(), &mailer, &outbox).await;
    }

    #[tokio::test]
    async fn test_worker_drains_queue() {
        let mut mailer = MockMailer::new();
        mailer.expect_deliver().times(2).returning(|_| Ok(()));
        let mut outbox = MockOutboxRepository::new();
        outbox.expect_record().times(2).returning(|_, _, _| Ok(()));

        let (tx, rx) = mpsc::channel(4);
        tx.send(message()).await.unwrap();
        tx.send(message()).await.unwrap();
        drop(tx);

        run_mail_worker(rx, Arc::new(mailer), Arc::new(outbox)).await;
    }
}

//! Outgoing mail messages and the queue that carries them to the mail worker.
//!
//! Handlers never wait on delivery: a [`Notifier`] pushes a [`MailMessage`]
//! onto a bounded channel and [`crate::domain::mail_worker::run_mail_worker`]
//! delivers it in the background.

use chrono::NaiveDate;
use tokio::sync::mpsc;

use crate::domain::entities::Money;

const SIGNATURE: &str = "Thank you,\nLibrary Management Team";

/// A plain-text email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl MailMessage {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
        }
    }

    pub fn otp(to: &str, code: &str) -> Self {
        Self::new(
            to,
            "Your OTP Code",
            format!(
                "Your OTP code is: {code}\n\nThe code is valid for 10 minutes.\n\n{SIGNATURE}"
            ),
        )
    }

    pub fn reset_link(to: &str, regno: &str, link: &str) -> Self {
        Self::new(
            to,
            "Password Reset Request for Library System",
            format!(
                "Dear {regno},\n\n\
                 You have requested a password reset for your library account.\n\
                 Please open the following link to reset your password:\n{link}\n\n\
                 This link will expire in 1 hour. If you did not request this, please ignore this email.\n\n\
                 {SIGNATURE}"
            ),
        )
    }

    pub fn temporary_password(to: &str, regno: &str, password: &str, login_url: &str) -> Self {
        Self::new(
            to,
            "Your Library Account Password Has Been Reset",
            format!(
                "Dear {regno},\n\n\
                 Your password reset request has been approved by an administrator.\n\
                 Your temporary password is: {password}\n\n\
                 Please log in at {login_url} and change it immediately.\n\n\
                 {SIGNATURE}"
            ),
        )
    }

    pub fn due_date_changed(to: &str, regno: &str, title: &str, due: NaiveDate) -> Self {
        Self::new(
            to,
            format!("Library Book Due Date Updated for '{title}'"),
            format!(
                "Dear {regno},\n\n\
                 The due date for the book '{title}' has been updated to {}.\n\
                 Please return the book by the new due date.\n\n\
                 {SIGNATURE}",
                due.format("%Y-%m-%d")
            ),
        )
    }

    pub fn overdue_reminder(to: &str, regno: &str, title: &str, due: NaiveDate) -> Self {
        Self::new(
            to,
            "Book Return Overdue",
            format!(
                "Dear {regno},\n\n\
                 Your book '{title}' was due on {} and is now overdue. \
                 Please return it as soon as possible to avoid further fines.\n\n\
                 {SIGNATURE}",
                due.format("%Y-%m-%d")
            ),
        )
    }

    pub fn due_soon_reminder(to: &str, regno: &str, title: &str, due: NaiveDate) -> Self {
        Self::new(
            to,
            "Book Due Soon Reminder",
            format!(
                "Dear {regno},\n\n\
                 Reminder: your book '{title}' is due on {}. \
                 Please return it on time to avoid overdue charges.\n\n\
                 {SIGNATURE}",
                due.format("%Y-%m-%d")
            ),
        )
    }

    pub fn fine_notice(to: &str, regno: &str, amount: Money, borrow_limit: Money) -> Self {
        Self::new(
            to,
            "Library Fine Notification",
            format!(
                "Dear {regno},\n\n\
                 You have accumulated a library fine of {amount}.\n\
                 Please pay your fine as soon as possible to avoid further restrictions.\n\n\
                 If your fines reach {borrow_limit}, you will not be able to borrow any more books until they are paid.\n\n\
                 You can pay your fine from the student dashboard.\n\n\
                 {SIGNATURE}"
            ),
        )
    }
}

/// Hands messages to the background mail worker.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: mpsc::Sender<MailMessage>,
}

impl Notifier {
    pub fn new(tx: mpsc::Sender<MailMessage>) -> Self {
        Self { tx }
    }

    /// Queues a message without waiting. Returns `false` when the queue is
    /// full or the worker has stopped; the message is dropped and logged.
    pub fn send(&self, message: MailMessage) -> bool {
        match self.tx.try_send(message) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(message)) => {
                tracing::warn!(to = %message.to, subject = %message.subject, "Mail queue full, message dropped");
                false
            }
            Err(mpsc::error::TrySendError::Closed(message)) => {
                tracing::error!(to = %message.to, subject = %message.subject, "Mail worker stopped, message dropped");
                false
            }
        }
    }

    pub fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }

    pub fn capacity(&self) -> usize {
        self.tx.capacity()
    }

    pub fn max_capacity(&self) -> usize {
        self.tx.max_capacity()
    }
}

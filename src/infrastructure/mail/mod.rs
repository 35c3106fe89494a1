//! Outgoing mail transport.
//!
//! Provides a [`Mailer`] trait and the [`LogMailer`] implementation.

mod log_mailer;
mod service;

pub use log_mailer::LogMailer;
pub use service::{MailError, Mailer};

#[cfg(test)]
pub use service::MockMailer;

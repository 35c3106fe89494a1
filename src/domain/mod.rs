//! Domain layer containing business entities and rules.
//!
//! # Architecture
//!
//! - [`entities`] - Core business data structures
//! - [`repositories`] - Data access trait definitions
//! - [`policy`] - Loan period, fine and payment rules
//! - [`analytics`] - Reading statistics and monthly borrow counts
//! - [`mail`] - Outgoing messages and the non-blocking [`mail::Notifier`]
//! - [`mail_worker`] - Background mail delivery with retry logic
//!
//! # Mail Flow
//!
//! 1. A service builds a [`mail::MailMessage`]
//! 2. [`mail::Notifier::send`] pushes it onto a bounded channel
//! 3. [`mail_worker::run_mail_worker`] delivers it with exponential backoff
//! 4. The outcome is recorded via [`repositories::OutboxRepository`]

pub mod analytics;
pub mod entities;
pub mod mail;
pub mod mail_worker;
pub mod policy;
pub mod repositories;

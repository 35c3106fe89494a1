//! HTML page handlers for the student and admin portals.
//!
//! Handlers named `*_handler` render a page; `*_submit_handler` accept the
//! matching form and answer with a redirect carrying a flash notice.

pub mod admin;
pub mod admin_accounts;
pub mod admin_catalog;
pub mod auth;
pub mod circulation;
pub mod fines;
pub mod public;
pub mod reader;
pub mod student;

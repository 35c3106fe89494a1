//! Server-rendered HTML portals for students and admins.
//!
//! Pages are Askama templates under `templates/`. Every template receives a
//! [`page::PageContext`] with the pending flash notices and the logged-in
//! user, so `base.html` can render navigation and notices uniformly.
//!
//! # Modules
//!
//! - [`handlers`] - Page and form handlers
//! - [`middleware`] - Cookie sessions for students and admins
//! - [`routes`] - Route tables grouped by required login
//! - [`flash`] - One-shot notices carried across redirects
//! - [`forms`] - Form and query payloads with field validation
//! - [`views`] - Display rows shared by templates

pub mod cookies;
pub mod flash;
pub mod forms;
pub mod handlers;
pub mod middleware;
pub mod page;
pub mod routes;
pub mod views;

//! Data every page template needs: pending notices and who is logged in.

use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::{Datelike, Utc};
use std::convert::Infallible;

use crate::web::flash::{Flash, Flashes};
use crate::web::middleware::session::{CurrentAdmin, CurrentStudent};

/// Layout context shared by all templates through `base.html`.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub flashes: Vec<Flash>,
    pub student: Option<String>,
    pub admin: Option<String>,
    pub is_super: bool,
    pub year: i32,
}

impl<S: Send + Sync> FromRequestParts<S> for PageContext {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let flashes = parts
            .extensions
            .get::<Flashes>()
            .map(|f| f.0.clone())
            .unwrap_or_default();
        let student = parts
            .extensions
            .get::<CurrentStudent>()
            .map(|s| s.regno.clone());
        let admin = parts.extensions.get::<CurrentAdmin>();

        Ok(Self {
            flashes,
            student,
            admin: admin.map(|a| a.email.clone()),
            is_super: admin.is_some_and(|a| a.is_super),
            year: Utc::now().year(),
        })
    }
}

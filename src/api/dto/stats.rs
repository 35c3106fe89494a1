//! DTOs for the admin statistics endpoint.

use serde::Serialize;

use crate::application::services::admin_service::LibraryStats;
use crate::domain::analytics::MonthCount;

/// Library totals plus borrowings per month, oldest month first.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub totals: LibraryStats,
    pub monthly_borrowings: Vec<MonthlyBorrowings>,
}

#[derive(Debug, Serialize)]
pub struct MonthlyBorrowings {
    /// `"2026-03"`.
    pub month: String,
    /// `"Mar 2026"`.
    pub label: String,
    pub count: usize,
}

impl From<&MonthCount> for MonthlyBorrowings {
    fn from(m: &MonthCount) -> Self {
        Self {
            month: m.key(),
            label: m.label(),
            count: m.count,
        }
    }
}

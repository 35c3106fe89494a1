//! Handler for the admin statistics feed.

use axum::{Json, extract::State};

use crate::api::dto::stats::{MonthlyBorrowings, StatsResponse};
use crate::application::services::admin_service::PANEL_MONTHS;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::clock;

/// Library totals for the statistics page charts.
///
/// # Endpoint
///
/// `GET /api/admin/stats` (admin session required)
///
/// # Response
///
/// ```json
/// {
///   "total_books": 120,
///   "total_borrowed": 14,
///   "total_overdue": 3,
///   "total_students": 310,
///   "monthly_borrowings": [ { "month": "2026-10", "label": "Oct 2026", "count": 9 } ]
/// }
/// ```
pub async fn admin_stats_handler(
    State(st): State<AppState>,
) -> Result<Json<StatsResponse>, AppError> {
    let today = clock::today();
    let totals = st.admin_service.stats(today).await?;
    let monthly = st
        .admin_service
        .monthly_borrowings(today, PANEL_MONTHS)
        .await?;

    Ok(Json(StatsResponse {
        totals,
        monthly_borrowings: monthly.iter().map(MonthlyBorrowings::from).collect(),
    }))
}

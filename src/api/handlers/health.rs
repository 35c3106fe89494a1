//! Handler for health check endpoint.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse};
use crate::state::AppState;

/// Returns service health status with component checks.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response Codes
///
/// - **200 OK**: All components healthy
/// - **503 Service Unavailable**: One or more components degraded
///
/// # Components Checked
///
/// 1. **Database**: `SELECT 1` round trip
/// 2. **Mail Queue**: Checks if channel is open and reports free capacity
/// 3. **Predictor**: Reports whether a late-return model is loaded. A
///    missing model is reported but does not degrade the service.
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "checks": {
///     "database": { "status": "ok", "message": "Connected" },
///     "mail_queue": { "status": "ok", "message": "Capacity: 1000/1000" },
///     "predictor": { "status": "ok", "message": "Disabled" }
///   }
/// }
/// ```
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let db_check = check_database(&state).await;

    let queue_check = check_mail_queue(&state);

    let predictor_check = check_predictor(&state);

    let all_healthy = db_check.is_ok() && queue_check.is_ok() && predictor_check.is_ok();

    let response = HealthResponse {
        status: if all_healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            database: db_check,
            mail_queue: queue_check,
            predictor: predictor_check,
        },
    };

    if all_healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

async fn check_database(state: &AppState) -> CheckStatus {
    match sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(state.pool.as_ref())
        .await
    {
        Ok(_) => CheckStatus::ok("Connected"),
        Err(e) => CheckStatus::error(format!("Database error: {}", e)),
    }
}

/// Checks if the outgoing mail queue is operational.
fn check_mail_queue(state: &AppState) -> CheckStatus {
    if state.notifier.is_open() {
        CheckStatus::ok(format!(
            "Capacity: {}/{}",
            state.notifier.capacity(),
            state.notifier.max_capacity()
        ))
    } else {
        CheckStatus::error("Mail queue is closed")
    }
}

fn check_predictor(state: &AppState) -> CheckStatus {
    if state.predictor.is_enabled() {
        CheckStatus::ok("Model loaded")
    } else {
        CheckStatus::ok("Disabled")
    }
}

//! Health check endpoints for EventHub.

use super::state::AppState;
use axum::{Json, extract::State, http::StatusCode};
use eventhub_web::handlers::health::{ReadinessReport, readiness};

pub use eventhub_web::handlers::health_check;

/// Readiness check endpoint.
///
/// Pings the database through the user repository.
///
/// # Example
///
/// ```bash
/// curl http://localhost:8080/ready
/// # {"component":"database","status":"ready"}
/// ```
pub async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<ReadinessReport>) {
    readiness("database", state.services.users.ping()).await
}

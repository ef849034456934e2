//! Health check endpoints.
//!
//! These endpoints are used by load balancers and monitoring systems
//! to verify service health.

use axum::{Json, http::StatusCode};
use serde::Serialize;
use std::fmt::Display;
use std::future::Future;

/// Simple health check endpoint (for basic liveness).
///
/// Returns 200 OK to indicate the service is running.
/// This endpoint does NOT check dependencies (database, etc.).
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

/// Readiness report returned by [`readiness`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadinessReport {
    /// Component that was checked
    pub component: &'static str,
    /// `ready` or `unavailable`
    pub status: &'static str,
    /// Failure detail, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Run a dependency check and turn the outcome into a readiness response.
///
/// # Status Codes
///
/// - 200 OK: the check succeeded
/// - 503 Service Unavailable: the check failed
///
/// # Example
///
/// ```
/// use axum::http::StatusCode;
/// use eventhub_web::handlers::health::readiness;
///
/// # tokio_test::block_on(async {
/// let (status, _) = readiness("database", async { Ok::<(), String>(()) }).await;
/// assert_eq!(status, StatusCode::OK);
/// # });
/// ```
pub async fn readiness<F, E>(component: &'static str, check: F) -> (StatusCode, Json<ReadinessReport>)
where
    F: Future<Output = Result<(), E>>,
    E: Display,
{
    match check.await {
        Ok(()) => (
            StatusCode::OK,
            Json(ReadinessReport {
                component,
                status: "ready",
                message: None,
            }),
        ),
        Err(e) => {
            tracing::warn!(component, error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadinessReport {
                    component,
                    status: "unavailable",
                    message: Some(e.to_string()),
                }),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_simple_health_check() {
        let (status, body) = health_check().await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn test_readiness_failure_is_503() {
        let (status, Json(report)) =
            readiness("database", async { Err::<(), _>("connection refused") }).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(report.status, "unavailable");
        assert_eq!(report.message.as_deref(), Some("connection refused"));
    }
}

//! Router configuration for EventHub.
//!
//! Builds the complete Axum router with all endpoints.

use super::health::{health_check, readiness_check};
use super::state::AppState;
use crate::api::{events, registrations, users};
use crate::auth::handlers as auth;
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, patch, post},
};
use eventhub_web::correlation_id_layer;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// CORS policy: the configured origin, or any origin when unset.
///
/// # Errors
///
/// Returns an error if `origin` is not a valid header value.
pub fn cors_layer(origin: Option<&str>) -> Result<CorsLayer, header::InvalidHeaderValue> {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);
    Ok(match origin {
        Some(origin) => layer.allow_origin(HeaderValue::from_str(origin)?),
        None => layer.allow_origin(Any),
    })
}

/// Build the complete Axum router.
///
/// Configures:
/// - Health checks (`/health`, `/ready`)
/// - Authentication endpoints
/// - User, event and registration endpoints under `/api`
///
/// Requests pass through correlation-id tagging, tracing and CORS.
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    let api_routes = Router::new()
        // Authentication
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        // Users
        .route("/users", get(users::list_users))
        .route(
            "/users/:id",
            get(users::get_user)
                .patch(users::update_user)
                .delete(users::delete_user),
        )
        // Events
        .route("/events", get(events::list_events).post(events::create_event))
        .route("/events/slug/:slug", get(events::get_event_by_slug))
        .route(
            "/events/:id",
            get(events::get_event)
                .patch(events::update_event)
                .delete(events::delete_event),
        )
        .route("/events/:id/publish", post(events::publish_event))
        .route("/events/:id/cancel", post(events::cancel_event))
        .route("/events/:id/complete", post(events::complete_event))
        .route("/events/:id/stats", get(events::event_stats))
        // Registrations
        .route(
            "/events/:id/registrations",
            get(registrations::list_for_event).post(registrations::register),
        )
        .route("/registrations/me", get(registrations::list_mine))
        .route("/registrations/:id", get(registrations::get_registration))
        .route(
            "/registrations/:id/cancel",
            post(registrations::cancel_registration),
        )
        .route("/registrations/:id/status", patch(registrations::set_status));

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .nest("/api", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(correlation_id_layer())
        .with_state(state)
}

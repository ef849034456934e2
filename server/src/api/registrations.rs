//! Registration API endpoints.
//!
//! - POST /api/events/:id/registrations - Register the caller
//! - GET /api/events/:id/registrations - Event registrations (owner or admin)
//! - GET /api/registrations/me - The caller's registrations
//! - GET /api/registrations/:id - One registration
//! - POST /api/registrations/:id/cancel - Cancel
//! - PATCH /api/registrations/:id/status - Approve, mark attendance (owner or admin)

use crate::auth::AuthUser;
use crate::server::state::AppState;
use axum::{extract::State, http::StatusCode};
use eventhub_core::{EventId, Registration, RegistrationId, RegistrationStatus};
use eventhub_web::{ApiJson, ApiPath, ApiQuery, OptionalJson, WebResult};
use serde::Deserialize;
use uuid::Uuid;

/// Body of a registration request. May be `{}` or left out.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    /// Note for the organizer
    #[serde(default)]
    pub notes: Option<String>,
}

/// Body of a status change.
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    /// Target status
    pub status: RegistrationStatus,
}

/// Optional status filter.
#[derive(Debug, Default, Deserialize)]
pub struct StatusFilter {
    /// Only registrations in this status
    pub status: Option<RegistrationStatus>,
}

/// Register for an event.
///
/// ```bash
/// curl -X POST http://localhost:8080/api/events/<id>/registrations \
///   -H "Authorization: Bearer <token>" \
///   -H "Content-Type: application/json" \
///   -d '{"notes": "Vegetarian"}'
/// ```
///
/// # Errors
///
/// - 404 for missing or hidden events
/// - 409 when the event is not published, past its deadline, full, or
///   the caller is already registered
pub async fn register(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(event_id): ApiPath<Uuid>,
    OptionalJson(request): OptionalJson<RegisterRequest>,
) -> WebResult<(StatusCode, ApiJson<Registration>)> {
    let request = request.unwrap_or_default();
    let registration = state
        .services
        .registrations
        .register(&auth.actor, EventId::from_uuid(event_id), request.notes)
        .await?;
    Ok((StatusCode::CREATED, ApiJson(registration)))
}

/// List an event's registrations, optionally filtered by `status`.
///
/// # Errors
///
/// 403 unless owner or admin.
pub async fn list_for_event(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(event_id): ApiPath<Uuid>,
    ApiQuery(filter): ApiQuery<StatusFilter>,
) -> WebResult<ApiJson<Vec<Registration>>> {
    let registrations = state
        .services
        .registrations
        .list_for_event(&auth.actor, EventId::from_uuid(event_id), filter.status)
        .await?;
    Ok(ApiJson(registrations))
}

/// The caller's registrations.
pub async fn list_mine(
    State(state): State<AppState>,
    auth: AuthUser,
) -> WebResult<ApiJson<Vec<Registration>>> {
    let registrations = state.services.registrations.list_mine(&auth.actor).await?;
    Ok(ApiJson(registrations))
}

/// Get a registration.
///
/// # Errors
///
/// 403 unless the caller owns it, organizes the event or is admin.
pub async fn get_registration(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> WebResult<ApiJson<Registration>> {
    let registration = state
        .services
        .registrations
        .get(&auth.actor, RegistrationId::from_uuid(id))
        .await?;
    Ok(ApiJson(registration))
}

/// Cancel a registration.
///
/// # Errors
///
/// 403 for other people's registrations, 409 if already final.
pub async fn cancel_registration(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> WebResult<ApiJson<Registration>> {
    let registration = state
        .services
        .registrations
        .cancel(&auth.actor, RegistrationId::from_uuid(id))
        .await?;
    Ok(ApiJson(registration))
}

/// Move a registration to another status.
///
/// ```bash
/// curl -X PATCH http://localhost:8080/api/registrations/<id>/status \
///   -H "Authorization: Bearer <token>" \
///   -H "Content-Type: application/json" \
///   -d '{"status": "confirmed"}'
/// ```
///
/// # Errors
///
/// 403 unless owner or admin, 409 for transitions the table forbids or
/// when confirming into a full event.
pub async fn set_status(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<StatusRequest>,
) -> WebResult<ApiJson<Registration>> {
    let registration = state
        .services
        .registrations
        .set_status(&auth.actor, RegistrationId::from_uuid(id), request.status)
        .await?;
    Ok(ApiJson(registration))
}

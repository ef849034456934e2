//! Event management API endpoints.
//!
//! - POST /api/events - Create a draft (organizer or admin)
//! - GET /api/events - List visible events with filters and pagination
//! - GET /api/events/:id, GET /api/events/slug/:slug - Event details
//! - PATCH /api/events/:id - Update (owner or admin)
//! - DELETE /api/events/:id - Delete (owner or admin)
//! - POST /api/events/:id/{publish,cancel,complete} - Lifecycle transitions
//! - GET /api/events/:id/stats - Registration counts

use super::PageParams;
use crate::app::{EventQuery, EventStats, EventUpdate, NewEvent};
use crate::auth::{AuthUser, MaybeAuthUser, RequireOrganizer};
use crate::server::state::AppState;
use axum::{extract::State, http::StatusCode};
use eventhub_core::{Event, EventId, EventStatus, Page, UserId};
use eventhub_web::{ApiJson, ApiPath, ApiQuery, WebResult};
use serde::Deserialize;
use uuid::Uuid;

/// Query parameters for listing events.
#[derive(Debug, Deserialize)]
pub struct ListEventsQuery {
    /// Page number (0-indexed)
    #[serde(default)]
    pub page: u32,
    /// Page size (default: 20, max: 100)
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Filter by status
    pub status: Option<EventStatus>,
    /// Filter by organizer
    pub organizer_id: Option<Uuid>,
    /// Only events that have not started
    #[serde(default)]
    pub upcoming: bool,
    /// Free-text search
    pub q: Option<String>,
}

const fn default_page_size() -> u32 {
    eventhub_core::DEFAULT_PAGE_SIZE
}

impl ListEventsQuery {
    fn split(self) -> (EventQuery, PageParams) {
        (
            EventQuery {
                status: self.status,
                organizer_id: self.organizer_id.map(UserId::from_uuid),
                upcoming: self.upcoming,
                q: self.q,
            },
            PageParams {
                page: self.page,
                page_size: self.page_size,
            },
        )
    }
}

/// Create a new event.
///
/// The caller becomes the organizer; the event starts as a draft.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/api/events \
///   -H "Authorization: Bearer <token>" \
///   -H "Content-Type: application/json" \
///   -d '{
///     "title": "Rust Meetup",
///     "location": "Lisbon",
///     "starts_at": "2026-06-01T18:00:00Z",
///     "ends_at": "2026-06-01T21:00:00Z",
///     "max_attendees": 40
///   }'
/// ```
///
/// # Errors
///
/// 403 for attendees, 422 for invalid fields.
pub async fn create_event(
    State(state): State<AppState>,
    RequireOrganizer(auth): RequireOrganizer,
    ApiJson(input): ApiJson<NewEvent>,
) -> WebResult<(StatusCode, ApiJson<Event>)> {
    let event = state.services.events.create(&auth.actor, input).await?;
    Ok((StatusCode::CREATED, ApiJson(event)))
}

/// List events.
///
/// Anonymous callers see published, cancelled and completed events;
/// signed-in callers also see their own drafts, admins see all drafts.
///
/// ```bash
/// curl "http://localhost:8080/api/events?upcoming=true&q=rust&page_size=10"
/// ```
pub async fn list_events(
    State(state): State<AppState>,
    viewer: MaybeAuthUser,
    ApiQuery(query): ApiQuery<ListEventsQuery>,
) -> WebResult<ApiJson<Page<Event>>> {
    let (query, page) = query.split();
    let events = state
        .services
        .events
        .list(viewer.actor(), query, page.into())
        .await?;
    Ok(ApiJson(events))
}

/// Get an event by ID.
///
/// # Errors
///
/// 404 if missing, or a draft the caller cannot see.
pub async fn get_event(
    State(state): State<AppState>,
    viewer: MaybeAuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> WebResult<ApiJson<Event>> {
    let event = state
        .services
        .events
        .get(viewer.actor(), EventId::from_uuid(id))
        .await?;
    Ok(ApiJson(event))
}

/// Get an event by slug.
///
/// # Errors
///
/// 404 if missing, or a draft the caller cannot see.
pub async fn get_event_by_slug(
    State(state): State<AppState>,
    viewer: MaybeAuthUser,
    ApiPath(slug): ApiPath<String>,
) -> WebResult<ApiJson<Event>> {
    let event = state
        .services
        .events
        .get_by_slug(viewer.actor(), &slug)
        .await?;
    Ok(ApiJson(event))
}

/// Update an event.
///
/// Absent fields are kept; `"registration_deadline": null` and
/// `"max_attendees": null` clear those limits.
///
/// # Errors
///
/// 403 unless owner or admin, 409 for cancelled/completed events or a
/// capacity below the confirmed count, 422 for invalid fields.
pub async fn update_event(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(update): ApiJson<EventUpdate>,
) -> WebResult<ApiJson<Event>> {
    let event = state
        .services
        .events
        .update(&auth.actor, EventId::from_uuid(id), update)
        .await?;
    Ok(ApiJson(event))
}

/// Delete an event and its registrations.
///
/// # Errors
///
/// 403 unless owner or admin, 404 if missing.
pub async fn delete_event(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> WebResult<StatusCode> {
    state
        .services
        .events
        .delete(&auth.actor, EventId::from_uuid(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Publish a draft.
///
/// # Errors
///
/// 409 unless the event is a draft.
pub async fn publish_event(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> WebResult<ApiJson<Event>> {
    let event = state
        .services
        .events
        .publish(&auth.actor, EventId::from_uuid(id))
        .await?;
    Ok(ApiJson(event))
}

/// Cancel an event. Active registrations are cancelled and attendees notified.
///
/// # Errors
///
/// 409 for events already cancelled or completed.
pub async fn cancel_event(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> WebResult<ApiJson<Event>> {
    let event = state
        .services
        .events
        .cancel(&auth.actor, EventId::from_uuid(id))
        .await?;
    Ok(ApiJson(event))
}

/// Mark a published event as completed.
///
/// # Errors
///
/// 409 unless the event is published.
pub async fn complete_event(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> WebResult<ApiJson<Event>> {
    let event = state
        .services
        .events
        .complete(&auth.actor, EventId::from_uuid(id))
        .await?;
    Ok(ApiJson(event))
}

/// Registration statistics.
///
/// ```bash
/// curl http://localhost:8080/api/events/<id>/stats -H "Authorization: Bearer <token>"
/// # {"event_id":"...","registrations":{"pending":1,"confirmed":12,...},
/// #  "max_attendees":40,"spots_remaining":28}
/// ```
///
/// # Errors
///
/// 403 unless owner or admin.
pub async fn event_stats(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> WebResult<ApiJson<EventStats>> {
    let stats = state
        .services
        .events
        .stats(&auth.actor, EventId::from_uuid(id))
        .await?;
    Ok(ApiJson(stats))
}

//! Event lifecycle: creation, editing, status changes and statistics.

use super::{Actor, Notifier, Repositories, ServiceError, ServiceResult, can_view, nullable};
use crate::email::templates;
use crate::metrics;
use chrono::{DateTime, Utc};
use eventhub_auth::require_role;
use eventhub_core::environment::Clock;
use eventhub_core::providers::{EventFilter, EventRepository, RegistrationRepository};
use eventhub_core::slug::{candidate, slugify};
use eventhub_core::validation::{EventDraft, validate_event};
use eventhub_core::{
    DomainError, Event, EventId, EventStatus, Page, PageRequest, RegistrationCounts, Role, UserId,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Sequential slug candidates tried before falling back to a random suffix.
const MAX_SLUG_ATTEMPTS: u32 = 20;

/// Input for creating an event. New events start as drafts.
#[derive(Debug, Clone, Deserialize)]
pub struct NewEvent {
    /// Title
    pub title: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Location
    #[serde(default)]
    pub location: String,
    /// Start time
    pub starts_at: DateTime<Utc>,
    /// End time
    pub ends_at: DateTime<Utc>,
    /// Registration deadline (defaults to the start time)
    #[serde(default)]
    pub registration_deadline: Option<DateTime<Utc>>,
    /// Capacity (unlimited when absent)
    #[serde(default)]
    pub max_attendees: Option<u32>,
    /// Whether registrations need organizer approval
    #[serde(default)]
    pub requires_approval: bool,
}

/// Fields an event update may change. Absent fields are kept; `null`
/// clears the nullable ones.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventUpdate {
    /// New title (regenerates the slug)
    pub title: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New location
    pub location: Option<String>,
    /// New start time
    pub starts_at: Option<DateTime<Utc>>,
    /// New end time
    pub ends_at: Option<DateTime<Utc>>,
    /// New deadline, or `null` to use the start time
    #[serde(default, deserialize_with = "nullable")]
    pub registration_deadline: Option<Option<DateTime<Utc>>>,
    /// New capacity, or `null` for unlimited
    #[serde(default, deserialize_with = "nullable")]
    pub max_attendees: Option<Option<u32>>,
    /// New approval setting
    pub requires_approval: Option<bool>,
}

/// Listing filters accepted from clients.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventQuery {
    /// Only this status
    pub status: Option<EventStatus>,
    /// Only this organizer's events
    pub organizer_id: Option<UserId>,
    /// Only events that have not started yet
    #[serde(default)]
    pub upcoming: bool,
    /// Search in title and description
    pub q: Option<String>,
}

/// Registration statistics for one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventStats {
    /// Event ID
    pub event_id: EventId,
    /// Count per registration status
    pub registrations: RegistrationCounts,
    /// Capacity, if limited
    pub max_attendees: Option<u32>,
    /// Confirmed spots left, if limited
    pub spots_remaining: Option<u64>,
}

fn draft_of(event: &Event) -> EventDraft<'_> {
    EventDraft {
        title: &event.title,
        description: &event.description,
        location: &event.location,
        starts_at: event.starts_at,
        ends_at: event.ends_at,
        registration_deadline: event.registration_deadline,
        max_attendees: event.max_attendees,
    }
}

/// Event operations.
#[derive(Clone)]
pub struct EventService {
    events: Arc<dyn EventRepository>,
    registrations: Arc<dyn RegistrationRepository>,
    notifier: Notifier,
    clock: Arc<dyn Clock>,
}

impl EventService {
    /// Create the service.
    #[must_use]
    pub fn new(repos: Repositories, notifier: Notifier, clock: Arc<dyn Clock>) -> Self {
        Self {
            events: repos.events,
            registrations: repos.registrations,
            notifier,
            clock,
        }
    }

    /// Create a draft event owned by the caller.
    ///
    /// # Errors
    ///
    /// - `AuthError::InsufficientRole` unless the caller is an organizer or admin
    /// - `DomainError::Validation` for invalid fields
    #[tracing::instrument(skip(self, actor, input), fields(actor = %actor.user_id, title = %input.title))]
    pub async fn create(&self, actor: &Actor, input: NewEvent) -> ServiceResult<Event> {
        require_role(actor.role, Role::Organizer)?;

        let now = self.clock.now();
        let event = Event {
            id: EventId::new(),
            organizer_id: actor.user_id,
            title: input.title.trim().to_string(),
            slug: String::new(),
            description: input.description,
            location: input.location,
            starts_at: input.starts_at,
            ends_at: input.ends_at,
            registration_deadline: input.registration_deadline,
            max_attendees: input.max_attendees,
            requires_approval: input.requires_approval,
            status: EventStatus::Draft,
            created_at: now,
            updated_at: now,
        };
        validate_event(&draft_of(&event))?;

        let event = self.store_with_unique_slug(event, true).await?;
        metrics::record_event_created();
        tracing::info!(event_id = %event.id, slug = %event.slug, "Event created");
        Ok(event)
    }

    /// An event by ID.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` for missing events and for drafts the
    /// viewer may not see.
    pub async fn get(&self, viewer: Option<&Actor>, id: EventId) -> ServiceResult<Event> {
        let event = self.events.get(id).await?;
        visible(viewer, event, id.to_string())
    }

    /// An event by slug.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` for missing events and hidden drafts.
    pub async fn get_by_slug(&self, viewer: Option<&Actor>, slug: &str) -> ServiceResult<Event> {
        let event = self.events.get_by_slug(slug).await?;
        visible(viewer, event, slug.to_string())
    }

    /// Events visible to the viewer, newest start first within the page.
    ///
    /// # Errors
    ///
    /// Returns storage errors.
    pub async fn list(
        &self,
        viewer: Option<&Actor>,
        query: EventQuery,
        page: PageRequest,
    ) -> ServiceResult<Page<Event>> {
        let filter = EventFilter {
            status: query.status,
            organizer_id: query.organizer_id,
            upcoming_after: query.upcoming.then(|| self.clock.now()),
            search: query.q.map(|q| q.trim().to_string()).filter(|q| !q.is_empty()),
            include_drafts_of: viewer.map(|a| a.user_id),
            include_all_drafts: viewer.is_some_and(Actor::is_admin),
        };
        Ok(self.events.list(&filter, page).await?)
    }

    /// Edit a draft or published event.
    ///
    /// The write only applies while the event still has the status read
    /// here, so an edit can never resurrect a concurrently cancelled event.
    ///
    /// # Errors
    ///
    /// - `DomainError::Forbidden` unless the caller manages the event
    /// - `DomainError::Conflict` for cancelled/completed events, or when the
    ///   new capacity is below the confirmed count
    /// - `DomainError::StaleState` if the status changed during the edit
    /// - `DomainError::Validation` for invalid fields
    #[tracing::instrument(skip(self, actor, update), fields(actor = %actor.user_id))]
    pub async fn update(&self, actor: &Actor, id: EventId, update: EventUpdate) -> ServiceResult<Event> {
        let mut event = self.managed(actor, id).await?;
        if !event.status.is_editable() {
            return Err(DomainError::Conflict(format!(
                "Event is {} and can no longer be edited",
                event.status
            ))
            .into());
        }

        let title_changed = update
            .title
            .as_ref()
            .is_some_and(|t| t.trim() != event.title);
        if let Some(title) = update.title {
            event.title = title.trim().to_string();
        }
        if let Some(description) = update.description {
            event.description = description;
        }
        if let Some(location) = update.location {
            event.location = location;
        }
        if let Some(starts_at) = update.starts_at {
            event.starts_at = starts_at;
        }
        if let Some(ends_at) = update.ends_at {
            event.ends_at = ends_at;
        }
        if let Some(deadline) = update.registration_deadline {
            event.registration_deadline = deadline;
        }
        if let Some(requires_approval) = update.requires_approval {
            event.requires_approval = requires_approval;
        }
        let capacity_changed = update
            .max_attendees
            .is_some_and(|max| max != event.max_attendees);
        if let Some(max) = update.max_attendees {
            event.max_attendees = max;
        }
        validate_event(&draft_of(&event))?;

        // Lowering capacity below current confirmations is checked here, not
        // under the event lock; a confirmation racing this update can still land.
        if capacity_changed {
            if let Some(max) = event.max_attendees {
                let confirmed = self.registrations.count_by_status(id).await?.confirmed;
                if confirmed > u64::from(max) {
                    return Err(DomainError::Conflict(format!(
                        "Cannot set max attendees to {max}: {confirmed} registrations are already confirmed"
                    ))
                    .into());
                }
            }
        }

        event.updated_at = self.clock.now();
        let event = if title_changed {
            self.store_with_unique_slug(event, false).await?
        } else {
            self.events.update(&event).await?
        };
        tracing::info!(event_id = %event.id, "Event updated");
        Ok(event)
    }

    /// Delete an event and its registrations.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Forbidden` unless the caller manages the event.
    #[tracing::instrument(skip(self, actor), fields(actor = %actor.user_id))]
    pub async fn delete(&self, actor: &Actor, id: EventId) -> ServiceResult<()> {
        self.managed(actor, id).await?;
        let removed = self.registrations.delete_for_event(id).await?;
        self.events.delete(id).await?;
        tracing::info!(event_id = %id, registrations = removed, "Event deleted");
        Ok(())
    }

    /// Draft → published.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTransition` unless the event is a draft.
    pub async fn publish(&self, actor: &Actor, id: EventId) -> ServiceResult<Event> {
        self.transition(actor, id, EventStatus::Published).await
    }

    /// Published → completed.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTransition` unless the event is published.
    pub async fn complete(&self, actor: &Actor, id: EventId) -> ServiceResult<Event> {
        self.transition(actor, id, EventStatus::Completed).await
    }

    /// Cancel the event, cancel every active registration and tell the attendees.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTransition` for completed or already
    /// cancelled events.
    pub async fn cancel(&self, actor: &Actor, id: EventId) -> ServiceResult<Event> {
        let event = self.transition(actor, id, EventStatus::Cancelled).await?;

        let cancelled = self
            .registrations
            .cancel_active_for_event(id, event.updated_at)
            .await?;
        tracing::info!(event_id = %id, registrations = cancelled.len(), "Active registrations cancelled");
        for registration in &cancelled {
            metrics::record_registration(registration.status.as_str());
            self.notifier
                .send_to(registration.user_id, &event, templates::event_cancelled)
                .await;
        }
        Ok(event)
    }

    /// Registration counts and remaining capacity.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Forbidden` unless the caller manages the event.
    pub async fn stats(&self, actor: &Actor, id: EventId) -> ServiceResult<EventStats> {
        let event = self.managed(actor, id).await?;
        let registrations = self.registrations.count_by_status(id).await?;
        Ok(EventStats {
            event_id: id,
            registrations,
            max_attendees: event.max_attendees,
            spots_remaining: event.spots_remaining(registrations.confirmed),
        })
    }

    #[tracing::instrument(skip(self, actor), fields(actor = %actor.user_id))]
    async fn transition(&self, actor: &Actor, id: EventId, next: EventStatus) -> ServiceResult<Event> {
        let event = self.managed(actor, id).await?;
        event.status.ensure_transition(next)?;
        let from = event.status;
        let event = self
            .events
            .transition(id, from, next, self.clock.now())
            .await?;
        metrics::record_event_transition(next.as_str());
        tracing::info!(event_id = %id, %from, to = %next, "Event status changed");
        Ok(event)
    }

    /// Load an event the caller may manage.
    async fn managed(&self, actor: &Actor, id: EventId) -> ServiceResult<Event> {
        let event = self.get(Some(actor), id).await?;
        if !actor.can_manage(&event) {
            return Err(ServiceError::forbidden(
                "Only the event organizer or an admin can do this",
            ));
        }
        Ok(event)
    }

    /// Derive a free slug from the title and write the event.
    ///
    /// Tries candidates in order; a unique violation from a concurrent
    /// writer moves on to the next one.
    async fn store_with_unique_slug(&self, mut event: Event, is_new: bool) -> ServiceResult<Event> {
        let base = slugify(&event.title);
        let exclude = (!is_new).then_some(event.id);

        let sequential = (0..MAX_SLUG_ATTEMPTS).map(|n| candidate(&base, n));
        let random = std::iter::once_with(|| {
            let suffix = Uuid::new_v4().simple().to_string();
            format!("{base}-{}", &suffix[..8])
        });

        for slug in sequential.chain(random) {
            if !is_new && slug == event.slug {
                return Ok(self.events.update(&event).await?);
            }
            if self.events.slug_exists(&slug, exclude).await? {
                continue;
            }
            event.slug = slug;
            let written = if is_new {
                self.events.create(&event).await
            } else {
                self.events.update(&event).await
            };
            match written {
                Err(DomainError::SlugTaken(taken)) => {
                    tracing::debug!(slug = %taken, "Slug claimed concurrently, retrying");
                }
                other => return Ok(other?),
            }
        }
        Err(DomainError::SlugTaken(base).into())
    }
}

fn visible(viewer: Option<&Actor>, event: Event, key: String) -> ServiceResult<Event> {
    if can_view(viewer, &event) {
        Ok(event)
    } else {
        Err(DomainError::not_found("Event", key).into())
    }
}

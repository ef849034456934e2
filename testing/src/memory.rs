//! In-memory repositories.
//!
//! Each repository keeps its rows behind one `Mutex`, and every operation
//! runs its checks and writes under a single lock acquisition. The
//! registration store shares the event map and holds its mutex for the whole
//! of every write, the way the `PostgreSQL` transactions hold the event row
//! lock. Lock order is events, then registrations.
//!
//! Unlike the database schema these stores do not cascade; deleting a user
//! leaves their events in place.

use chrono::{DateTime, Utc};
use eventhub_core::providers::{
    BoxFuture, EventFilter, EventRepository, RegistrationRepository, UserRepository,
};
use eventhub_core::{
    DomainError, Event, EventId, EventStatus, Page, PageRequest, Registration,
    RegistrationCounts, RegistrationId, RegistrationStatus, Result, User, UserId,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| DomainError::Storage("in-memory store lock poisoned".to_string()))
}

// ============================================================================
// Users
// ============================================================================

/// In-memory [`UserRepository`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserRepository {
    users: Arc<Mutex<HashMap<UserId, User>>>,
}

impl InMemoryUserRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserRepository for InMemoryUserRepository {
    fn create(&self, user: &User) -> BoxFuture<'_, Result<User>> {
        let user = user.clone();
        Box::pin(async move {
            let mut users = lock(&self.users)?;
            if users.values().any(|u| u.email == user.email) {
                return Err(DomainError::EmailTaken);
            }
            users.insert(user.id, user.clone());
            Ok(user)
        })
    }

    fn get(&self, id: UserId) -> BoxFuture<'_, Result<User>> {
        Box::pin(async move {
            lock(&self.users)?
                .get(&id)
                .cloned()
                .ok_or_else(|| DomainError::not_found("User", id))
        })
    }

    fn find_by_email(&self, email: &str) -> BoxFuture<'_, Result<Option<User>>> {
        let email = email.to_string();
        Box::pin(async move {
            Ok(lock(&self.users)?
                .values()
                .find(|u| u.email == email)
                .cloned())
        })
    }

    fn update(&self, user: &User) -> BoxFuture<'_, Result<User>> {
        let user = user.clone();
        Box::pin(async move {
            let mut users = lock(&self.users)?;
            if users
                .values()
                .any(|u| u.id != user.id && u.email == user.email)
            {
                return Err(DomainError::EmailTaken);
            }
            let slot = users
                .get_mut(&user.id)
                .ok_or_else(|| DomainError::not_found("User", user.id))?;
            *slot = user.clone();
            Ok(user)
        })
    }

    fn delete(&self, id: UserId) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            lock(&self.users)?
                .remove(&id)
                .map(|_| ())
                .ok_or_else(|| DomainError::not_found("User", id))
        })
    }

    fn list(&self, page: PageRequest) -> BoxFuture<'_, Result<Page<User>>> {
        Box::pin(async move {
            let mut all: Vec<User> = lock(&self.users)?.values().cloned().collect();
            all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
            Ok(Page::from_vec(all, page))
        })
    }

    fn ping(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async { Ok(()) })
    }
}

// ============================================================================
// Events
// ============================================================================

type EventMap = HashMap<EventId, Event>;

/// In-memory [`EventRepository`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventRepository {
    events: Arc<Mutex<EventMap>>,
}

impl InMemoryEventRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn stored_event(events: &EventMap, id: EventId) -> Result<&Event> {
    events
        .get(&id)
        .ok_or_else(|| DomainError::not_found("Event", id))
}

impl EventRepository for InMemoryEventRepository {
    fn create(&self, event: &Event) -> BoxFuture<'_, Result<Event>> {
        let event = event.clone();
        Box::pin(async move {
            let mut events = lock(&self.events)?;
            if events.values().any(|e| e.slug == event.slug) {
                return Err(DomainError::SlugTaken(event.slug));
            }
            events.insert(event.id, event.clone());
            Ok(event)
        })
    }

    fn get(&self, id: EventId) -> BoxFuture<'_, Result<Event>> {
        Box::pin(async move { stored_event(&*lock(&self.events)?, id).cloned() })
    }

    fn get_by_slug(&self, slug: &str) -> BoxFuture<'_, Result<Event>> {
        let slug = slug.to_string();
        Box::pin(async move {
            lock(&self.events)?
                .values()
                .find(|e| e.slug == slug)
                .cloned()
                .ok_or_else(|| DomainError::not_found("Event", &slug))
        })
    }

    fn slug_exists(&self, slug: &str, exclude: Option<EventId>) -> BoxFuture<'_, Result<bool>> {
        let slug = slug.to_string();
        Box::pin(async move {
            Ok(lock(&self.events)?
                .values()
                .any(|e| e.slug == slug && Some(e.id) != exclude))
        })
    }

    fn update(&self, event: &Event) -> BoxFuture<'_, Result<Event>> {
        let event = event.clone();
        Box::pin(async move {
            let mut events = lock(&self.events)?;
            if stored_event(&events, event.id)?.status != event.status {
                return Err(DomainError::StaleState);
            }
            if events
                .values()
                .any(|e| e.id != event.id && e.slug == event.slug)
            {
                return Err(DomainError::SlugTaken(event.slug));
            }
            events.insert(event.id, event.clone());
            Ok(event)
        })
    }

    fn transition(
        &self,
        id: EventId,
        expected: EventStatus,
        next: EventStatus,
        now: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<Event>> {
        Box::pin(async move {
            let mut events = lock(&self.events)?;
            let slot = events
                .get_mut(&id)
                .ok_or_else(|| DomainError::not_found("Event", id))?;
            if slot.status != expected {
                return Err(DomainError::StaleState);
            }
            slot.status = next;
            slot.updated_at = now;
            Ok(slot.clone())
        })
    }

    fn delete(&self, id: EventId) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            lock(&self.events)?
                .remove(&id)
                .map(|_| ())
                .ok_or_else(|| DomainError::not_found("Event", id))
        })
    }

    fn list(&self, filter: &EventFilter, page: PageRequest) -> BoxFuture<'_, Result<Page<Event>>> {
        let filter = filter.clone();
        Box::pin(async move {
            let mut matching: Vec<Event> = lock(&self.events)?
                .values()
                .filter(|e| filter.matches(e))
                .cloned()
                .collect();
            matching.sort_by(|a, b| a.starts_at.cmp(&b.starts_at).then(a.id.cmp(&b.id)));
            Ok(Page::from_vec(matching, page))
        })
    }
}

// ============================================================================
// Registrations
// ============================================================================

type RegistrationMap = HashMap<RegistrationId, Registration>;

/// In-memory [`RegistrationRepository`].
///
/// Reads the events of the [`InMemoryEventRepository`] it was created from;
/// registrations for events that store does not know are rejected.
#[derive(Debug, Clone)]
pub struct InMemoryRegistrationRepository {
    events: Arc<Mutex<EventMap>>,
    registrations: Arc<Mutex<RegistrationMap>>,
}

impl InMemoryRegistrationRepository {
    /// Create an empty repository over the events of `events`.
    #[must_use]
    pub fn new(events: &InMemoryEventRepository) -> Self {
        Self {
            events: Arc::clone(&events.events),
            registrations: Arc::default(),
        }
    }
}

fn ensure_capacity(rows: &RegistrationMap, event: &Event) -> Result<()> {
    let Some(max) = event.max_attendees else {
        return Ok(());
    };
    let confirmed = rows
        .values()
        .filter(|r| r.event_id == event.id && r.status.counts_toward_capacity())
        .count();
    if confirmed >= usize::try_from(max).unwrap_or(usize::MAX) {
        return Err(DomainError::EventFull);
    }
    Ok(())
}

/// The registration's event, after checking its status is still `expected`.
fn event_for_change<'a>(
    events: &'a EventMap,
    rows: &RegistrationMap,
    id: RegistrationId,
    expected: RegistrationStatus,
) -> Result<&'a Event> {
    let current = rows
        .get(&id)
        .ok_or_else(|| DomainError::not_found("Registration", id))?;
    let event = stored_event(events, current.event_id)?;
    if current.status != expected {
        return Err(DomainError::StaleState);
    }
    Ok(event)
}

impl RegistrationRepository for InMemoryRegistrationRepository {
    fn insert_within_capacity(
        &self,
        registration: &Registration,
    ) -> BoxFuture<'_, Result<Registration>> {
        let registration = registration.clone();
        Box::pin(async move {
            let events = lock(&self.events)?;
            let event = stored_event(&events, registration.event_id)?;
            event.ensure_open_for_registration(registration.created_at)?;

            let mut rows = lock(&self.registrations)?;
            if rows
                .values()
                .any(|r| r.event_id == registration.event_id && r.user_id == registration.user_id)
            {
                return Err(DomainError::AlreadyRegistered);
            }
            if registration.status.counts_toward_capacity() {
                ensure_capacity(&rows, event)?;
            }
            rows.insert(registration.id, registration.clone());
            Ok(registration)
        })
    }

    fn transition(
        &self,
        id: RegistrationId,
        expected: RegistrationStatus,
        next: RegistrationStatus,
        now: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<Registration>> {
        Box::pin(async move {
            let events = lock(&self.events)?;
            let mut rows = lock(&self.registrations)?;
            let event = event_for_change(&events, &rows, id, expected)?;
            if next.is_active() && !event.status.accepts_registrations() {
                return Err(DomainError::EventNotOpen {
                    status: event.status.to_string(),
                });
            }
            if next.counts_toward_capacity() && !expected.counts_toward_capacity() {
                ensure_capacity(&rows, event)?;
            }
            let slot = rows
                .get_mut(&id)
                .ok_or_else(|| DomainError::not_found("Registration", id))?;
            slot.status = next;
            slot.updated_at = now;
            Ok(slot.clone())
        })
    }

    fn reactivate(
        &self,
        id: RegistrationId,
        status: RegistrationStatus,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<Registration>> {
        Box::pin(async move {
            let events = lock(&self.events)?;
            let mut rows = lock(&self.registrations)?;
            let event = event_for_change(&events, &rows, id, RegistrationStatus::Cancelled)?;
            event.ensure_open_for_registration(now)?;
            if status.counts_toward_capacity() {
                ensure_capacity(&rows, event)?;
            }
            let slot = rows
                .get_mut(&id)
                .ok_or_else(|| DomainError::not_found("Registration", id))?;
            slot.status = status;
            slot.notes = notes;
            slot.updated_at = now;
            Ok(slot.clone())
        })
    }

    fn get(&self, id: RegistrationId) -> BoxFuture<'_, Result<Registration>> {
        Box::pin(async move {
            lock(&self.registrations)?
                .get(&id)
                .cloned()
                .ok_or_else(|| DomainError::not_found("Registration", id))
        })
    }

    fn find_for_user(
        &self,
        event_id: EventId,
        user_id: UserId,
    ) -> BoxFuture<'_, Result<Option<Registration>>> {
        Box::pin(async move {
            Ok(lock(&self.registrations)?
                .values()
                .find(|r| r.event_id == event_id && r.user_id == user_id)
                .cloned())
        })
    }

    fn list_for_event(
        &self,
        event_id: EventId,
        status: Option<RegistrationStatus>,
    ) -> BoxFuture<'_, Result<Vec<Registration>>> {
        Box::pin(async move {
            let mut rows: Vec<Registration> = lock(&self.registrations)?
                .values()
                .filter(|r| r.event_id == event_id && status.is_none_or(|s| s == r.status))
                .cloned()
                .collect();
            rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
            Ok(rows)
        })
    }

    fn list_for_user(&self, user_id: UserId) -> BoxFuture<'_, Result<Vec<Registration>>> {
        Box::pin(async move {
            let mut rows: Vec<Registration> = lock(&self.registrations)?
                .values()
                .filter(|r| r.user_id == user_id)
                .cloned()
                .collect();
            rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
            Ok(rows)
        })
    }

    fn count_by_status(&self, event_id: EventId) -> BoxFuture<'_, Result<RegistrationCounts>> {
        Box::pin(async move {
            let mut counts = RegistrationCounts::default();
            for r in lock(&self.registrations)?
                .values()
                .filter(|r| r.event_id == event_id)
            {
                counts.add(r.status, 1);
            }
            Ok(counts)
        })
    }

    fn cancel_active_for_event(
        &self,
        event_id: EventId,
        now: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<Vec<Registration>>> {
        Box::pin(async move {
            // Held for the sweep so no registration lands concurrently.
            let _events = lock(&self.events)?;
            let mut cancelled = Vec::new();
            for r in lock(&self.registrations)?
                .values_mut()
                .filter(|r| r.event_id == event_id && r.status.is_active())
            {
                r.status = RegistrationStatus::Cancelled;
                r.updated_at = now;
                cancelled.push(r.clone());
            }
            Ok(cancelled)
        })
    }

    fn delete_for_event(&self, event_id: EventId) -> BoxFuture<'_, Result<u64>> {
        Box::pin(async move {
            let mut rows = lock(&self.registrations)?;
            let before = rows.len();
            rows.retain(|_, r| r.event_id != event_id);
            Ok((before - rows.len()) as u64)
        })
    }
}

//! Event repository trait.

use super::BoxFuture;
use crate::error::Result;
use crate::types::{Event, EventId, EventStatus, Page, PageRequest, UserId};
use chrono::{DateTime, Utc};

/// Filters for listing events.
///
/// Drafts are excluded unless the viewer is an admin
/// (`include_all_drafts`) or owns them (`include_drafts_of`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    /// Only events with this status
    pub status: Option<EventStatus>,
    /// Only events owned by this organizer
    pub organizer_id: Option<UserId>,
    /// Only events starting after this instant
    pub upcoming_after: Option<DateTime<Utc>>,
    /// Case-insensitive substring of title or description
    pub search: Option<String>,
    /// Drafts owned by this user are visible
    pub include_drafts_of: Option<UserId>,
    /// All drafts are visible
    pub include_all_drafts: bool,
}

impl EventFilter {
    /// In-memory evaluation of the filter, mirroring the SQL `WHERE` clause.
    #[must_use]
    pub fn matches(&self, event: &Event) -> bool {
        if event.status == EventStatus::Draft
            && !self.include_all_drafts
            && self.include_drafts_of != Some(event.organizer_id)
        {
            return false;
        }
        if self.status.is_some_and(|s| s != event.status) {
            return false;
        }
        if self.organizer_id.is_some_and(|o| o != event.organizer_id) {
            return false;
        }
        if self.upcoming_after.is_some_and(|t| event.starts_at <= t) {
            return false;
        }
        if let Some(needle) = &self.search {
            let needle = needle.to_lowercase();
            if !event.title.to_lowercase().contains(&needle)
                && !event.description.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        true
    }
}

/// Event repository.
///
/// This trait abstracts over event storage (PostgreSQL, in-memory).
pub trait EventRepository: Send + Sync {
    /// Create event.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Storage fails
    /// - Slug already exists → `DomainError::SlugTaken`
    fn create(&self, event: &Event) -> BoxFuture<'_, Result<Event>>;

    /// Get event by ID.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Storage fails
    /// - Event not found → `DomainError::NotFound`
    fn get(&self, id: EventId) -> BoxFuture<'_, Result<Event>>;

    /// Get event by slug.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Storage fails
    /// - Event not found → `DomainError::NotFound`
    fn get_by_slug(&self, slug: &str) -> BoxFuture<'_, Result<Event>>;

    /// Whether `slug` is used by any event other than `exclude`.
    ///
    /// # Errors
    ///
    /// Returns error if storage fails.
    fn slug_exists(&self, slug: &str, exclude: Option<EventId>) -> BoxFuture<'_, Result<bool>>;

    /// Replace an event's editable fields and slug.
    ///
    /// The status is never written. `event.status` is the status the caller
    /// read, and the write only applies while the stored status still
    /// equals it.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Storage fails
    /// - Event not found → `DomainError::NotFound`
    /// - Status changed since it was read → `DomainError::StaleState`
    /// - Slug already exists → `DomainError::SlugTaken`
    fn update(&self, event: &Event) -> BoxFuture<'_, Result<Event>>;

    /// Compare-and-set an event's status.
    ///
    /// Moves the event to `next` and stamps `updated_at = now`, but only
    /// while the stored status equals `expected`. The transition table is
    /// the caller's concern.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Storage fails
    /// - Event not found → `DomainError::NotFound`
    /// - Stored status differs from `expected` → `DomainError::StaleState`
    fn transition(
        &self,
        id: EventId,
        expected: EventStatus,
        next: EventStatus,
        now: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<Event>>;

    /// Delete event.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Storage fails
    /// - Event not found → `DomainError::NotFound`
    fn delete(&self, id: EventId) -> BoxFuture<'_, Result<()>>;

    /// List events matching `filter`, ordered by start time.
    ///
    /// # Errors
    ///
    /// Returns error if storage fails.
    fn list(&self, filter: &EventFilter, page: PageRequest) -> BoxFuture<'_, Result<Page<Event>>>;
}

//! Registration repository trait.

use super::BoxFuture;
use crate::error::Result;
use crate::types::{
    EventId, Registration, RegistrationCounts, RegistrationId, RegistrationStatus, UserId,
};
use chrono::{DateTime, Utc};

/// Registration repository.
///
/// This trait abstracts over registration storage (PostgreSQL, in-memory).
/// Writes that can activate a registration hold the parent event's lock and
/// re-read its status, deadline and capacity under it: the confirmed count
/// can never exceed `max_attendees`, and no registration becomes active on
/// an event that is not published, even when requests race an event
/// cancellation or each other for the last spot.
pub trait RegistrationRepository: Send + Sync {
    /// Insert a new registration.
    ///
    /// Under the event lock, the event must accept registrations at
    /// `registration.created_at`, and a `Confirmed` registration only goes
    /// in while fewer than `max_attendees` confirmed registrations exist.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Event not found → `DomainError::NotFound`
    /// - Event not published → `DomainError::EventNotOpen`
    /// - Past the registration deadline → `DomainError::RegistrationClosed`
    /// - A registration for (event, user) exists → `DomainError::AlreadyRegistered`
    /// - Capacity is exhausted → `DomainError::EventFull`
    /// - Storage fails
    fn insert_within_capacity(
        &self,
        registration: &Registration,
    ) -> BoxFuture<'_, Result<Registration>>;

    /// Compare-and-set a registration's status, stamping `updated_at = now`.
    ///
    /// The update only applies if the stored status still equals `expected`.
    /// Moving into `Pending` or `Confirmed` requires a published event, and
    /// moving to `Confirmed` applies the capacity rule of
    /// [`insert_within_capacity`](Self::insert_within_capacity).
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Registration not found → `DomainError::NotFound`
    /// - Stored status differs from `expected` → `DomainError::StaleState`
    /// - Event not published → `DomainError::EventNotOpen`
    /// - Capacity is exhausted → `DomainError::EventFull`
    /// - Storage fails
    fn transition(
        &self,
        id: RegistrationId,
        expected: RegistrationStatus,
        next: RegistrationStatus,
        now: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<Registration>>;

    /// Re-activate a cancelled registration as `status` with fresh `notes`.
    ///
    /// Applies the same event checks as a new registration submitted at
    /// `now`, under the event lock.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Registration not found → `DomainError::NotFound`
    /// - Registration is no longer cancelled → `DomainError::StaleState`
    /// - Event not published → `DomainError::EventNotOpen`
    /// - Past the registration deadline → `DomainError::RegistrationClosed`
    /// - Capacity is exhausted → `DomainError::EventFull`
    /// - Storage fails
    fn reactivate(
        &self,
        id: RegistrationId,
        status: RegistrationStatus,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<Registration>>;

    /// Get registration by ID.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Storage fails
    /// - Registration not found → `DomainError::NotFound`
    fn get(&self, id: RegistrationId) -> BoxFuture<'_, Result<Registration>>;

    /// Find the registration of `user_id` for `event_id`, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns error if storage fails.
    fn find_for_user(
        &self,
        event_id: EventId,
        user_id: UserId,
    ) -> BoxFuture<'_, Result<Option<Registration>>>;

    /// Registrations for an event, oldest first, optionally by status.
    ///
    /// # Errors
    ///
    /// Returns error if storage fails.
    fn list_for_event(
        &self,
        event_id: EventId,
        status: Option<RegistrationStatus>,
    ) -> BoxFuture<'_, Result<Vec<Registration>>>;

    /// Registrations of a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns error if storage fails.
    fn list_for_user(&self, user_id: UserId) -> BoxFuture<'_, Result<Vec<Registration>>>;

    /// Count registrations per status for an event.
    ///
    /// # Errors
    ///
    /// Returns error if storage fails.
    fn count_by_status(&self, event_id: EventId) -> BoxFuture<'_, Result<RegistrationCounts>>;

    /// Cancel every pending or confirmed registration of an event, holding
    /// the event lock so no registration slips in concurrently.
    ///
    /// # Returns
    ///
    /// The registrations that were cancelled, with their new status.
    ///
    /// # Errors
    ///
    /// Returns error if storage fails.
    fn cancel_active_for_event(
        &self,
        event_id: EventId,
        now: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<Vec<Registration>>>;

    /// Delete all registrations of an event.
    ///
    /// # Returns
    ///
    /// Number of registrations deleted.
    ///
    /// # Errors
    ///
    /// Returns error if storage fails.
    fn delete_for_event(&self, event_id: EventId) -> BoxFuture<'_, Result<u64>>;
}

//! Fixture builders for domain values.
//!
//! Times are anchored at [`test_epoch`](crate::test_epoch) so fixtures line
//! up with [`test_clock`](crate::test_clock).

use crate::test_epoch;
use chrono::Duration;
use eventhub_core::{
    Event, EventId, EventStatus, Registration, RegistrationId, RegistrationStatus, Role, User,
    UserId, slug,
};

/// A user with a placeholder password hash.
#[must_use]
pub fn user(email: &str, role: Role) -> User {
    User {
        id: UserId::new(),
        email: email.to_string(),
        name: email.split('@').next().unwrap_or(email).to_string(),
        password_hash: "$argon2id$v=19$m=8,t=1,p=1$c2FsdHNhbHQ$aGFzaGhhc2g".to_string(),
        role,
        created_at: test_epoch(),
        updated_at: test_epoch(),
    }
}

/// Builder for [`Event`] fixtures.
///
/// Defaults: published, starts seven days after the test epoch, lasts
/// three hours, unlimited capacity, no approval.
#[derive(Debug, Clone)]
pub struct EventBuilder {
    event: Event,
}

impl EventBuilder {
    /// Start a builder for an event owned by `organizer_id`.
    #[must_use]
    pub fn new(organizer_id: UserId, title: &str) -> Self {
        let starts_at = test_epoch() + Duration::days(7);
        Self {
            event: Event {
                id: EventId::new(),
                organizer_id,
                title: title.to_string(),
                slug: slug::slugify(title),
                description: String::new(),
                location: "Online".to_string(),
                starts_at,
                ends_at: starts_at + Duration::hours(3),
                registration_deadline: None,
                max_attendees: None,
                requires_approval: false,
                status: EventStatus::Published,
                created_at: test_epoch(),
                updated_at: test_epoch(),
            },
        }
    }

    /// Set status.
    #[must_use]
    pub const fn status(mut self, status: EventStatus) -> Self {
        self.event.status = status;
        self
    }

    /// Set capacity.
    #[must_use]
    pub const fn capacity(mut self, max_attendees: u32) -> Self {
        self.event.max_attendees = Some(max_attendees);
        self
    }

    /// Require organizer approval for registrations.
    #[must_use]
    pub const fn requires_approval(mut self) -> Self {
        self.event.requires_approval = true;
        self
    }

    /// Set the registration deadline relative to the test epoch.
    #[must_use]
    pub fn deadline_after_epoch(mut self, offset: Duration) -> Self {
        self.event.registration_deadline = Some(test_epoch() + offset);
        self
    }

    /// Override the slug.
    #[must_use]
    pub fn slug(mut self, slug: &str) -> Self {
        self.event.slug = slug.to_string();
        self
    }

    /// Finish.
    #[must_use]
    pub fn build(self) -> Event {
        self.event
    }
}

/// A registration of `user_id` for `event_id`.
#[must_use]
pub fn registration(event_id: EventId, user_id: UserId, status: RegistrationStatus) -> Registration {
    Registration {
        id: RegistrationId::new(),
        event_id,
        user_id,
        status,
        notes: None,
        created_at: test_epoch(),
        updated_at: test_epoch(),
    }
}

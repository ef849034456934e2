//! Registrations: sign-up, cancellation and organizer approval.

use super::{Actor, Notifier, Repositories, ServiceError, ServiceResult, can_view};
use crate::email::templates;
use crate::metrics;
use eventhub_core::environment::Clock;
use eventhub_core::providers::{EmailMessage, EventRepository, RegistrationRepository};
use eventhub_core::validation::validate_notes;
use eventhub_core::{
    DomainError, Event, EventId, Registration, RegistrationId, RegistrationStatus, User,
};
use std::sync::Arc;

/// Registration operations.
#[derive(Clone)]
pub struct RegistrationService {
    events: Arc<dyn EventRepository>,
    registrations: Arc<dyn RegistrationRepository>,
    notifier: Notifier,
    clock: Arc<dyn Clock>,
}

fn template_for(status: RegistrationStatus) -> Option<fn(&User, &Event) -> EmailMessage> {
    match status {
        RegistrationStatus::Confirmed => Some(templates::registration_confirmed),
        RegistrationStatus::Pending => Some(templates::registration_pending),
        RegistrationStatus::Cancelled => Some(templates::registration_cancelled),
        RegistrationStatus::Attended | RegistrationStatus::NoShow => None,
    }
}

impl RegistrationService {
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

    /// Register the caller for an event.
    ///
    /// The new registration is `confirmed`, or `pending` when the event
    /// requires approval. A previously cancelled registration is
    /// re-activated and takes the new `notes`.
    ///
    /// The event checks run twice: here on the event as read, to refuse
    /// early, and again by the repository under the event lock.
    ///
    /// # Errors
    ///
    /// - `DomainError::NotFound` for missing or hidden events
    /// - `DomainError::EventNotOpen` unless the event is published
    /// - `DomainError::RegistrationClosed` after the deadline
    /// - `DomainError::AlreadyRegistered` for an existing registration
    /// - `DomainError::EventFull` when no confirmed spot is left
    #[tracing::instrument(skip(self, actor, notes), fields(actor = %actor.user_id))]
    pub async fn register(
        &self,
        actor: &Actor,
        event_id: EventId,
        notes: Option<String>,
    ) -> ServiceResult<Registration> {
        validate_notes(notes.as_deref())?;

        let event = self.events.get(event_id).await?;
        if !can_view(Some(actor), &event) {
            return Err(DomainError::not_found("Event", event_id).into());
        }
        let now = self.clock.now();
        event.ensure_open_for_registration(now)?;

        let initial = RegistrationStatus::initial(event.requires_approval);
        let result = match self
            .registrations
            .find_for_user(event_id, actor.user_id)
            .await?
        {
            Some(existing) if existing.status == RegistrationStatus::Cancelled => {
                tracing::debug!(registration_id = %existing.id, "Re-activating cancelled registration");
                self.registrations
                    .reactivate(existing.id, initial, notes, now)
                    .await
            }
            Some(_) => Err(DomainError::AlreadyRegistered),
            None => {
                self.registrations
                    .insert_within_capacity(&Registration {
                        id: RegistrationId::new(),
                        event_id,
                        user_id: actor.user_id,
                        status: initial,
                        notes,
                        created_at: now,
                        updated_at: now,
                    })
                    .await
            }
        };

        let registration = match result {
            Ok(registration) => registration,
            Err(e) => {
                tracing::info!(%event_id, error = %e, "Registration refused");
                return Err(e.into());
            }
        };

        metrics::record_registration(registration.status.as_str());
        tracing::info!(
            registration_id = %registration.id,
            %event_id,
            status = %registration.status,
            "Registered"
        );
        self.notify(&registration, &event).await;
        Ok(registration)
    }

    /// Cancel a registration (its owner, the event organizer or an admin).
    ///
    /// # Errors
    ///
    /// - `DomainError::Forbidden` for other people's registrations
    /// - `DomainError::InvalidTransition` if it cannot be cancelled any more
    #[tracing::instrument(skip(self, actor), fields(actor = %actor.user_id))]
    pub async fn cancel(&self, actor: &Actor, id: RegistrationId) -> ServiceResult<Registration> {
        let registration = self.registrations.get(id).await?;
        let event = self.events.get(registration.event_id).await?;
        if registration.user_id != actor.user_id && !actor.can_manage(&event) {
            return Err(ServiceError::forbidden("You can only cancel your own registrations"));
        }
        self.apply(registration, &event, RegistrationStatus::Cancelled).await
    }

    /// Move a registration to `next` (organizer or admin).
    ///
    /// Confirming respects the event's capacity.
    ///
    /// # Errors
    ///
    /// - `DomainError::Forbidden` unless the caller manages the event
    /// - `DomainError::InvalidTransition` if the table forbids the move
    /// - `DomainError::EventFull` when confirming a full event
    #[tracing::instrument(skip(self, actor), fields(actor = %actor.user_id))]
    pub async fn set_status(
        &self,
        actor: &Actor,
        id: RegistrationId,
        next: RegistrationStatus,
    ) -> ServiceResult<Registration> {
        let registration = self.registrations.get(id).await?;
        let event = self.events.get(registration.event_id).await?;
        if !actor.can_manage(&event) {
            return Err(ServiceError::forbidden(
                "Only the event organizer or an admin can change registrations",
            ));
        }
        self.apply(registration, &event, next).await
    }

    /// A registration visible to the caller (its owner, the organizer or an admin).
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Forbidden` for other people's registrations.
    pub async fn get(&self, actor: &Actor, id: RegistrationId) -> ServiceResult<Registration> {
        let registration = self.registrations.get(id).await?;
        if registration.user_id == actor.user_id || actor.is_admin() {
            return Ok(registration);
        }
        let event = self.events.get(registration.event_id).await?;
        if actor.can_manage(&event) {
            Ok(registration)
        } else {
            Err(ServiceError::forbidden("You can only view your own registrations"))
        }
    }

    /// The caller's registrations, newest first.
    ///
    /// # Errors
    ///
    /// Returns storage errors.
    pub async fn list_mine(&self, actor: &Actor) -> ServiceResult<Vec<Registration>> {
        Ok(self.registrations.list_for_user(actor.user_id).await?)
    }

    /// An event's registrations, optionally by status (organizer or admin).
    ///
    /// # Errors
    ///
    /// - `DomainError::NotFound` for missing or hidden events
    /// - `DomainError::Forbidden` unless the caller manages the event
    pub async fn list_for_event(
        &self,
        actor: &Actor,
        event_id: EventId,
        status: Option<RegistrationStatus>,
    ) -> ServiceResult<Vec<Registration>> {
        let event = self.events.get(event_id).await?;
        if !can_view(Some(actor), &event) {
            return Err(DomainError::not_found("Event", event_id).into());
        }
        if !actor.can_manage(&event) {
            return Err(ServiceError::forbidden(
                "Only the event organizer or an admin can list registrations",
            ));
        }
        Ok(self.registrations.list_for_event(event_id, status).await?)
    }

    /// Validate against the transition table, then compare-and-set.
    async fn apply(
        &self,
        registration: Registration,
        event: &Event,
        next: RegistrationStatus,
    ) -> ServiceResult<Registration> {
        registration.status.ensure_transition(next)?;
        let updated = self
            .registrations
            .transition(registration.id, registration.status, next, self.clock.now())
            .await?;

        metrics::record_registration(updated.status.as_str());
        tracing::info!(
            registration_id = %updated.id,
            from = %registration.status,
            to = %updated.status,
            "Registration status changed"
        );
        self.notify(&updated, event).await;
        Ok(updated)
    }

    async fn notify(&self, registration: &Registration, event: &Event) {
        if let Some(template) = template_for(registration.status) {
            self.notifier
                .send_to(registration.user_id, event, template)
                .await;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::super::test_support::{Harness, harness, pausing_harness};
    use super::*;
    use chrono::Duration;
    use eventhub_core::{EventStatus, Role};
    use eventhub_testing::fixtures::EventBuilder;

    async fn attendee(h: &Harness, n: usize) -> Actor {
        h.user(&format!("user{n}@example.com"), Role::Attendee).await
    }

    #[tokio::test]
    async fn test_register_confirms_and_emails() {
        let h = harness();
        let org = h.user("org@example.com", Role::Organizer).await;
        let ana = attendee(&h, 1).await;
        let event = h.event(EventBuilder::new(org.user_id, "Meetup").build()).await;

        let reg = h
            .services
            .registrations
            .register(&ana, event.id, Some("vegetarian".to_string()))
            .await
            .unwrap();
        assert_eq!(reg.status, RegistrationStatus::Confirmed);
        assert_eq!(reg.notes.as_deref(), Some("vegetarian"));

        let sent = h.mailer.sent_to("user1@example.com");
        assert_eq!(sent.len(), 1);
        assert!(sent[0].subject.starts_with("You're registered"));
    }

    #[tokio::test]
    async fn test_approval_events_start_pending() {
        let h = harness();
        let org = h.user("org@example.com", Role::Organizer).await;
        let ana = attendee(&h, 1).await;
        let event = h
            .event(EventBuilder::new(org.user_id, "Workshop").requires_approval().capacity(1).build())
            .await;

        let reg = h.services.registrations.register(&ana, event.id, None).await.unwrap();
        assert_eq!(reg.status, RegistrationStatus::Pending);
        assert!(h.mailer.sent()[0].subject.starts_with("Registration received"));

        let confirmed = h
            .services
            .registrations
            .set_status(&org, reg.id, RegistrationStatus::Confirmed)
            .await
            .unwrap();
        assert_eq!(confirmed.status, RegistrationStatus::Confirmed);
        assert_eq!(h.mailer.sent().len(), 2);
    }

    #[tokio::test]
    async fn test_event_must_be_open() {
        let h = harness();
        let org = h.user("org@example.com", Role::Organizer).await;
        let ana = attendee(&h, 1).await;
        let cancelled = h
            .event(EventBuilder::new(org.user_id, "Off").status(EventStatus::Cancelled).build())
            .await;
        let draft = h
            .event(EventBuilder::new(org.user_id, "Soon").status(EventStatus::Draft).build())
            .await;
        let closed = h
            .event(
                EventBuilder::new(org.user_id, "Late")
                    .deadline_after_epoch(Duration::hours(-1))
                    .build(),
            )
            .await;

        assert!(matches!(
            h.services.registrations.register(&ana, cancelled.id, None).await,
            Err(ServiceError::Domain(DomainError::EventNotOpen { .. }))
        ));
        assert!(matches!(
            h.services.registrations.register(&ana, draft.id, None).await,
            Err(ServiceError::Domain(DomainError::NotFound { .. }))
        ));
        assert_eq!(
            h.services.registrations.register(&ana, closed.id, None).await.unwrap_err(),
            ServiceError::Domain(DomainError::RegistrationClosed)
        );
    }

    #[tokio::test]
    async fn test_duplicate_and_full() {
        let h = harness();
        let org = h.user("org@example.com", Role::Organizer).await;
        let ana = attendee(&h, 1).await;
        let bob = attendee(&h, 2).await;
        let event = h.event(EventBuilder::new(org.user_id, "Tiny").capacity(1).build()).await;

        h.services.registrations.register(&ana, event.id, None).await.unwrap();
        assert_eq!(
            h.services.registrations.register(&ana, event.id, None).await.unwrap_err(),
            ServiceError::Domain(DomainError::AlreadyRegistered)
        );
        assert_eq!(
            h.services.registrations.register(&bob, event.id, None).await.unwrap_err(),
            ServiceError::Domain(DomainError::EventFull)
        );
    }

    #[tokio::test]
    async fn test_cancel_frees_spot_and_reregistration_reuses_row() {
        let h = harness();
        let org = h.user("org@example.com", Role::Organizer).await;
        let ana = attendee(&h, 1).await;
        let bob = attendee(&h, 2).await;
        let event = h.event(EventBuilder::new(org.user_id, "Tiny").capacity(1).build()).await;

        let reg = h.services.registrations.register(&ana, event.id, None).await.unwrap();
        let cancelled = h.services.registrations.cancel(&ana, reg.id).await.unwrap();
        assert_eq!(cancelled.status, RegistrationStatus::Cancelled);

        let bobs = h.services.registrations.register(&bob, event.id, None).await.unwrap();
        assert_eq!(bobs.status, RegistrationStatus::Confirmed);
        assert_eq!(
            h.services.registrations.register(&ana, event.id, None).await.unwrap_err(),
            ServiceError::Domain(DomainError::EventFull)
        );

        h.services.registrations.cancel(&org, bobs.id).await.unwrap();
        let again = h.services.registrations.register(&ana, event.id, None).await.unwrap();
        assert_eq!(again.id, reg.id);
        assert_eq!(again.status, RegistrationStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_reregistration_takes_the_new_notes() {
        let h = harness();
        let org = h.user("org@example.com", Role::Organizer).await;
        let ana = attendee(&h, 1).await;
        let event = h.event(EventBuilder::new(org.user_id, "Dinner").build()).await;

        let reg = h
            .services
            .registrations
            .register(&ana, event.id, Some("vegetarian".to_string()))
            .await
            .unwrap();
        h.services.registrations.cancel(&ana, reg.id).await.unwrap();

        let again = h
            .services
            .registrations
            .register(&ana, event.id, Some("vegan".to_string()))
            .await
            .unwrap();
        assert_eq!(again.id, reg.id);
        assert_eq!(again.notes.as_deref(), Some("vegan"));

        h.services.registrations.cancel(&ana, reg.id).await.unwrap();
        let plain = h.services.registrations.register(&ana, event.id, None).await.unwrap();
        assert_eq!(plain.notes, None);
    }

    #[tokio::test]
    async fn test_status_changes_are_stamped_by_the_service_clock() {
        use eventhub_auth::config::{PasswordConfig, TokenConfig};
        use eventhub_testing::{MutableClock, test_epoch};

        let h = harness();
        let clock = MutableClock::new(test_epoch());
        let services = super::super::Services::new(
            h.repos.clone(),
            Arc::new(h.mailer.clone()),
            Arc::new(clock.clone()),
            eventhub_auth::TokenCodec::new(TokenConfig::new("unit-test-secret-unit-test-secret")),
            eventhub_auth::PasswordHasher::new(PasswordConfig::insecure_fast()),
        );
        let org = h.user("org@example.com", Role::Organizer).await;
        let ana = attendee(&h, 1).await;
        let event = h.event(EventBuilder::new(org.user_id, "Meetup").build()).await;

        let reg = services.registrations.register(&ana, event.id, None).await.unwrap();
        clock.advance(Duration::minutes(30));
        let cancelled = services.registrations.cancel(&ana, reg.id).await.unwrap();
        assert_eq!(cancelled.created_at, test_epoch());
        assert_eq!(cancelled.updated_at, test_epoch() + Duration::minutes(30));

        clock.advance(Duration::minutes(30));
        let back = services.registrations.register(&ana, event.id, None).await.unwrap();
        assert_eq!(back.updated_at, test_epoch() + Duration::hours(1));
    }

    #[tokio::test]
    async fn test_register_racing_event_cancel_is_refused() {
        let (h, events) = pausing_harness();
        let org = h.user("org@example.com", Role::Organizer).await;
        let ana = attendee(&h, 1).await;
        let event = h.event(EventBuilder::new(org.user_id, "Gala").build()).await;

        let mut pause = events.pause_next_get();
        let register = {
            let services = h.services.clone();
            let id = event.id;
            tokio::spawn(async move { services.registrations.register(&ana, id, None).await })
        };
        pause.reached().await;
        h.services.events.cancel(&org, event.id).await.unwrap();
        pause.resume();

        assert!(matches!(
            register.await.unwrap(),
            Err(ServiceError::Domain(DomainError::EventNotOpen { .. }))
        ));
        let counts = h.repos.registrations.count_by_status(event.id).await.unwrap();
        assert_eq!(counts.total_active(), 0);
    }

    #[tokio::test]
    async fn test_reactivation_racing_event_cancel_is_refused() {
        let (h, events) = pausing_harness();
        let org = h.user("org@example.com", Role::Organizer).await;
        let ana = attendee(&h, 1).await;
        let event = h.event(EventBuilder::new(org.user_id, "Gala").build()).await;
        let reg = h.services.registrations.register(&ana, event.id, None).await.unwrap();
        h.services.registrations.cancel(&ana, reg.id).await.unwrap();

        let mut pause = events.pause_next_get();
        let register = {
            let services = h.services.clone();
            let id = event.id;
            tokio::spawn(async move { services.registrations.register(&ana, id, None).await })
        };
        pause.reached().await;
        h.services.events.cancel(&org, event.id).await.unwrap();
        pause.resume();

        assert!(matches!(
            register.await.unwrap(),
            Err(ServiceError::Domain(DomainError::EventNotOpen { .. }))
        ));
        assert_eq!(
            h.repos.registrations.get(reg.id).await.unwrap().status,
            RegistrationStatus::Cancelled
        );
    }

    #[tokio::test]
    async fn test_transition_table_enforced() {
        let h = harness();
        let org = h.user("org@example.com", Role::Organizer).await;
        let ana = attendee(&h, 1).await;
        let event = h.event(EventBuilder::new(org.user_id, "Meetup").build()).await;
        let reg = h.services.registrations.register(&ana, event.id, None).await.unwrap();

        assert!(matches!(
            h.services.registrations.set_status(&org, reg.id, RegistrationStatus::Pending).await,
            Err(ServiceError::Domain(DomainError::InvalidTransition { .. }))
        ));
        let attended = h
            .services
            .registrations
            .set_status(&org, reg.id, RegistrationStatus::Attended)
            .await
            .unwrap();
        assert_eq!(attended.status, RegistrationStatus::Attended);
        assert!(h.services.registrations.cancel(&ana, reg.id).await.is_err());
    }

    #[tokio::test]
    async fn test_permissions() {
        let h = harness();
        let org = h.user("org@example.com", Role::Organizer).await;
        let ana = attendee(&h, 1).await;
        let bob = attendee(&h, 2).await;
        let event = h.event(EventBuilder::new(org.user_id, "Meetup").build()).await;
        let reg = h.services.registrations.register(&ana, event.id, None).await.unwrap();

        assert!(h.services.registrations.get(&bob, reg.id).await.is_err());
        assert!(h.services.registrations.cancel(&bob, reg.id).await.is_err());
        assert!(h
            .services
            .registrations
            .set_status(&ana, reg.id, RegistrationStatus::Attended)
            .await
            .is_err());
        assert!(h.services.registrations.list_for_event(&ana, event.id, None).await.is_err());

        assert!(h.services.registrations.get(&org, reg.id).await.is_ok());
        assert_eq!(h.services.registrations.list_mine(&ana).await.unwrap().len(), 1);
        assert_eq!(
            h.services
                .registrations
                .list_for_event(&org, event.id, Some(RegistrationStatus::Confirmed))
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_mail_failure_does_not_fail_registration() {
        use eventhub_auth::config::{PasswordConfig, TokenConfig};
        use eventhub_testing::FailingMailer;

        let h = harness();
        let services = super::super::Services::new(
            h.repos.clone(),
            Arc::new(FailingMailer),
            Arc::new(eventhub_testing::test_clock()),
            eventhub_auth::TokenCodec::new(TokenConfig::new("unit-test-secret-unit-test-secret")),
            eventhub_auth::PasswordHasher::new(PasswordConfig::insecure_fast()),
        );
        let org = h.user("org@example.com", Role::Organizer).await;
        let ana = attendee(&h, 1).await;
        let event = h.event(EventBuilder::new(org.user_id, "Meetup").build()).await;

        assert!(services.registrations.register(&ana, event.id, None).await.is_ok());
    }
}

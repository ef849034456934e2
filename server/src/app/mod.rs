//! Application services - authorization and orchestration over the providers.
//!
//! Each service owns `Arc`s to the repositories it needs and is cheap to
//! clone into the HTTP state:
//!
//! - [`UserService`]: accounts, login, profile management
//! - [`EventService`]: event lifecycle, slugs, statistics
//! - [`RegistrationService`]: sign-ups, cancellations, approvals
//!
//! Services receive the caller as an [`Actor`] and enforce who may do what;
//! the repositories enforce atomicity.

mod error;
mod events;
mod registrations;
mod users;

pub use error::{ServiceError, ServiceResult};
pub use events::{EventQuery, EventService, EventStats, EventUpdate, NewEvent};
pub use registrations::RegistrationService;
pub use users::{AuthSession, NewUser, UserService, UserUpdate};

use crate::metrics;
use eventhub_core::environment::Clock;
use eventhub_core::providers::{
    EmailMessage, EventRepository, Mailer, RegistrationRepository, UserRepository,
};
use eventhub_core::{Event, EventStatus, Role, User, UserId};
use serde::{Deserialize, Deserializer};
use std::sync::Arc;

/// The authenticated caller of a service operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    /// Caller's user ID
    pub user_id: UserId,
    /// Caller's current role
    pub role: Role,
}

impl Actor {
    /// Create an actor.
    #[must_use]
    pub const fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    /// Whether the actor is an admin.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Organizer of `event` or admin.
    #[must_use]
    pub fn can_manage(&self, event: &Event) -> bool {
        self.is_admin() || event.is_owned_by(self.user_id)
    }

    /// `user_id` is the actor, or the actor is an admin.
    #[must_use]
    pub fn is_self_or_admin(&self, user_id: UserId) -> bool {
        self.is_admin() || self.user_id == user_id
    }
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Self::new(user.id, user.role)
    }
}

/// Drafts are only visible to the people who may manage them.
pub(crate) fn can_view(viewer: Option<&Actor>, event: &Event) -> bool {
    event.status != EventStatus::Draft || viewer.is_some_and(|a| a.can_manage(event))
}

/// Storage handles shared by the services.
#[derive(Clone)]
pub struct Repositories {
    /// User storage
    pub users: Arc<dyn UserRepository>,
    /// Event storage
    pub events: Arc<dyn EventRepository>,
    /// Registration storage
    pub registrations: Arc<dyn RegistrationRepository>,
}

/// Best-effort email delivery.
///
/// Failures are logged and counted, never returned.
#[derive(Clone)]
pub struct Notifier {
    mailer: Arc<dyn Mailer>,
    users: Arc<dyn UserRepository>,
}

impl Notifier {
    /// Wrap a mailer.
    #[must_use]
    pub fn new(mailer: Arc<dyn Mailer>, users: Arc<dyn UserRepository>) -> Self {
        Self { mailer, users }
    }

    /// Send one message.
    pub async fn send(&self, message: EmailMessage) {
        let to = message.to.clone();
        match self.mailer.send(message).await {
            Ok(()) => {
                tracing::debug!(%to, "Notification sent");
                metrics::record_email(true);
            }
            Err(error) => {
                tracing::warn!(%to, %error, "Notification failed");
                metrics::record_email(false);
            }
        }
    }

    /// Render a template for `user_id` and send it.
    pub async fn send_to(
        &self,
        user_id: UserId,
        event: &Event,
        template: fn(&User, &Event) -> EmailMessage,
    ) {
        match self.users.get(user_id).await {
            Ok(user) => self.send(template(&user, event)).await,
            Err(error) => {
                tracing::warn!(%user_id, %error, "Cannot notify user");
                metrics::record_email(false);
            }
        }
    }
}

/// All services, built from one set of providers.
#[derive(Clone)]
pub struct Services {
    /// Accounts and authentication
    pub users: UserService,
    /// Events
    pub events: EventService,
    /// Registrations
    pub registrations: RegistrationService,
}

impl Services {
    /// Wire the services together.
    #[must_use]
    pub fn new(
        repos: Repositories,
        mailer: Arc<dyn Mailer>,
        clock: Arc<dyn Clock>,
        tokens: eventhub_auth::TokenCodec,
        hasher: eventhub_auth::PasswordHasher,
    ) -> Self {
        let notifier = Notifier::new(mailer, repos.users.clone());
        Self {
            users: UserService::new(repos.users.clone(), Arc::new(tokens), hasher, clock.clone()),
            events: EventService::new(repos.clone(), notifier.clone(), clock.clone()),
            registrations: RegistrationService::new(repos, notifier, clock),
        }
    }
}

/// Deserialize a field that distinguishes "absent" from "null".
///
/// Use with `#[serde(default, deserialize_with = "nullable")]` on an
/// `Option<Option<T>>`: absent → `None`, `null` → `Some(None)`.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod test_support {
    use super::*;
    use eventhub_auth::config::{PasswordConfig, TokenConfig};
    use eventhub_auth::{PasswordHasher, TokenCodec};
    use eventhub_testing::memory::{
        InMemoryEventRepository, InMemoryRegistrationRepository, InMemoryUserRepository,
    };
    use eventhub_testing::pausing::PausingEventRepository;
    use eventhub_testing::{RecordingMailer, test_clock};

    pub struct Harness {
        pub services: Services,
        pub repos: Repositories,
        pub mailer: RecordingMailer,
    }

    pub fn harness() -> Harness {
        let events = InMemoryEventRepository::new();
        let registrations = InMemoryRegistrationRepository::new(&events);
        assemble(Arc::new(events), registrations)
    }

    /// A harness whose event reads can be paused, for interleaving tests.
    pub fn pausing_harness() -> (Harness, Arc<PausingEventRepository>) {
        let events = InMemoryEventRepository::new();
        let registrations = InMemoryRegistrationRepository::new(&events);
        let pausing = Arc::new(PausingEventRepository::new(Arc::new(events)));
        (assemble(pausing.clone(), registrations), pausing)
    }

    fn assemble(
        events: Arc<dyn EventRepository>,
        registrations: InMemoryRegistrationRepository,
    ) -> Harness {
        let repos = Repositories {
            users: Arc::new(InMemoryUserRepository::new()),
            events,
            registrations: Arc::new(registrations),
        };
        let mailer = RecordingMailer::new();
        let services = Services::new(
            repos.clone(),
            Arc::new(mailer.clone()),
            Arc::new(test_clock()),
            TokenCodec::new(TokenConfig::new("unit-test-secret-unit-test-secret")),
            PasswordHasher::new(PasswordConfig::insecure_fast()),
        );
        Harness {
            services,
            repos,
            mailer,
        }
    }

    impl Harness {
        pub async fn user(&self, email: &str, role: Role) -> Actor {
            let user = eventhub_testing::fixtures::user(email, role);
            self.repos.users.create(&user).await.unwrap();
            Actor::from(&user)
        }

        pub async fn event(&self, event: Event) -> Event {
            self.repos.events.create(&event).await.unwrap()
        }
    }
}

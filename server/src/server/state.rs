//! Application state for the EventHub HTTP server.

use crate::app::{EventService, RegistrationService, Services, UserService};
use axum::extract::FromRef;

/// Application state shared across all HTTP handlers.
///
/// Cloned per request; every service is a bundle of `Arc`s.
#[derive(Clone)]
pub struct AppState {
    /// The application services
    pub services: Services,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub const fn new(services: Services) -> Self {
        Self { services }
    }
}

// Lets the auth extractors reach the user service from any handler state.
impl FromRef<AppState> for UserService {
    fn from_ref(state: &AppState) -> Self {
        state.services.users.clone()
    }
}

impl FromRef<AppState> for EventService {
    fn from_ref(state: &AppState) -> Self {
        state.services.events.clone()
    }
}

impl FromRef<AppState> for RegistrationService {
    fn from_ref(state: &AppState) -> Self {
        state.services.registrations.clone()
    }
}

//! Error types for domain operations.

use thiserror::Error;

/// Result type alias for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;

/// Errors produced by business rules and storage.
///
/// Variants are grouped by how the HTTP layer reports them: input problems,
/// missing resources, permission failures, state conflicts, and storage
/// faults (the only variant that is not the caller's fault).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    // ═══════════════════════════════════════════════════════════
    // Input
    // ═══════════════════════════════════════════════════════════

    /// A field failed validation.
    #[error("{0}")]
    Validation(String),

    // ═══════════════════════════════════════════════════════════
    // Lookup & permission
    // ═══════════════════════════════════════════════════════════

    /// Requested resource does not exist (or is not visible to the caller).
    #[error("{resource} with id {id} not found")]
    NotFound {
        /// Resource kind ("Event", "User", ...)
        resource: &'static str,
        /// Identifier that was looked up
        id: String,
    },

    /// Caller is authenticated but not allowed to do this.
    #[error("{0}")]
    Forbidden(String),

    // ═══════════════════════════════════════════════════════════
    // Conflicts
    // ═══════════════════════════════════════════════════════════

    /// Generic state conflict.
    #[error("{0}")]
    Conflict(String),

    /// Another account already uses this email.
    #[error("Email is already registered")]
    EmailTaken,

    /// Another event already uses this slug.
    #[error("Slug '{0}' is already taken")]
    SlugTaken(String),

    /// The user already holds an active registration for the event.
    #[error("Already registered for this event")]
    AlreadyRegistered,

    /// Confirmed registrations have reached `max_attendees`.
    #[error("Event is full")]
    EventFull,

    /// The registration deadline has passed.
    #[error("Registration for this event is closed")]
    RegistrationClosed,

    /// The event is not accepting registrations in its current status.
    #[error("Event is not open for registration (status: {status})")]
    EventNotOpen {
        /// Current event status
        status: String,
    },

    /// Status change not permitted by the transition table.
    #[error("Cannot change status from {from} to {to}")]
    InvalidTransition {
        /// Current status
        from: String,
        /// Requested status
        to: String,
    },

    /// The row changed between read and write.
    #[error("Resource was modified concurrently, please retry")]
    StaleState,

    // ═══════════════════════════════════════════════════════════
    // System
    // ═══════════════════════════════════════════════════════════

    /// Database or other storage failure.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl DomainError {
    /// Shorthand for [`DomainError::NotFound`].
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    /// Returns `true` if the error is a state conflict (HTTP 409).
    ///
    /// # Examples
    ///
    /// ```
    /// # use eventhub_core::DomainError;
    /// assert!(DomainError::EventFull.is_conflict());
    /// assert!(!DomainError::Validation("x".into()).is_conflict());
    /// ```
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::Conflict(_)
                | Self::EmailTaken
                | Self::SlugTaken(_)
                | Self::AlreadyRegistered
                | Self::EventFull
                | Self::RegistrationClosed
                | Self::EventNotOpen { .. }
                | Self::InvalidTransition { .. }
                | Self::StaleState
        )
    }

    /// Stable machine-readable code for API clients.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Conflict(_) => "CONFLICT",
            Self::EmailTaken => "EMAIL_TAKEN",
            Self::SlugTaken(_) => "SLUG_TAKEN",
            Self::AlreadyRegistered => "ALREADY_REGISTERED",
            Self::EventFull => "EVENT_FULL",
            Self::RegistrationClosed => "REGISTRATION_CLOSED",
            Self::EventNotOpen { .. } => "EVENT_NOT_OPEN",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::StaleState => "STALE_STATE",
            Self::Storage(_) => "INTERNAL_SERVER_ERROR",
        }
    }
}

//! # EventHub Core
//!
//! Domain types and business rules for the EventHub event-management backend.
//!
//! This crate has no I/O. It provides:
//!
//! - **Types**: users, events, registrations and their identifiers
//! - **State machines**: explicit transition tables for event and registration status
//! - **Slugs**: URL-safe, collision-aware slug generation
//! - **Validation**: field limits for user and event input
//! - **Providers**: storage and email traits implemented by the `postgres`
//!   and `testing` crates
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────┐
//! │   HTTP handlers (server)     │  ← JSON, auth extractors
//! ├──────────────────────────────┤
//! │   Services (server::app)     │  ← authorization, orchestration
//! ├──────────────────────────────┤
//! │   eventhub-core              │  ← rules, transitions, traits
//! ├──────────────────────────────┤
//! │   Providers                  │  ← PostgreSQL / in-memory / SMTP
//! └──────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use eventhub_core::types::{EventStatus, RegistrationStatus};
//!
//! assert!(EventStatus::Draft.can_transition_to(EventStatus::Published));
//! assert!(!EventStatus::Completed.can_transition_to(EventStatus::Published));
//!
//! assert_eq!(RegistrationStatus::initial(true), RegistrationStatus::Pending);
//! assert!(RegistrationStatus::Confirmed.counts_toward_capacity());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod providers;
pub mod slug;
pub mod types;
pub mod validation;

pub use error::{DomainError, Result};
pub use types::*;

/// Environment module - Dependency injection traits
///
/// External dependencies that business logic needs but must not own are
/// abstracted here so tests can substitute deterministic versions.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```
    /// use eventhub_core::environment::{Clock, SystemClock};
    ///
    /// let clock = SystemClock;
    /// let before = clock.now();
    /// assert!(clock.now() >= before);
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Production clock backed by the system time.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}

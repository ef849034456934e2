//! # EventHub Testing
//!
//! Test doubles for the EventHub provider traits.
//!
//! This crate provides:
//! - Deterministic clocks ([`FixedClock`], [`MutableClock`])
//! - In-memory repositories with the same atomicity guarantees as the
//!   `PostgreSQL` ones ([`memory`])
//! - Mailers that record or fail ([`RecordingMailer`], [`FailingMailer`])
//! - An event repository that pauses a caller between its read and its
//!   write ([`pausing`]), for deterministic race tests
//! - Fixture builders and proptest strategies
//!
//! ## Example
//!
//! ```
//! use eventhub_core::providers::UserRepository;
//! use eventhub_testing::{fixtures, memory::InMemoryUserRepository};
//!
//! # tokio_test::block_on(async {
//! let users = InMemoryUserRepository::new();
//! let alice = fixtures::user("alice@example.com", eventhub_core::Role::Attendee);
//! users.create(&alice).await.unwrap();
//! assert!(users.find_by_email("alice@example.com").await.unwrap().is_some());
//! # });
//! ```

use chrono::{DateTime, Utc};
use eventhub_core::environment::Clock;

pub mod fixtures;
pub mod memory;
pub mod pausing;

/// Mock implementations of environment traits and delivery providers.
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use eventhub_core::providers::{BoxFuture, EmailMessage, Mailer};
    use std::sync::{Arc, Mutex};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use eventhub_testing::mocks::FixedClock;
    /// use eventhub_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Clock that tests can move forward, e.g. past a registration deadline
    /// or a token expiry.
    ///
    /// Clones share the same instant.
    #[derive(Debug, Clone)]
    pub struct MutableClock {
        time: Arc<Mutex<DateTime<Utc>>>,
    }

    impl MutableClock {
        /// Start at `time`.
        #[must_use]
        pub fn new(time: DateTime<Utc>) -> Self {
            Self {
                time: Arc::new(Mutex::new(time)),
            }
        }

        /// Move the clock by `by` (may be negative).
        pub fn advance(&self, by: chrono::Duration) {
            if let Ok(mut time) = self.time.lock() {
                *time += by;
            }
        }

        /// Jump to `time`.
        pub fn set(&self, time: DateTime<Utc>) {
            if let Ok(mut current) = self.time.lock() {
                *current = time;
            }
        }
    }

    impl Clock for MutableClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
                .lock()
                .map_or_else(|poisoned| *poisoned.into_inner(), |t| *t)
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(test_epoch())
    }

    /// 2025-01-01 00:00:00 UTC, the instant every test clock starts at.
    ///
    /// # Panics
    ///
    /// Never in practice; the timestamp is a literal.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_epoch() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
            .expect("hardcoded timestamp should always parse")
            .with_timezone(&Utc)
    }

    /// Mailer that keeps every message in memory.
    #[derive(Debug, Clone, Default)]
    pub struct RecordingMailer {
        sent: Arc<Mutex<Vec<EmailMessage>>>,
    }

    impl RecordingMailer {
        /// Create an empty mailer.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Messages sent so far, oldest first.
        #[must_use]
        pub fn sent(&self) -> Vec<EmailMessage> {
            self.sent.lock().map(|s| s.clone()).unwrap_or_default()
        }

        /// Messages addressed to `to`.
        #[must_use]
        pub fn sent_to(&self, to: &str) -> Vec<EmailMessage> {
            self.sent().into_iter().filter(|m| m.to == to).collect()
        }
    }

    impl Mailer for RecordingMailer {
        fn send(&self, message: EmailMessage) -> BoxFuture<'_, Result<(), String>> {
            Box::pin(async move {
                self.sent
                    .lock()
                    .map_err(|_| "mailer lock poisoned".to_string())?
                    .push(message);
                Ok(())
            })
        }
    }

    /// Mailer whose every delivery fails.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct FailingMailer;

    impl Mailer for FailingMailer {
        fn send(&self, message: EmailMessage) -> BoxFuture<'_, Result<(), String>> {
            Box::pin(async move { Err(format!("SMTP unavailable (to {})", message.to)) })
        }
    }
}

/// Property-based testing utilities using proptest.
pub mod properties {
    use eventhub_core::{RegistrationStatus, Role};
    use proptest::prelude::*;

    /// Any role.
    pub fn role() -> impl Strategy<Value = Role> {
        prop_oneof![Just(Role::Admin), Just(Role::Organizer), Just(Role::Attendee)]
    }

    /// Any registration status.
    pub fn registration_status() -> impl Strategy<Value = RegistrationStatus> {
        proptest::sample::select(RegistrationStatus::ALL.to_vec())
    }

    /// Realistic event titles, including punctuation and non-ASCII.
    pub fn event_title() -> impl Strategy<Value = String> {
        "[A-Za-z0-9][A-Za-z0-9 :&!?,.'é-]{0,60}"
    }

    /// Passwords accepted by the length policy.
    pub fn valid_password() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9!@#$%^&*]{8,64}"
    }
}

/// Install a `tracing` subscriber for tests (idempotent).
///
/// Honors `RUST_LOG`; output is captured by the test harness.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

// Re-export commonly used items
pub use mocks::{FailingMailer, FixedClock, MutableClock, RecordingMailer, test_clock, test_epoch};

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use eventhub_core::providers::{EmailMessage, Mailer};

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        assert_eq!(clock.now(), clock.now());
    }

    #[test]
    fn test_mutable_clock_is_shared() {
        let clock = MutableClock::new(test_epoch());
        let other = clock.clone();
        clock.advance(chrono::Duration::hours(2));
        assert_eq!(other.now(), test_epoch() + chrono::Duration::hours(2));
    }

    #[tokio::test]
    async fn test_recording_and_failing_mailers() {
        let message = EmailMessage {
            to: "a@example.com".to_string(),
            subject: "Hi".to_string(),
            body: "Body".to_string(),
        };
        let recorder = RecordingMailer::new();
        recorder.send(message.clone()).await.unwrap();
        assert_eq!(recorder.sent_to("a@example.com"), vec![message.clone()]);
        assert!(FailingMailer.send(message).await.is_err());
    }
}

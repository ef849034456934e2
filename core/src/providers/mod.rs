//! Storage and delivery providers.
//!
//! This module defines traits for every external dependency the services
//! use. The server depends on these traits; the `eventhub-postgres` crate
//! provides production implementations and `eventhub-testing` provides
//! in-memory ones.
//!
//! # Dyn Compatibility
//!
//! Every method returns `Pin<Box<dyn Future>>` instead of using `async fn`,
//! so implementations can be held as `Arc<dyn UserRepository>` and swapped
//! at startup (PostgreSQL in production, in-memory in tests).
//!
//! # Atomicity
//!
//! Every status change is a compare-and-set: [`EventRepository::transition`]
//! and [`RegistrationRepository::transition`] only write while the stored
//! status still equals the one the caller read, and
//! [`EventRepository::update`] refuses to write over a status that changed.
//!
//! Registration writes hold the parent event's lock (a `FOR UPDATE` row lock
//! in `PostgreSQL`, the event map's mutex in memory) and re-check the event's
//! status, deadline and capacity under it. A registration therefore never
//! lands on an event that was cancelled after the service read it.
//! Services must not emulate these methods with a read followed by a write.

use std::future::Future;
use std::pin::Pin;

pub mod email;
pub mod event;
pub mod registration;
pub mod user;

pub use email::{EmailMessage, Mailer};
pub use event::{EventFilter, EventRepository};
pub use registration::RegistrationRepository;
pub use user::UserRepository;

/// Boxed, sendable future returned by provider methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

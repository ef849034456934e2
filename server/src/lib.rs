//! EventHub - event management backend.
//!
//! Organizers publish events, users register for them, and the server keeps
//! capacity, deadlines and status transitions consistent under concurrent
//! requests.
//!
//! # Architecture
//!
//! ```text
//!   HTTP (axum)                      api/, auth/
//!     │  extractors: AuthUser, RequireOrganizer, ApiJson, ...
//!     ▼
//!   Services                         app/
//!     │  authorization, validation, transitions, notifications
//!     ▼
//!   Providers (traits in eventhub-core)
//!     ├── PostgreSQL repositories    eventhub-postgres
//!     ├── In-memory repositories     eventhub-testing
//!     └── Mailer (SMTP / console)    email.rs
//! ```
//!
//! # Concurrency
//!
//! Capacity is enforced inside the repository: a registration is inserted
//! as confirmed only when the confirmed count is still below the event's
//! limit, in one atomic step. Status changes are compare-and-set on the
//! previous status, so two racing organizers cannot both apply a change.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod email;
pub mod metrics;
pub mod server;

pub use app::{Actor, Repositories, ServiceError, Services};
pub use config::Config;
pub use server::{AppState, build_router};

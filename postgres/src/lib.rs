//! `PostgreSQL` repositories for EventHub.
//!
//! Implements the provider traits from `eventhub-core` on top of a shared
//! [`PgPool`]:
//!
//! - [`PostgresUserRepository`]
//! - [`PostgresEventRepository`]
//! - [`PostgresRegistrationRepository`]
//!
//! Queries use sqlx's runtime API (`query_as` + `bind`) so the crate builds
//! without a live database. Registration writes run in a transaction that
//! locks the event row with `SELECT ... FOR UPDATE` and re-checks it; event
//! status changes are conditional `UPDATE ... WHERE status = $expected`.
//!
//! # Example
//!
//! ```no_run
//! use eventhub_postgres::{connect, migrate, PoolSettings, PostgresEventRepository};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = connect("postgres://localhost/eventhub", &PoolSettings::default()).await?;
//! migrate(&pool).await?;
//! let events = PostgresEventRepository::new(pool);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use eventhub_core::DomainError;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;

mod events;
mod registrations;
mod rows;
mod users;

pub use events::PostgresEventRepository;
pub use registrations::PostgresRegistrationRepository;
pub use users::PostgresUserRepository;

/// Connection pool sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    /// Maximum open connections
    pub max_connections: u32,
    /// Connections kept open when idle
    pub min_connections: u32,
    /// How long to wait for a connection
    pub connect_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
        }
    }
}

/// Open a connection pool.
///
/// # Errors
///
/// Returns the sqlx error if the database is unreachable.
pub async fn connect(url: &str, settings: &PoolSettings) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(settings.connect_timeout)
        .connect(url)
        .await
}

/// Apply the embedded schema migrations.
///
/// # Errors
///
/// Returns the migration error if any script fails.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Map a sqlx error to a storage error, logging the detail.
pub(crate) fn storage(context: &'static str) -> impl FnOnce(sqlx::Error) -> DomainError {
    move |e| {
        tracing::error!(error = %e, context, "database operation failed");
        DomainError::Storage(format!("{context}: {e}"))
    }
}

/// Whether the error is a unique-constraint violation.
pub(crate) fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

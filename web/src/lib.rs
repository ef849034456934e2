//! Axum integration for EventHub.
//!
//! The HTTP shell around the services: everything here is generic over the
//! application state so the `server` crate can compose it freely.
//!
//! # Request Flow
//!
//! 1. **Correlation** middleware tags the request (`X-Correlation-ID`)
//! 2. **Extractors** parse path, query and JSON, rejecting with [`AppError`]
//! 3. **Handler** calls a service, which returns `DomainError` / `AuthError`
//! 4. **`AppError`** maps the failure to a status code and `{ code, message }`
//!
//! # Example
//!
//! ```
//! use axum::{Router, routing::get};
//! use eventhub_web::{correlation_id_layer, handlers::health_check};
//!
//! let app: Router = Router::new()
//!     .route("/health", get(health_check))
//!     .layer(correlation_id_layer());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;

// Re-export key types for convenience
pub use error::AppError;
pub use extractors::{ApiJson, ApiPath, ApiQuery, CorrelationId, OptionalJson};
pub use middleware::{CORRELATION_ID_HEADER, correlation_id_layer};

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;

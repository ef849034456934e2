//! Error types for web handlers.
//!
//! [`AppError`] is the single error type handlers return. Domain, auth and
//! extractor failures all convert into it, and it renders as
//! `{ "code": ..., "message": ... }` with the matching status.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use eventhub_auth::AuthError;
use eventhub_core::DomainError;
use serde::Serialize;
use std::fmt;

/// Application error type for web handlers.
///
/// # Examples
///
/// ```
/// use axum::http::StatusCode;
/// use eventhub_core::DomainError;
/// use eventhub_web::AppError;
///
/// let err = AppError::from(DomainError::EventFull);
/// assert_eq!(err.status(), StatusCode::CONFLICT);
/// assert_eq!(err.code(), "EVENT_FULL");
/// ```
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// Error message (user-facing)
    message: String,
    /// Error code (for client error handling)
    code: String,
    /// Internal error (for logging, not exposed to client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            code: code.into(),
            source: None,
        }
    }

    /// Attach the underlying cause (logged, never sent).
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// HTTP status.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// User-facing message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Create a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message, "BAD_REQUEST")
    }

    /// Create a 403 Forbidden error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message, "FORBIDDEN")
    }

    /// Create a 422 Unprocessable Entity error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message, "VALIDATION_ERROR")
    }

    /// Create a 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message, "INTERNAL_SERVER_ERROR")
    }

    /// Render an extractor rejection.
    pub(crate) fn from_rejection(status: StatusCode, body: String) -> Self {
        match status {
            StatusCode::UNPROCESSABLE_ENTITY => Self::validation(body),
            StatusCode::BAD_REQUEST => Self::bad_request(body),
            StatusCode::UNSUPPORTED_MEDIA_TYPE => Self::new(status, body, "UNSUPPORTED_MEDIA_TYPE"),
            _ => Self::new(status, body, "BAD_REQUEST"),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    /// Error code (for client error handling).
    code: String,
    /// Human-readable error message.
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            match &self.source {
                Some(source) => tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    error = %source,
                    "Internal server error"
                ),
                None => tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    "Internal server error"
                ),
            }
        } else {
            tracing::debug!(status = %self.status, code = %self.code, "Request rejected");
        }

        let body = ErrorResponse {
            code: self.code,
            message: self.message,
        };

        (self.status, Json(body)).into_response()
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match &err {
            DomainError::Validation(message) => Self::validation(message.clone()),
            DomainError::NotFound { .. } => {
                Self::new(StatusCode::NOT_FOUND, err.to_string(), err.code())
            }
            DomainError::Forbidden(message) => Self::forbidden(message.clone()),
            DomainError::Storage(detail) => Self::internal("An internal error occurred")
                .with_source(anyhow::anyhow!(detail.clone())),
            _ => Self::new(StatusCode::CONFLICT, err.to_string(), err.code()),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => {
                Self::new(StatusCode::UNAUTHORIZED, err.to_string(), "INVALID_CREDENTIALS")
            }
            AuthError::MissingToken => {
                Self::new(StatusCode::UNAUTHORIZED, err.to_string(), "MISSING_TOKEN")
            }
            AuthError::InvalidToken(detail) => {
                tracing::debug!(%detail, "Rejected bearer token");
                Self::new(StatusCode::UNAUTHORIZED, "Invalid token", "INVALID_TOKEN")
            }
            AuthError::TokenExpired => {
                Self::new(StatusCode::UNAUTHORIZED, err.to_string(), "TOKEN_EXPIRED")
            }
            AuthError::InsufficientRole { .. } => Self::forbidden(err.to_string()),
            AuthError::WeakPassword(message) => Self::validation(message),
            AuthError::InvalidEmail => Self::validation(err.to_string()),
            AuthError::Hashing(_) | AuthError::Encoding(_) => {
                Self::internal("An internal error occurred").with_source(anyhow::Error::new(err))
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::from_rejection(rejection.status(), rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::from_rejection(rejection.status(), rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::from_rejection(rejection.status(), rejection.body_text())
    }
}

/// Convert `anyhow::Error` to `AppError`.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal("An internal error occurred").with_source(err)
    }
}

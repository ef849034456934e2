//! Service error type.

use eventhub_auth::AuthError;
use eventhub_core::DomainError;
use eventhub_web::AppError;
use thiserror::Error;

/// Errors returned by the application services.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// A business rule or storage failure
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// An authentication or authorization failure
    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Result type alias for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    /// Shorthand for a [`DomainError::Forbidden`].
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Domain(DomainError::Forbidden(message.into()))
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Domain(e) => e.into(),
            ServiceError::Auth(e) => e.into(),
        }
    }
}

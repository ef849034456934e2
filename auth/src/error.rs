//! Error types for authentication and authorization operations.

use eventhub_core::types::Role;
use thiserror::Error;

/// Result type alias for authentication operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Error taxonomy for authentication and authorization.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    // ═══════════════════════════════════════════════════════════
    // Authentication Errors
    // ═══════════════════════════════════════════════════════════

    /// Unknown email or wrong password. Deliberately does not say which.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// No bearer token on a request that needs one.
    #[error("Missing authorization header")]
    MissingToken,

    /// Token is malformed, has a bad signature or a foreign issuer.
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Token signature is fine but `exp` has passed.
    #[error("Token has expired")]
    TokenExpired,

    // ═══════════════════════════════════════════════════════════
    // Authorization Errors
    // ═══════════════════════════════════════════════════════════

    /// Caller's role is below what the operation needs.
    #[error("Insufficient permissions: {required} role required")]
    InsufficientRole {
        /// Role that was required
        required: Role,
    },

    // ═══════════════════════════════════════════════════════════
    // Input Errors
    // ═══════════════════════════════════════════════════════════

    /// Password does not meet the length policy.
    #[error("{0}")]
    WeakPassword(String),

    /// Email address is not well-formed.
    #[error("Invalid email address")]
    InvalidEmail,

    // ═══════════════════════════════════════════════════════════
    // System Errors
    // ═══════════════════════════════════════════════════════════

    /// Password hashing failed (bad parameters, corrupt stored hash).
    #[error("Password hashing error: {0}")]
    Hashing(String),

    /// Token encoding failed.
    #[error("Token encoding error: {0}")]
    Encoding(String),
}

impl AuthError {
    /// Returns `true` if the caller should re-authenticate (HTTP 401).
    ///
    /// # Examples
    ///
    /// ```
    /// # use eventhub_auth::AuthError;
    /// assert!(AuthError::TokenExpired.is_unauthenticated());
    /// assert!(!AuthError::InvalidEmail.is_unauthenticated());
    /// ```
    #[must_use]
    pub const fn is_unauthenticated(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials
                | Self::MissingToken
                | Self::InvalidToken(_)
                | Self::TokenExpired
        )
    }

    /// Returns `true` for server-side faults that should be logged.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Hashing(_) | Self::Encoding(_))
    }
}

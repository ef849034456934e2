//! # EventHub Authentication & Authorization
//!
//! Stateless authentication primitives for the EventHub API:
//!
//! - **Passwords**: Argon2id hashing with configurable cost ([`password`])
//! - **Tokens**: HS256 JSON Web Tokens carrying the user id and role ([`token`])
//! - **Roles**: role checks shared by the HTTP extractors ([`require_role`])
//! - **Emails**: normalisation and format validation ([`utils`])
//!
//! ## Flow
//!
//! ```text
//! register/login ──► verify password ──► TokenCodec::issue ──► "Bearer <jwt>"
//!                                                                   │
//! request ──► TokenCodec::verify ──► Claims { sub, role, exp } ◄────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use eventhub_auth::{config::TokenConfig, token::TokenCodec};
//! use eventhub_core::types::{Role, UserId};
//! use chrono::Utc;
//!
//! let codec = TokenCodec::new(TokenConfig::new("a-long-enough-test-secret-value!!"));
//! let user_id = UserId::new();
//! let issued = codec.issue(user_id, Role::Organizer, Utc::now()).unwrap();
//! let claims = codec.verify(&issued.token, Utc::now()).unwrap();
//! assert_eq!(claims.user_id(), user_id);
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

pub mod config;
pub mod error;
pub mod password;
pub mod token;
pub mod utils;

pub use error::{AuthError, Result};
pub use password::PasswordHasher;
pub use token::{Claims, IssuedToken, TokenCodec};

use eventhub_core::types::Role;

/// Ensure `actual` satisfies `required`.
///
/// Admins satisfy every requirement; organizers satisfy `Organizer` and
/// `Attendee`; attendees only satisfy `Attendee`.
///
/// # Errors
///
/// Returns [`AuthError::InsufficientRole`] when the role is too low.
///
/// # Examples
///
/// ```
/// use eventhub_auth::require_role;
/// use eventhub_core::types::Role;
///
/// assert!(require_role(Role::Admin, Role::Organizer).is_ok());
/// assert!(require_role(Role::Attendee, Role::Organizer).is_err());
/// ```
pub const fn require_role(actual: Role, required: Role) -> Result<()> {
    let ok = match required {
        Role::Admin => matches!(actual, Role::Admin),
        Role::Organizer => actual.can_organize(),
        Role::Attendee => true,
    };
    if ok {
        Ok(())
    } else {
        Err(AuthError::InsufficientRole { required })
    }
}

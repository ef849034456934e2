//! Authentication extractors for the EventHub API.
//!
//! Provides Axum extractors for:
//! - Bearer token extraction from the `Authorization` header
//! - Token verification plus a fresh user lookup on every request
//! - Role-based access control (admin and organizer checks)
//!
//! # Usage
//!
//! ```rust,ignore
//! use eventhub_server::auth::{AuthUser, RequireOrganizer};
//!
//! // Require authentication
//! async fn profile(auth: AuthUser) -> ApiJson<User> {
//!     ApiJson(auth.user)
//! }
//!
//! // Require organizer or admin role
//! async fn create_event(RequireOrganizer(auth): RequireOrganizer) -> ... { ... }
//! ```

use crate::app::{Actor, UserService};
use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use eventhub_auth::{AuthError, require_role, token::parse_bearer};
use eventhub_core::{Role, User};
use eventhub_web::AppError;

/// Bearer token extracted from `Authorization: Bearer <token>`.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

impl BearerToken {
    /// Read the token from request headers.
    ///
    /// Returns `Ok(None)` when there is no `Authorization` header at all.
    fn from_parts(parts: &Parts) -> Result<Option<Self>, AuthError> {
        let Some(value) = parts.headers.get(AUTHORIZATION) else {
            return Ok(None);
        };
        let header = value
            .to_str()
            .map_err(|_| AuthError::InvalidToken("authorization header is not ASCII".to_string()))?;
        let token = parse_bearer(header).ok_or_else(|| {
            AuthError::InvalidToken("expected 'Bearer <token>'".to_string())
        })?;
        Ok(Some(Self(token.to_string())))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(parts)?.ok_or(AuthError::MissingToken)?)
    }
}

/// Authenticated user.
///
/// Verifies the bearer token and loads the account, so deleted users are
/// rejected and role changes apply immediately.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Caller identity for the services
    pub actor: Actor,
    /// The full account
    pub user: User,
}

impl AuthUser {
    async fn resolve(users: &UserService, token: &str) -> Result<Self, AppError> {
        let user = users.authenticate(token).await?;
        tracing::debug!(user_id = %user.id, role = %user.role, "Authenticated request");
        Ok(Self {
            actor: Actor::from(&user),
            user,
        })
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    UserService: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let bearer = BearerToken::from_request_parts(parts, state).await?;
        Self::resolve(&UserService::from_ref(state), &bearer.0).await
    }
}

/// Optionally authenticated user.
///
/// Anonymous requests yield `None`; a token that is present but invalid is
/// still rejected with 401.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

impl MaybeAuthUser {
    /// Caller identity, if any.
    #[must_use]
    pub fn actor(&self) -> Option<&Actor> {
        self.0.as_ref().map(|auth| &auth.actor)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
    UserService: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match BearerToken::from_parts(parts)? {
            Some(bearer) => Ok(Self(Some(
                AuthUser::resolve(&UserService::from_ref(state), &bearer.0).await?,
            ))),
            None => Ok(Self(None)),
        }
    }
}

/// Authenticated admin.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub AuthUser);

#[async_trait]
impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
    UserService: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = AuthUser::from_request_parts(parts, state).await?;
        require_role(auth.actor.role, Role::Admin)?;
        Ok(Self(auth))
    }
}

/// Authenticated organizer or admin.
#[derive(Debug, Clone)]
pub struct RequireOrganizer(pub AuthUser);

#[async_trait]
impl<S> FromRequestParts<S> for RequireOrganizer
where
    S: Send + Sync,
    UserService: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = AuthUser::from_request_parts(parts, state).await?;
        require_role(auth.actor.role, Role::Organizer)?;
        Ok(Self(auth))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_parsing() {
        assert!(BearerToken::from_parts(&parts(None)).unwrap().is_none());
        assert_eq!(
            BearerToken::from_parts(&parts(Some("Bearer abc"))).unwrap().unwrap().0,
            "abc"
        );
        assert!(matches!(
            BearerToken::from_parts(&parts(Some("Basic dXNlcg=="))),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let mut p = parts(None);
        let err = BearerToken::from_request_parts(&mut p, &()).await.unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::UNAUTHORIZED);
        assert_eq!(err.code(), "MISSING_TOKEN");
    }
}

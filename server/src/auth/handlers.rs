//! Account endpoints: register, login and the current user.

use super::AuthUser;
use crate::app::{AuthSession, NewUser};
use crate::server::state::AppState;
use axum::{extract::State, http::StatusCode};
use eventhub_core::User;
use eventhub_web::{ApiJson, WebResult};
use serde::Deserialize;

/// Login credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    /// Email address
    pub email: String,
    /// Password
    pub password: String,
}

/// Create an account.
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/register
/// { "email": "ana@example.com", "name": "Ana", "password": "..." }
/// ```
///
/// Responds `201 Created` with `{ token, expires_at, user }`.
///
/// # Errors
///
/// 409 if the email is taken, 422 for invalid input.
pub async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<NewUser>,
) -> WebResult<(StatusCode, ApiJson<AuthSession>)> {
    let session = state.services.users.register(request).await?;
    Ok((StatusCode::CREATED, ApiJson(session)))
}

/// Sign in.
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/login
/// { "email": "ana@example.com", "password": "..." }
/// ```
///
/// # Errors
///
/// 401 for an unknown email or a wrong password.
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> WebResult<ApiJson<AuthSession>> {
    let session = state
        .services
        .users
        .login(&request.email, &request.password)
        .await?;
    Ok(ApiJson(session))
}

/// The authenticated user.
///
/// ```text
/// GET /api/auth/me
/// Authorization: Bearer <token>
/// ```
#[allow(clippy::unused_async)]
pub async fn me(auth: AuthUser) -> ApiJson<User> {
    ApiJson(auth.user)
}

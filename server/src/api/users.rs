//! User administration endpoints.
//!
//! - GET /api/users - List users (admin)
//! - GET /api/users/:id - Get a user (self or admin)
//! - PATCH /api/users/:id - Update a user (self or admin; role changes admin only)
//! - DELETE /api/users/:id - Delete a user (admin)

use super::PageParams;
use crate::app::UserUpdate;
use crate::auth::{AuthUser, RequireAdmin};
use crate::server::state::AppState;
use axum::{extract::State, http::StatusCode};
use eventhub_core::{Page, User, UserId};
use eventhub_web::{ApiJson, ApiPath, ApiQuery, WebResult};
use uuid::Uuid;

/// List users.
///
/// ```bash
/// curl "http://localhost:8080/api/users?page=0&page_size=20" \
///   -H "Authorization: Bearer <admin token>"
/// ```
///
/// # Errors
///
/// 401 without a token, 403 for non-admins.
pub async fn list_users(
    State(state): State<AppState>,
    RequireAdmin(auth): RequireAdmin,
    ApiQuery(params): ApiQuery<PageParams>,
) -> WebResult<ApiJson<Page<User>>> {
    let page = state.services.users.list(&auth.actor, params.into()).await?;
    Ok(ApiJson(page))
}

/// Get a user.
///
/// # Errors
///
/// 403 for other users' accounts unless admin, 404 if missing.
pub async fn get_user(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> WebResult<ApiJson<User>> {
    let user = state
        .services
        .users
        .get(&auth.actor, UserId::from_uuid(id))
        .await?;
    Ok(ApiJson(user))
}

/// Update a user.
///
/// ```bash
/// curl -X PATCH http://localhost:8080/api/users/<id> \
///   -H "Authorization: Bearer <token>" \
///   -H "Content-Type: application/json" \
///   -d '{"name": "Ana Lima"}'
/// ```
///
/// # Errors
///
/// 403 when editing someone else or changing a role as non-admin,
/// 422 for invalid values.
pub async fn update_user(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(update): ApiJson<UserUpdate>,
) -> WebResult<ApiJson<User>> {
    let user = state
        .services
        .users
        .update(&auth.actor, UserId::from_uuid(id), update)
        .await?;
    Ok(ApiJson(user))
}

/// Delete a user with their events and registrations.
///
/// # Errors
///
/// 403 for non-admins, 404 if missing.
pub async fn delete_user(
    State(state): State<AppState>,
    RequireAdmin(auth): RequireAdmin,
    ApiPath(id): ApiPath<Uuid>,
) -> WebResult<StatusCode> {
    state
        .services
        .users
        .delete(&auth.actor, UserId::from_uuid(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

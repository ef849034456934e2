//! Accounts, login and profile management.

use super::{Actor, ServiceError, ServiceResult};
use crate::metrics;
use chrono::{DateTime, Utc};
use eventhub_auth::utils::{normalize_email, parse_email};
use eventhub_auth::{AuthError, PasswordHasher, TokenCodec, password::check_strength};
use eventhub_core::environment::Clock;
use eventhub_core::providers::UserRepository;
use eventhub_core::validation::validate_name;
use eventhub_core::{DomainError, Page, PageRequest, Role, User, UserId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Input for creating an account.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    /// Email address
    pub email: String,
    /// Display name
    pub name: String,
    /// Plain-text password
    pub password: String,
}

/// Fields an account update may change. Absent fields are kept.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    /// New display name
    pub name: Option<String>,
    /// New password
    pub password: Option<String>,
    /// New role (admins only)
    pub role: Option<Role>,
}

/// A signed-in user and their access token.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    /// Bearer token
    pub token: String,
    /// Token expiry
    pub expires_at: DateTime<Utc>,
    /// The account
    pub user: User,
}

/// Account operations.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
    tokens: Arc<TokenCodec>,
    hasher: PasswordHasher,
    clock: Arc<dyn Clock>,
}

impl UserService {
    /// Create the service.
    #[must_use]
    pub fn new(
        users: Arc<dyn UserRepository>,
        tokens: Arc<TokenCodec>,
        hasher: PasswordHasher,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            tokens,
            hasher,
            clock,
        }
    }

    /// Create an attendee account and sign it in.
    ///
    /// # Errors
    ///
    /// - `AuthError::InvalidEmail` / `AuthError::WeakPassword` for bad input
    /// - `DomainError::Validation` for a bad name
    /// - `DomainError::EmailTaken` if the email is in use
    #[tracing::instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: NewUser) -> ServiceResult<AuthSession> {
        let email = parse_email(&input.email)?;
        let name = input.name.trim().to_string();
        validate_name(&name)?;
        check_strength(&input.password)?;

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(DomainError::EmailTaken.into());
        }

        let password_hash = self.hash_password(input.password).await?;
        let now = self.clock.now();
        let user = self
            .users
            .create(&User {
                id: UserId::new(),
                email,
                name,
                password_hash,
                role: Role::Attendee,
                created_at: now,
                updated_at: now,
            })
            .await?;

        metrics::record_user_registered();
        tracing::info!(user_id = %user.id, "User registered");
        self.session_for(user)
    }

    /// Exchange credentials for a token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for an unknown email or a
    /// wrong password alike.
    #[tracing::instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> ServiceResult<AuthSession> {
        let email = normalize_email(email);
        let Some(user) = self.users.find_by_email(&email).await? else {
            let hasher = self.hasher;
            let password = password.to_string();
            if let Err(error) =
                tokio::task::spawn_blocking(move || hasher.verify_dummy(&password)).await
            {
                tracing::warn!(%error, "Dummy password verification task failed");
            }
            metrics::record_login(false);
            return Err(AuthError::InvalidCredentials.into());
        };

        if !self
            .verify_password(password.to_string(), user.password_hash.clone())
            .await?
        {
            metrics::record_login(false);
            tracing::info!(user_id = %user.id, "Login rejected");
            return Err(AuthError::InvalidCredentials.into());
        }

        metrics::record_login(true);
        self.session_for(user)
    }

    /// Resolve a bearer token to the current account.
    ///
    /// The user is re-read on every call, so deleted accounts are rejected
    /// and role changes take effect immediately.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` / `AuthError::TokenExpired` for bad
    /// tokens or tokens of deleted users.
    pub async fn authenticate(&self, token: &str) -> ServiceResult<User> {
        let claims = self.tokens.verify(token, self.clock.now())?;
        match self.users.get(claims.user_id()).await {
            Ok(user) => Ok(user),
            Err(DomainError::NotFound { .. }) => {
                Err(AuthError::InvalidToken("user no longer exists".to_string()).into())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// The caller's own account.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` if the account was deleted.
    pub async fn me(&self, actor: &Actor) -> ServiceResult<User> {
        Ok(self.users.get(actor.user_id).await?)
    }

    /// An account visible to the caller (self or admin).
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Forbidden` for other users' accounts.
    pub async fn get(&self, actor: &Actor, id: UserId) -> ServiceResult<User> {
        if !actor.is_self_or_admin(id) {
            return Err(ServiceError::forbidden("You can only view your own account"));
        }
        Ok(self.users.get(id).await?)
    }

    /// All accounts (admins only).
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InsufficientRole` for non-admins.
    pub async fn list(&self, actor: &Actor, page: PageRequest) -> ServiceResult<Page<User>> {
        eventhub_auth::require_role(actor.role, Role::Admin)?;
        Ok(self.users.list(page).await?)
    }

    /// Update an account.
    ///
    /// Users may change their own name and password; only admins may
    /// change roles or edit other accounts.
    ///
    /// # Errors
    ///
    /// - `DomainError::Forbidden` when editing someone else or changing a role as non-admin
    /// - validation errors for the new values
    #[tracing::instrument(skip(self, actor, update), fields(actor = %actor.user_id))]
    pub async fn update(&self, actor: &Actor, id: UserId, update: UserUpdate) -> ServiceResult<User> {
        if !actor.is_self_or_admin(id) {
            return Err(ServiceError::forbidden("You can only edit your own account"));
        }
        if update.role.is_some() && !actor.is_admin() {
            return Err(ServiceError::forbidden("Only admins can change roles"));
        }

        let mut user = self.users.get(id).await?;

        if let Some(name) = update.name {
            let name = name.trim().to_string();
            validate_name(&name)?;
            user.name = name;
        }
        if let Some(password) = update.password {
            check_strength(&password)?;
            user.password_hash = self.hash_password(password).await?;
        }
        if let Some(role) = update.role {
            if role != user.role {
                tracing::info!(user_id = %user.id, from = %user.role, to = %role, "Role changed");
            }
            user.role = role;
        }

        user.updated_at = self.clock.now();
        Ok(self.users.update(&user).await?)
    }

    /// Delete an account (admins only). Its events and registrations go with it.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InsufficientRole` for non-admins.
    #[tracing::instrument(skip(self, actor), fields(actor = %actor.user_id))]
    pub async fn delete(&self, actor: &Actor, id: UserId) -> ServiceResult<()> {
        eventhub_auth::require_role(actor.role, Role::Admin)?;
        self.users.delete(id).await?;
        tracing::info!(user_id = %id, "User deleted");
        Ok(())
    }

    /// Storage liveness check.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Storage` when the database is unreachable.
    pub async fn ping(&self) -> ServiceResult<()> {
        Ok(self.users.ping().await?)
    }

    fn session_for(&self, user: User) -> ServiceResult<AuthSession> {
        let issued = self.tokens.issue(user.id, user.role, self.clock.now())?;
        Ok(AuthSession {
            token: issued.token,
            expires_at: issued.expires_at,
            user,
        })
    }

    async fn hash_password(&self, password: String) -> ServiceResult<String> {
        let hasher = self.hasher;
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AuthError::Hashing(format!("hashing task failed: {e}")))?
            .map_err(Into::into)
    }

    async fn verify_password(&self, password: String, stored: String) -> ServiceResult<bool> {
        let hasher = self.hasher;
        tokio::task::spawn_blocking(move || hasher.verify(&password, &stored))
            .await
            .map_err(|e| AuthError::Hashing(format!("verification task failed: {e}")))?
            .map_err(Into::into)
    }
}

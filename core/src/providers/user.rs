//! User repository trait.

use super::BoxFuture;
use crate::error::Result;
use crate::types::{Page, PageRequest, User, UserId};

/// User repository.
///
/// This trait abstracts over user storage (PostgreSQL, in-memory).
pub trait UserRepository: Send + Sync {
    /// Create user.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Storage fails → `DomainError::Storage`
    /// - Email already exists → `DomainError::EmailTaken`
    fn create(&self, user: &User) -> BoxFuture<'_, Result<User>>;

    /// Get user by ID.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Storage fails
    /// - User not found → `DomainError::NotFound`
    fn get(&self, id: UserId) -> BoxFuture<'_, Result<User>>;

    /// Find user by (lower-cased) email.
    ///
    /// # Errors
    ///
    /// Returns error if storage fails.
    fn find_by_email(&self, email: &str) -> BoxFuture<'_, Result<Option<User>>>;

    /// Replace a user's mutable fields.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Storage fails
    /// - User not found → `DomainError::NotFound`
    fn update(&self, user: &User) -> BoxFuture<'_, Result<User>>;

    /// Delete user.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Storage fails
    /// - User not found → `DomainError::NotFound`
    fn delete(&self, id: UserId) -> BoxFuture<'_, Result<()>>;

    /// List users ordered by creation time.
    ///
    /// # Errors
    ///
    /// Returns error if storage fails.
    fn list(&self, page: PageRequest) -> BoxFuture<'_, Result<Page<User>>>;

    /// Cheap connectivity check used by the readiness endpoint.
    ///
    /// # Errors
    ///
    /// Returns error if the backing store is unreachable.
    fn ping(&self) -> BoxFuture<'_, Result<()>>;
}

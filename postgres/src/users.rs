//! `PostgreSQL` user repository.

use crate::rows::{USER_COLUMNS, UserRow, convert_all};
use crate::{is_unique_violation, storage};
use eventhub_core::providers::{BoxFuture, UserRepository};
use eventhub_core::{DomainError, Page, PageRequest, Result, User, UserId};
use sqlx::PgPool;

/// User storage backed by the `users` table.
#[derive(Clone, Debug)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    /// Create a repository over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl UserRepository for PostgresUserRepository {
    fn create(&self, user: &User) -> BoxFuture<'_, Result<User>> {
        let user = user.clone();
        Box::pin(async move {
            let row: UserRow = sqlx::query_as(&format!(
                "INSERT INTO users (id, email, name, password_hash, role, created_at, updated_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {USER_COLUMNS}"
            ))
            .bind(user.id.as_uuid())
            .bind(&user.email)
            .bind(&user.name)
            .bind(&user.password_hash)
            .bind(user.role.as_str())
            .bind(user.created_at)
            .bind(user.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    DomainError::EmailTaken
                } else {
                    storage("create user")(e)
                }
            })?;
            row.try_into()
        })
    }

    fn get(&self, id: UserId) -> BoxFuture<'_, Result<User>> {
        Box::pin(async move {
            let row: Option<UserRow> =
                sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                    .bind(id.as_uuid())
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(storage("get user"))?;
            row.ok_or_else(|| DomainError::not_found("User", id))?
                .try_into()
        })
    }

    fn find_by_email(&self, email: &str) -> BoxFuture<'_, Result<Option<User>>> {
        let email = email.to_string();
        Box::pin(async move {
            let row: Option<UserRow> =
                sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
                    .bind(&email)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(storage("find user by email"))?;
            row.map(User::try_from).transpose()
        })
    }

    fn update(&self, user: &User) -> BoxFuture<'_, Result<User>> {
        let user = user.clone();
        Box::pin(async move {
            let row: Option<UserRow> = sqlx::query_as(&format!(
                "UPDATE users SET email = $2, name = $3, password_hash = $4, role = $5, \
                 updated_at = $6 WHERE id = $1 RETURNING {USER_COLUMNS}"
            ))
            .bind(user.id.as_uuid())
            .bind(&user.email)
            .bind(&user.name)
            .bind(&user.password_hash)
            .bind(user.role.as_str())
            .bind(user.updated_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    DomainError::EmailTaken
                } else {
                    storage("update user")(e)
                }
            })?;
            row.ok_or_else(|| DomainError::not_found("User", user.id))?
                .try_into()
        })
    }

    fn delete(&self, id: UserId) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM users WHERE id = $1")
                .bind(id.as_uuid())
                .execute(&self.pool)
                .await
                .map_err(storage("delete user"))?;
            if result.rows_affected() == 0 {
                return Err(DomainError::not_found("User", id));
            }
            Ok(())
        })
    }

    fn list(&self, page: PageRequest) -> BoxFuture<'_, Result<Page<User>>> {
        Box::pin(async move {
            let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
                .fetch_one(&self.pool)
                .await
                .map_err(storage("count users"))?;
            let rows: Vec<UserRow> = sqlx::query_as(&format!(
                "SELECT {USER_COLUMNS} FROM users ORDER BY created_at, id LIMIT $1 OFFSET $2"
            ))
            .bind(i64::try_from(page.limit()).unwrap_or(i64::MAX))
            .bind(i64::try_from(page.offset()).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await
            .map_err(storage("list users"))?;
            Ok(Page::new(
                convert_all(rows)?,
                u64::try_from(total).unwrap_or_default(),
                page,
            ))
        })
    }

    fn ping(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            sqlx::query("SELECT 1")
                .execute(&self.pool)
                .await
                .map_err(storage("ping"))?;
            Ok(())
        })
    }
}

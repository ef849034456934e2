//! `PostgreSQL` registration repository.
//!
//! Every write locks the parent event row first (`SELECT ... FOR UPDATE`),
//! so concurrent requests for the same event are serialized. The event's
//! status, deadline and capacity are re-read under that lock, which makes
//! the confirmed count exact and keeps registrations off events that were
//! cancelled in the meantime.

use crate::rows::{
    EVENT_COLUMNS, EventRow, REGISTRATION_COLUMNS, RegistrationRow, convert_all,
};
use crate::{is_unique_violation, storage};
use chrono::{DateTime, Utc};
use eventhub_core::providers::{BoxFuture, RegistrationRepository};
use eventhub_core::{
    DomainError, Event, EventId, Registration, RegistrationCounts, RegistrationId,
    RegistrationStatus, Result, UserId,
};
use sqlx::{PgConnection, PgPool};

/// Registration storage backed by the `registrations` table.
#[derive(Clone, Debug)]
pub struct PostgresRegistrationRepository {
    pool: PgPool,
}

impl PostgresRegistrationRepository {
    /// Create a repository over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Lock the event row and return it as of the lock.
async fn lock_event(conn: &mut PgConnection, event_id: EventId) -> Result<Event> {
    let row: Option<EventRow> = sqlx::query_as(&format!(
        "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1 FOR UPDATE"
    ))
    .bind(event_id.as_uuid())
    .fetch_optional(conn)
    .await
    .map_err(storage("lock event"))?;
    row.ok_or_else(|| DomainError::not_found("Event", event_id))?
        .try_into()
}

async fn ensure_capacity(conn: &mut PgConnection, event: &Event) -> Result<()> {
    let Some(max) = event.max_attendees else {
        return Ok(());
    };
    let (confirmed,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM registrations WHERE event_id = $1 AND status = $2",
    )
    .bind(event.id.as_uuid())
    .bind(RegistrationStatus::Confirmed.as_str())
    .fetch_one(conn)
    .await
    .map_err(storage("count confirmed"))?;

    if confirmed >= i64::from(max) {
        tracing::debug!(event_id = %event.id, confirmed, max, "capacity reached");
        metrics::counter!("eventhub_capacity_rejections_total").increment(1);
        return Err(DomainError::EventFull);
    }
    Ok(())
}

/// Lock the registration's event, then the registration itself, and check
/// that its status is still `expected`.
async fn lock_for_change(
    conn: &mut PgConnection,
    id: RegistrationId,
    expected: RegistrationStatus,
) -> Result<Event> {
    let event: Option<(uuid::Uuid,)> =
        sqlx::query_as("SELECT event_id FROM registrations WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&mut *conn)
            .await
            .map_err(storage("find registration"))?;
    let event_id = EventId::from_uuid(
        event
            .ok_or_else(|| DomainError::not_found("Registration", id))?
            .0,
    );
    let event = lock_event(&mut *conn, event_id).await?;

    let current: Option<(String,)> =
        sqlx::query_as("SELECT status FROM registrations WHERE id = $1 FOR UPDATE")
            .bind(id.as_uuid())
            .fetch_optional(&mut *conn)
            .await
            .map_err(storage("lock registration"))?;
    let current: RegistrationStatus = current
        .ok_or_else(|| DomainError::not_found("Registration", id))?
        .0
        .parse()
        .map_err(|e| DomainError::Storage(format!("corrupt row: {e}")))?;
    if current != expected {
        return Err(DomainError::StaleState);
    }
    Ok(event)
}

impl RegistrationRepository for PostgresRegistrationRepository {
    fn insert_within_capacity(
        &self,
        registration: &Registration,
    ) -> BoxFuture<'_, Result<Registration>> {
        let registration = registration.clone();
        Box::pin(async move {
            let mut tx = self.pool.begin().await.map_err(storage("begin"))?;
            let event = lock_event(&mut tx, registration.event_id).await?;
            event.ensure_open_for_registration(registration.created_at)?;

            let existing: Option<(uuid::Uuid,)> = sqlx::query_as(
                "SELECT id FROM registrations WHERE event_id = $1 AND user_id = $2",
            )
            .bind(registration.event_id.as_uuid())
            .bind(registration.user_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(storage("find registration"))?;
            if existing.is_some() {
                return Err(DomainError::AlreadyRegistered);
            }

            if registration.status.counts_toward_capacity() {
                ensure_capacity(&mut tx, &event).await?;
            }

            let row: RegistrationRow = sqlx::query_as(&format!(
                "INSERT INTO registrations (id, event_id, user_id, status, notes, created_at, \
                 updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {REGISTRATION_COLUMNS}"
            ))
            .bind(registration.id.as_uuid())
            .bind(registration.event_id.as_uuid())
            .bind(registration.user_id.as_uuid())
            .bind(registration.status.as_str())
            .bind(registration.notes.as_deref())
            .bind(registration.created_at)
            .bind(registration.updated_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    DomainError::AlreadyRegistered
                } else {
                    storage("insert registration")(e)
                }
            })?;

            tx.commit().await.map_err(storage("commit"))?;
            row.try_into()
        })
    }

    fn transition(
        &self,
        id: RegistrationId,
        expected: RegistrationStatus,
        next: RegistrationStatus,
        now: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<Registration>> {
        Box::pin(async move {
            let mut tx = self.pool.begin().await.map_err(storage("begin"))?;
            let event = lock_for_change(&mut tx, id, expected).await?;

            if next.is_active() && !event.status.accepts_registrations() {
                return Err(DomainError::EventNotOpen {
                    status: event.status.to_string(),
                });
            }
            if next.counts_toward_capacity() && !expected.counts_toward_capacity() {
                ensure_capacity(&mut tx, &event).await?;
            }

            let row: RegistrationRow = sqlx::query_as(&format!(
                "UPDATE registrations SET status = $2, updated_at = $3 WHERE id = $1 \
                 RETURNING {REGISTRATION_COLUMNS}"
            ))
            .bind(id.as_uuid())
            .bind(next.as_str())
            .bind(now)
            .fetch_one(&mut *tx)
            .await
            .map_err(storage("update registration"))?;

            tx.commit().await.map_err(storage("commit"))?;
            row.try_into()
        })
    }

    fn reactivate(
        &self,
        id: RegistrationId,
        status: RegistrationStatus,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<Registration>> {
        Box::pin(async move {
            let mut tx = self.pool.begin().await.map_err(storage("begin"))?;
            let event = lock_for_change(&mut tx, id, RegistrationStatus::Cancelled).await?;
            event.ensure_open_for_registration(now)?;
            if status.counts_toward_capacity() {
                ensure_capacity(&mut tx, &event).await?;
            }

            let row: RegistrationRow = sqlx::query_as(&format!(
                "UPDATE registrations SET status = $2, notes = $3, updated_at = $4 \
                 WHERE id = $1 RETURNING {REGISTRATION_COLUMNS}"
            ))
            .bind(id.as_uuid())
            .bind(status.as_str())
            .bind(notes.as_deref())
            .bind(now)
            .fetch_one(&mut *tx)
            .await
            .map_err(storage("reactivate registration"))?;

            tx.commit().await.map_err(storage("commit"))?;
            row.try_into()
        })
    }

    fn get(&self, id: RegistrationId) -> BoxFuture<'_, Result<Registration>> {
        Box::pin(async move {
            let row: Option<RegistrationRow> = sqlx::query_as(&format!(
                "SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE id = $1"
            ))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(storage("get registration"))?;
            row.ok_or_else(|| DomainError::not_found("Registration", id))?
                .try_into()
        })
    }

    fn find_for_user(
        &self,
        event_id: EventId,
        user_id: UserId,
    ) -> BoxFuture<'_, Result<Option<Registration>>> {
        Box::pin(async move {
            let row: Option<RegistrationRow> = sqlx::query_as(&format!(
                "SELECT {REGISTRATION_COLUMNS} FROM registrations \
                 WHERE event_id = $1 AND user_id = $2"
            ))
            .bind(event_id.as_uuid())
            .bind(user_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(storage("find registration"))?;
            row.map(Registration::try_from).transpose()
        })
    }

    fn list_for_event(
        &self,
        event_id: EventId,
        status: Option<RegistrationStatus>,
    ) -> BoxFuture<'_, Result<Vec<Registration>>> {
        Box::pin(async move {
            let rows: Vec<RegistrationRow> = sqlx::query_as(&format!(
                "SELECT {REGISTRATION_COLUMNS} FROM registrations \
                 WHERE event_id = $1 AND ($2::text IS NULL OR status = $2) \
                 ORDER BY created_at, id"
            ))
            .bind(event_id.as_uuid())
            .bind(status.map(RegistrationStatus::as_str))
            .fetch_all(&self.pool)
            .await
            .map_err(storage("list event registrations"))?;
            convert_all(rows)
        })
    }

    fn list_for_user(&self, user_id: UserId) -> BoxFuture<'_, Result<Vec<Registration>>> {
        Box::pin(async move {
            let rows: Vec<RegistrationRow> = sqlx::query_as(&format!(
                "SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE user_id = $1 \
                 ORDER BY created_at DESC, id"
            ))
            .bind(user_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(storage("list user registrations"))?;
            convert_all(rows)
        })
    }

    fn count_by_status(&self, event_id: EventId) -> BoxFuture<'_, Result<RegistrationCounts>> {
        Box::pin(async move {
            let rows: Vec<(String, i64)> = sqlx::query_as(
                "SELECT status, COUNT(*) FROM registrations WHERE event_id = $1 GROUP BY status",
            )
            .bind(event_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(storage("count registrations"))?;

            let mut counts = RegistrationCounts::default();
            for (status, n) in rows {
                let status: RegistrationStatus = status
                    .parse()
                    .map_err(|e| DomainError::Storage(format!("corrupt row: {e}")))?;
                counts.add(status, u64::try_from(n).unwrap_or_default());
            }
            Ok(counts)
        })
    }

    fn cancel_active_for_event(
        &self,
        event_id: EventId,
        now: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<Vec<Registration>>> {
        Box::pin(async move {
            let mut tx = self.pool.begin().await.map_err(storage("begin"))?;
            lock_event(&mut tx, event_id).await?;

            let rows: Vec<RegistrationRow> = sqlx::query_as(&format!(
                "UPDATE registrations SET status = $2, updated_at = $3 \
                 WHERE event_id = $1 AND status IN ($4, $5) RETURNING {REGISTRATION_COLUMNS}"
            ))
            .bind(event_id.as_uuid())
            .bind(RegistrationStatus::Cancelled.as_str())
            .bind(now)
            .bind(RegistrationStatus::Pending.as_str())
            .bind(RegistrationStatus::Confirmed.as_str())
            .fetch_all(&mut *tx)
            .await
            .map_err(storage("cancel registrations"))?;

            tx.commit().await.map_err(storage("commit"))?;
            convert_all(rows)
        })
    }

    fn delete_for_event(&self, event_id: EventId) -> BoxFuture<'_, Result<u64>> {
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM registrations WHERE event_id = $1")
                .bind(event_id.as_uuid())
                .execute(&self.pool)
                .await
                .map_err(storage("delete registrations"))?;
            Ok(result.rows_affected())
        })
    }
}

//! `PostgreSQL` event repository.

use crate::rows::{EVENT_COLUMNS, EventRow, capacity_to_db, convert_all};
use crate::{is_unique_violation, storage};
use eventhub_core::providers::{BoxFuture, EventFilter, EventRepository};
use eventhub_core::{DomainError, Event, EventId, EventStatus, Page, PageRequest, Result};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

/// Event storage backed by the `events` table.
#[derive(Clone, Debug)]
pub struct PostgresEventRepository {
    pool: PgPool,
}

impl PostgresEventRepository {
    /// Create a repository over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Why a status-guarded `UPDATE` matched no row.
    async fn miss(&self, id: EventId) -> DomainError {
        let exists: std::result::Result<(bool,), _> =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM events WHERE id = $1)")
                .bind(id.as_uuid())
                .fetch_one(&self.pool)
                .await;
        match exists {
            Ok((true,)) => DomainError::StaleState,
            Ok((false,)) => DomainError::not_found("Event", id),
            Err(e) => storage("check event")(e),
        }
    }
}

/// Escape `LIKE` metacharacters so user input matches literally.
fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Append the `WHERE` conditions for `filter`. The builder must already end
/// in a `WHERE TRUE`.
fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &EventFilter) {
    if !filter.include_all_drafts {
        qb.push(" AND (status <> ")
            .push_bind(EventStatus::Draft.as_str());
        if let Some(viewer) = filter.include_drafts_of {
            qb.push(" OR organizer_id = ").push_bind(*viewer.as_uuid());
        }
        qb.push(")");
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(organizer) = filter.organizer_id {
        qb.push(" AND organizer_id = ").push_bind(*organizer.as_uuid());
    }
    if let Some(after) = filter.upcoming_after {
        qb.push(" AND starts_at > ").push_bind(after);
    }
    if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
        let pattern = like_pattern(search);
        qb.push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

fn map_write_error(slug: String, context: &'static str) -> impl FnOnce(sqlx::Error) -> DomainError {
    move |e| {
        if is_unique_violation(&e) {
            DomainError::SlugTaken(slug)
        } else {
            storage(context)(e)
        }
    }
}

impl EventRepository for PostgresEventRepository {
    fn create(&self, event: &Event) -> BoxFuture<'_, Result<Event>> {
        let event = event.clone();
        Box::pin(async move {
            let row: EventRow = sqlx::query_as(&format!(
                "INSERT INTO events (id, organizer_id, title, slug, description, location, \
                 starts_at, ends_at, registration_deadline, max_attendees, requires_approval, \
                 status, created_at, updated_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
                 RETURNING {EVENT_COLUMNS}"
            ))
            .bind(event.id.as_uuid())
            .bind(event.organizer_id.as_uuid())
            .bind(&event.title)
            .bind(&event.slug)
            .bind(&event.description)
            .bind(&event.location)
            .bind(event.starts_at)
            .bind(event.ends_at)
            .bind(event.registration_deadline)
            .bind(capacity_to_db(event.max_attendees))
            .bind(event.requires_approval)
            .bind(event.status.as_str())
            .bind(event.created_at)
            .bind(event.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error(event.slug.clone(), "create event"))?;
            row.try_into()
        })
    }

    fn get(&self, id: EventId) -> BoxFuture<'_, Result<Event>> {
        Box::pin(async move {
            let row: Option<EventRow> =
                sqlx::query_as(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"))
                    .bind(id.as_uuid())
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(storage("get event"))?;
            row.ok_or_else(|| DomainError::not_found("Event", id))?
                .try_into()
        })
    }

    fn get_by_slug(&self, slug: &str) -> BoxFuture<'_, Result<Event>> {
        let slug = slug.to_string();
        Box::pin(async move {
            let row: Option<EventRow> =
                sqlx::query_as(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE slug = $1"))
                    .bind(&slug)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(storage("get event by slug"))?;
            row.ok_or_else(|| DomainError::not_found("Event", &slug))?
                .try_into()
        })
    }

    fn slug_exists(&self, slug: &str, exclude: Option<EventId>) -> BoxFuture<'_, Result<bool>> {
        let slug = slug.to_string();
        Box::pin(async move {
            let (exists,): (bool,) = sqlx::query_as(
                "SELECT EXISTS(SELECT 1 FROM events WHERE slug = $1 \
                 AND ($2::uuid IS NULL OR id <> $2))",
            )
            .bind(&slug)
            .bind(exclude.map(|id| *id.as_uuid()))
            .fetch_one(&self.pool)
            .await
            .map_err(storage("check slug"))?;
            Ok(exists)
        })
    }

    fn update(&self, event: &Event) -> BoxFuture<'_, Result<Event>> {
        let event = event.clone();
        Box::pin(async move {
            let row: Option<EventRow> = sqlx::query_as(&format!(
                "UPDATE events SET title = $2, slug = $3, description = $4, location = $5, \
                 starts_at = $6, ends_at = $7, registration_deadline = $8, max_attendees = $9, \
                 requires_approval = $10, updated_at = $12 \
                 WHERE id = $1 AND status = $11 RETURNING {EVENT_COLUMNS}"
            ))
            .bind(event.id.as_uuid())
            .bind(&event.title)
            .bind(&event.slug)
            .bind(&event.description)
            .bind(&event.location)
            .bind(event.starts_at)
            .bind(event.ends_at)
            .bind(event.registration_deadline)
            .bind(capacity_to_db(event.max_attendees))
            .bind(event.requires_approval)
            .bind(event.status.as_str())
            .bind(event.updated_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error(event.slug.clone(), "update event"))?;
            match row {
                Some(row) => row.try_into(),
                None => Err(self.miss(event.id).await),
            }
        })
    }

    fn transition(
        &self,
        id: EventId,
        expected: EventStatus,
        next: EventStatus,
        now: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<Event>> {
        Box::pin(async move {
            let row: Option<EventRow> = sqlx::query_as(&format!(
                "UPDATE events SET status = $3, updated_at = $4 \
                 WHERE id = $1 AND status = $2 RETURNING {EVENT_COLUMNS}"
            ))
            .bind(id.as_uuid())
            .bind(expected.as_str())
            .bind(next.as_str())
            .bind(now)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage("transition event"))?;
            match row {
                Some(row) => row.try_into(),
                None => Err(self.miss(id).await),
            }
        })
    }

    fn delete(&self, id: EventId) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM events WHERE id = $1")
                .bind(id.as_uuid())
                .execute(&self.pool)
                .await
                .map_err(storage("delete event"))?;
            if result.rows_affected() == 0 {
                return Err(DomainError::not_found("Event", id));
            }
            Ok(())
        })
    }

    fn list(&self, filter: &EventFilter, page: PageRequest) -> BoxFuture<'_, Result<Page<Event>>> {
        let filter = filter.clone();
        Box::pin(async move {
            let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM events WHERE TRUE");
            push_filter(&mut count, &filter);
            let (total,): (i64,) = count
                .build_query_as()
                .fetch_one(&self.pool)
                .await
                .map_err(storage("count events"))?;

            let mut select = QueryBuilder::<Postgres>::new(format!(
                "SELECT {EVENT_COLUMNS} FROM events WHERE TRUE"
            ));
            push_filter(&mut select, &filter);
            select
                .push(" ORDER BY starts_at, id LIMIT ")
                .push_bind(i64::try_from(page.limit()).unwrap_or(i64::MAX))
                .push(" OFFSET ")
                .push_bind(i64::try_from(page.offset()).unwrap_or(i64::MAX));
            let rows: Vec<EventRow> = select
                .build_query_as()
                .fetch_all(&self.pool)
                .await
                .map_err(storage("list events"))?;

            Ok(Page::new(
                convert_all(rows)?,
                u64::try_from(total).unwrap_or_default(),
                page,
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("rust"), "%rust%");
        assert_eq!(like_pattern("100%_off"), "%100\\%\\_off%");
    }

    #[test]
    fn test_default_filter_hides_drafts() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 FROM events WHERE TRUE");
        push_filter(&mut qb, &EventFilter::default());
        assert_eq!(
            qb.sql(),
            "SELECT 1 FROM events WHERE TRUE AND (status <> $1)"
        );
    }

    #[test]
    fn test_owner_sees_own_drafts() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 FROM events WHERE TRUE");
        let filter = EventFilter {
            include_drafts_of: Some(eventhub_core::UserId::new()),
            search: Some("meetup".to_string()),
            ..EventFilter::default()
        };
        push_filter(&mut qb, &filter);
        assert_eq!(
            qb.sql(),
            "SELECT 1 FROM events WHERE TRUE AND (status <> $1 OR organizer_id = $2) \
             AND (title ILIKE $3 OR description ILIKE $4)"
        );
    }
}

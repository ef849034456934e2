//! Row types and their conversion into domain types.

use chrono::{DateTime, Utc};
use eventhub_core::{
    DomainError, Event, EventId, Registration, RegistrationId, User, UserId,
};
use sqlx::FromRow;
use uuid::Uuid;

pub(crate) const USER_COLUMNS: &str =
    "id, email, name, password_hash, role, created_at, updated_at";

pub(crate) const EVENT_COLUMNS: &str = "id, organizer_id, title, slug, description, location, \
     starts_at, ends_at, registration_deadline, max_attendees, requires_approval, status, \
     created_at, updated_at";

pub(crate) const REGISTRATION_COLUMNS: &str =
    "id, event_id, user_id, status, notes, created_at, updated_at";

#[derive(Debug, FromRow)]
pub(crate) struct UserRow {
    id: Uuid,
    email: String,
    name: String,
    password_hash: String,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = DomainError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: UserId::from_uuid(row.id),
            email: row.email,
            name: row.name,
            password_hash: row.password_hash,
            role: row.role.parse().map_err(corrupt)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct EventRow {
    id: Uuid,
    organizer_id: Uuid,
    title: String,
    slug: String,
    description: String,
    location: String,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    registration_deadline: Option<DateTime<Utc>>,
    max_attendees: Option<i32>,
    requires_approval: bool,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<EventRow> for Event {
    type Error = DomainError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let max_attendees = row
            .max_attendees
            .map(u32::try_from)
            .transpose()
            .map_err(|e| DomainError::Storage(format!("corrupt max_attendees: {e}")))?;
        Ok(Self {
            id: EventId::from_uuid(row.id),
            organizer_id: UserId::from_uuid(row.organizer_id),
            title: row.title,
            slug: row.slug,
            description: row.description,
            location: row.location,
            starts_at: row.starts_at,
            ends_at: row.ends_at,
            registration_deadline: row.registration_deadline,
            max_attendees,
            requires_approval: row.requires_approval,
            status: row.status.parse().map_err(corrupt)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct RegistrationRow {
    id: Uuid,
    event_id: Uuid,
    user_id: Uuid,
    status: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RegistrationRow> for Registration {
    type Error = DomainError;

    fn try_from(row: RegistrationRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: RegistrationId::from_uuid(row.id),
            event_id: EventId::from_uuid(row.event_id),
            user_id: UserId::from_uuid(row.user_id),
            status: row.status.parse().map_err(corrupt)?,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Capacity as stored (INTEGER). Values above `i32::MAX` are clamped.
pub(crate) fn capacity_to_db(max_attendees: Option<u32>) -> Option<i32> {
    max_attendees.map(|m| i32::try_from(m).unwrap_or(i32::MAX))
}

/// Convert a batch of rows, failing on the first corrupt one.
pub(crate) fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>, DomainError>
where
    T: TryFrom<R, Error = DomainError>,
{
    rows.into_iter().map(T::try_from).collect()
}

fn corrupt(e: DomainError) -> DomainError {
    DomainError::Storage(format!("corrupt row: {e}"))
}

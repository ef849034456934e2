//! Domain types for EventHub.
//!
//! Identifiers, the three persisted entities (`User`, `Event`, `Registration`),
//! their status enums with transition tables, and pagination helpers.

use crate::error::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for a user
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Creates a new random `UserId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `UserId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an event
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Uuid);

impl EventId {
    /// Creates a new random `EventId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an `EventId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a registration
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistrationId(Uuid);

impl RegistrationId {
    /// Creates a new random `RegistrationId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `RegistrationId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RegistrationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Users
// ============================================================================

/// Role of a user account.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full access to every resource
    Admin,
    /// May create and manage their own events
    Organizer,
    /// May register for events
    Attendee,
}

impl Role {
    /// Storage/wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Organizer => "organizer",
            Self::Attendee => "attendee",
        }
    }

    /// Whether this role may create events.
    #[must_use]
    pub const fn can_organize(self) -> bool {
        matches!(self, Self::Admin | Self::Organizer)
    }

    /// Whether this role bypasses ownership checks.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "organizer" => Ok(Self::Organizer),
            "attendee" => Ok(Self::Attendee),
            other => Err(DomainError::Validation(format!("Unknown role: {other}"))),
        }
    }
}

/// A user account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User ID
    pub id: UserId,
    /// Email address (stored lower-cased)
    pub email: String,
    /// Display name
    pub name: String,
    /// Argon2 PHC string. Never leaves the server.
    #[serde(skip)]
    pub password_hash: String,
    /// Account role
    pub role: Role,
    /// Account creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// Events
// ============================================================================

/// Lifecycle status of an event.
///
/// ```text
/// Draft ──► Published ──► Completed
///   │           │
///   └──► Cancelled ◄──┘
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    /// Being prepared, only visible to its organizer
    Draft,
    /// Public and open for registration until the deadline
    Published,
    /// Called off
    Cancelled,
    /// Took place
    Completed,
}

impl EventStatus {
    /// Statuses reachable from this one.
    #[must_use]
    pub const fn allowed_transitions(self) -> &'static [Self] {
        match self {
            Self::Draft => &[Self::Published, Self::Cancelled],
            Self::Published => &[Self::Cancelled, Self::Completed],
            Self::Cancelled | Self::Completed => &[],
        }
    }

    /// Whether `next` is a legal successor of this status.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_transitions().contains(&next)
    }

    /// No further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        self.allowed_transitions().is_empty()
    }

    /// Only published events take new registrations.
    #[must_use]
    pub const fn accepts_registrations(self) -> bool {
        matches!(self, Self::Published)
    }

    /// Details may still be edited.
    #[must_use]
    pub const fn is_editable(self) -> bool {
        matches!(self, Self::Draft | Self::Published)
    }

    /// Storage/wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }

    /// Validate a transition, returning the error the API reports.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidTransition`] when `next` is not reachable.
    pub fn ensure_transition(self, next: Self) -> Result<(), DomainError> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(DomainError::InvalidTransition {
                from: self.as_str().to_string(),
                to: next.as_str().to_string(),
            })
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            "cancelled" => Ok(Self::Cancelled),
            "completed" => Ok(Self::Completed),
            other => Err(DomainError::Validation(format!("Unknown event status: {other}"))),
        }
    }
}

/// An event attendees can register for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Event ID
    pub id: EventId,
    /// User who owns the event
    pub organizer_id: UserId,
    /// Title
    pub title: String,
    /// Unique URL slug derived from the title
    pub slug: String,
    /// Free-form description
    pub description: String,
    /// Venue or URL
    pub location: String,
    /// Start time
    pub starts_at: DateTime<Utc>,
    /// End time
    pub ends_at: DateTime<Utc>,
    /// Last moment registrations are accepted (defaults to `starts_at`)
    pub registration_deadline: Option<DateTime<Utc>>,
    /// Capacity in confirmed registrations; `None` is unlimited
    pub max_attendees: Option<u32>,
    /// New registrations start as pending until the organizer confirms them
    pub requires_approval: bool,
    /// Lifecycle status
    pub status: EventStatus,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Deadline actually enforced for registrations.
    #[must_use]
    pub fn effective_deadline(&self) -> DateTime<Utc> {
        self.registration_deadline.unwrap_or(self.starts_at)
    }

    /// Whether a registration submitted at `now` is accepted.
    #[must_use]
    pub fn is_registration_open(&self, now: DateTime<Utc>) -> bool {
        self.status.accepts_registrations() && now <= self.effective_deadline()
    }

    /// Fail unless a registration submitted at `now` is accepted.
    ///
    /// # Errors
    ///
    /// - `DomainError::EventNotOpen` unless the event is published
    /// - `DomainError::RegistrationClosed` after the effective deadline
    pub fn ensure_open_for_registration(&self, now: DateTime<Utc>) -> Result<(), DomainError> {
        if !self.status.accepts_registrations() {
            return Err(DomainError::EventNotOpen {
                status: self.status.to_string(),
            });
        }
        if now > self.effective_deadline() {
            return Err(DomainError::RegistrationClosed);
        }
        Ok(())
    }

    /// Spots left given the current confirmed count; `None` when unlimited.
    #[must_use]
    pub fn spots_remaining(&self, confirmed: u64) -> Option<u64> {
        self.max_attendees
            .map(|max| u64::from(max).saturating_sub(confirmed))
    }

    /// Whether `user_id` may see and manage this event without admin rights.
    #[must_use]
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.organizer_id == user_id
    }
}

// ============================================================================
// Registrations
// ============================================================================

/// Status of a registration.
///
/// ```text
/// Pending ──► Confirmed ──► Attended
///    │            │   └───► NoShow
///    └──► Cancelled ◄┘
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    /// Awaiting organizer approval
    Pending,
    /// Holds a spot
    Confirmed,
    /// Withdrawn by the attendee or the organizer
    Cancelled,
    /// Checked in at the event
    Attended,
    /// Confirmed but did not show up
    NoShow,
}

impl RegistrationStatus {
    /// Status of a brand-new registration.
    #[must_use]
    pub const fn initial(requires_approval: bool) -> Self {
        if requires_approval {
            Self::Pending
        } else {
            Self::Confirmed
        }
    }

    /// Statuses reachable from this one.
    #[must_use]
    pub const fn allowed_transitions(self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::Confirmed, Self::Cancelled],
            Self::Confirmed => &[Self::Cancelled, Self::Attended, Self::NoShow],
            Self::Cancelled | Self::Attended | Self::NoShow => &[],
        }
    }

    /// Whether `next` is a legal successor of this status.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_transitions().contains(&next)
    }

    /// No further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        self.allowed_transitions().is_empty()
    }

    /// Pending or confirmed.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }

    /// Only confirmed registrations occupy capacity.
    #[must_use]
    pub const fn counts_toward_capacity(self) -> bool {
        matches!(self, Self::Confirmed)
    }

    /// Storage/wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
            Self::Attended => "attended",
            Self::NoShow => "no_show",
        }
    }

    /// All statuses, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Confirmed,
        Self::Cancelled,
        Self::Attended,
        Self::NoShow,
    ];

    /// Validate a transition, returning the error the API reports.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidTransition`] when `next` is not reachable.
    pub fn ensure_transition(self, next: Self) -> Result<(), DomainError> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(DomainError::InvalidTransition {
                from: self.as_str().to_string(),
                to: next.as_str().to_string(),
            })
        }
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegistrationStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "cancelled" => Ok(Self::Cancelled),
            "attended" => Ok(Self::Attended),
            "no_show" => Ok(Self::NoShow),
            other => Err(DomainError::Validation(format!(
                "Unknown registration status: {other}"
            ))),
        }
    }
}

/// A user's registration for an event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    /// Registration ID
    pub id: RegistrationId,
    /// Event registered for
    pub event_id: EventId,
    /// Registered user
    pub user_id: UserId,
    /// Current status
    pub status: RegistrationStatus,
    /// Optional note from the attendee
    pub notes: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

/// Number of registrations per status for one event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationCounts {
    /// Pending registrations
    pub pending: u64,
    /// Confirmed registrations
    pub confirmed: u64,
    /// Cancelled registrations
    pub cancelled: u64,
    /// Attended registrations
    pub attended: u64,
    /// No-show registrations
    pub no_show: u64,
}

impl RegistrationCounts {
    /// Add `n` registrations of `status`.
    pub const fn add(&mut self, status: RegistrationStatus, n: u64) {
        match status {
            RegistrationStatus::Pending => self.pending += n,
            RegistrationStatus::Confirmed => self.confirmed += n,
            RegistrationStatus::Cancelled => self.cancelled += n,
            RegistrationStatus::Attended => self.attended += n,
            RegistrationStatus::NoShow => self.no_show += n,
        }
    }

    /// Registrations that are not cancelled.
    #[must_use]
    pub const fn total_active(&self) -> u64 {
        self.pending + self.confirmed + self.attended + self.no_show
    }
}

// ============================================================================
// Pagination
// ============================================================================

/// Default page size for list endpoints.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Upper bound for page size.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Zero-based page request with a bounded page size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    /// Page number (0-indexed)
    pub page: u32,
    /// Page size (1..=100)
    pub page_size: u32,
}

impl PageRequest {
    /// Build a request, clamping `page_size` into `1..=MAX_PAGE_SIZE`.
    #[must_use]
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page,
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Rows to skip.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.page as u64 * self.page_size as u64
    }

    /// Rows to return.
    #[must_use]
    pub const fn limit(&self) -> u64 {
        self.page_size as u64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(0, DEFAULT_PAGE_SIZE)
    }
}

/// One page of results.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items on this page
    pub items: Vec<T>,
    /// Total number of matching items
    pub total: u64,
    /// Current page
    pub page: u32,
    /// Page size
    pub page_size: u32,
}

impl<T> Page<T> {
    /// Assemble a page from a request.
    #[must_use]
    pub const fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            page: request.page,
            page_size: request.page_size,
        }
    }

    /// Slice an already-filtered collection into the requested page.
    #[must_use]
    pub fn from_vec(all: Vec<T>, request: PageRequest) -> Self {
        let total = all.len() as u64;
        let items = all
            .into_iter()
            .skip(usize::try_from(request.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(request.limit()).unwrap_or(usize::MAX))
            .collect();
        Self::new(items, total, request)
    }

    /// Transform the items, keeping the paging metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_event(status: EventStatus) -> Event {
        let starts_at = DateTime::parse_from_rfc3339("2025-06-01T09:00:00Z")
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_default();
        Event {
            id: EventId::new(),
            organizer_id: UserId::new(),
            title: "Rust Meetup".to_string(),
            slug: "rust-meetup".to_string(),
            description: String::new(),
            location: "Berlin".to_string(),
            starts_at,
            ends_at: starts_at + Duration::hours(2),
            registration_deadline: None,
            max_attendees: Some(10),
            requires_approval: false,
            status,
            created_at: starts_at - Duration::days(30),
            updated_at: starts_at - Duration::days(30),
        }
    }

    #[test]
    fn test_event_transitions() {
        assert!(EventStatus::Draft.can_transition_to(EventStatus::Published));
        assert!(EventStatus::Draft.can_transition_to(EventStatus::Cancelled));
        assert!(!EventStatus::Draft.can_transition_to(EventStatus::Completed));
        assert!(EventStatus::Published.can_transition_to(EventStatus::Completed));
        assert!(!EventStatus::Published.can_transition_to(EventStatus::Draft));
        assert!(EventStatus::Cancelled.is_terminal());
        assert!(EventStatus::Completed.is_terminal());
    }

    #[test]
    fn test_registration_transitions() {
        use RegistrationStatus::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(!Pending.can_transition_to(Attended));
        assert!(Confirmed.can_transition_to(NoShow));
        assert!(!Cancelled.can_transition_to(Confirmed));
        assert!(!Attended.can_transition_to(NoShow));
        for status in RegistrationStatus::ALL {
            assert!(!status.can_transition_to(status), "{status} must not loop");
        }
    }

    #[test]
    fn test_ensure_transition_reports_both_ends() {
        let err = EventStatus::Completed
            .ensure_transition(EventStatus::Published)
            .unwrap_err();
        assert_eq!(
            err,
            DomainError::InvalidTransition {
                from: "completed".to_string(),
                to: "published".to_string(),
            }
        );
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for status in RegistrationStatus::ALL {
            assert_eq!(status.as_str().parse::<RegistrationStatus>().ok(), Some(status));
        }
        assert!("archived".parse::<EventStatus>().is_err());
        assert_eq!(
            serde_json::to_string(&RegistrationStatus::NoShow).unwrap(),
            "\"no_show\""
        );
    }

    #[test]
    fn test_registration_window() {
        let mut event = sample_event(EventStatus::Published);
        let before = event.starts_at - Duration::hours(1);
        let after = event.starts_at + Duration::minutes(1);
        assert!(event.is_registration_open(before));
        assert!(event.is_registration_open(event.starts_at));
        assert!(!event.is_registration_open(after));

        event.registration_deadline = Some(event.starts_at - Duration::days(1));
        assert!(!event.is_registration_open(before));

        let draft = sample_event(EventStatus::Draft);
        assert!(!draft.is_registration_open(before));
    }

    #[test]
    fn test_open_for_registration_names_the_reason() {
        let event = sample_event(EventStatus::Published);
        assert_eq!(event.ensure_open_for_registration(event.starts_at), Ok(()));
        assert_eq!(
            event.ensure_open_for_registration(event.starts_at + Duration::seconds(1)),
            Err(DomainError::RegistrationClosed)
        );
        assert_eq!(
            sample_event(EventStatus::Cancelled).ensure_open_for_registration(event.starts_at),
            Err(DomainError::EventNotOpen {
                status: "cancelled".to_string()
            })
        );
    }

    #[test]
    fn test_spots_remaining() {
        let mut event = sample_event(EventStatus::Published);
        assert_eq!(event.spots_remaining(3), Some(7));
        assert_eq!(event.spots_remaining(12), Some(0));
        event.max_attendees = None;
        assert_eq!(event.spots_remaining(1_000), None);
    }

    #[test]
    fn test_page_request_clamps() {
        assert_eq!(PageRequest::new(0, 0).page_size, 1);
        assert_eq!(PageRequest::new(0, 500).page_size, MAX_PAGE_SIZE);
        assert_eq!(PageRequest::new(3, 20).offset(), 60);
    }

    #[test]
    fn test_page_from_vec() {
        let page = Page::from_vec((0..45).collect::<Vec<_>>(), PageRequest::new(2, 20));
        assert_eq!(page.total, 45);
        assert_eq!(page.items, (40..45).collect::<Vec<_>>());
    }

    #[test]
    fn test_counts() {
        let mut counts = RegistrationCounts::default();
        counts.add(RegistrationStatus::Confirmed, 3);
        counts.add(RegistrationStatus::Cancelled, 2);
        counts.add(RegistrationStatus::Pending, 1);
        assert_eq!(counts.total_active(), 4);
    }

    #[test]
    fn test_password_hash_is_never_serialized() {
        let user = User {
            id: UserId::new(),
            email: "a@example.com".to_string(),
            name: "A".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            role: Role::Attendee,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2"));
        assert!(json.contains("\"role\":\"attendee\""));
    }
}

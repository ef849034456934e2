//! Input validation for users and events.
//!
//! Each function returns `Ok(())` or a [`DomainError::Validation`] naming the
//! offending field.

use crate::error::{DomainError, Result};
use chrono::{DateTime, Utc};

/// Maximum event title length in characters.
pub const MAX_TITLE_LEN: usize = 200;
/// Maximum event description length in characters.
pub const MAX_DESCRIPTION_LEN: usize = 10_000;
/// Maximum event location length in characters.
pub const MAX_LOCATION_LEN: usize = 500;
/// Maximum registration note length in characters.
pub const MAX_NOTES_LEN: usize = 1_000;
/// Maximum display-name length in characters.
pub const MAX_NAME_LEN: usize = 100;
/// Minimum password length.
pub const MIN_PASSWORD_LEN: usize = 8;
/// Maximum password length.
pub const MAX_PASSWORD_LEN: usize = 128;

/// Event fields subject to cross-field rules.
#[derive(Debug, Clone, Copy)]
pub struct EventDraft<'a> {
    /// Title
    pub title: &'a str,
    /// Description
    pub description: &'a str,
    /// Location
    pub location: &'a str,
    /// Start time
    pub starts_at: DateTime<Utc>,
    /// End time
    pub ends_at: DateTime<Utc>,
    /// Optional registration deadline
    pub registration_deadline: Option<DateTime<Utc>>,
    /// Optional capacity
    pub max_attendees: Option<u32>,
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Validate a non-empty, bounded text field.
///
/// # Errors
///
/// Returns a validation error if `value` is blank or longer than `max` characters.
pub fn require_text(field: &str, value: &str, max: usize) -> Result<()> {
    if value.trim().is_empty() {
        return Err(DomainError::Validation(format!("{field} cannot be empty")));
    }
    limit_text(field, value, max)
}

/// Validate an optional bounded text field.
///
/// # Errors
///
/// Returns a validation error if `value` is longer than `max` characters.
pub fn limit_text(field: &str, value: &str, max: usize) -> Result<()> {
    let len = char_len(value);
    if len > max {
        return Err(DomainError::Validation(format!(
            "{field} too long: {len} characters (max {max})"
        )));
    }
    Ok(())
}

/// Validate a user display name.
///
/// # Errors
///
/// Returns a validation error for blank or overlong names.
pub fn validate_name(name: &str) -> Result<()> {
    require_text("Name", name, MAX_NAME_LEN)
}

/// Validate password length (strength beyond length is not enforced).
///
/// # Errors
///
/// Returns a validation error if the password is too short or too long.
pub fn validate_password(password: &str) -> Result<()> {
    let len = char_len(password);
    if len < MIN_PASSWORD_LEN {
        return Err(DomainError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if len > MAX_PASSWORD_LEN {
        return Err(DomainError::Validation(format!(
            "Password must be at most {MAX_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Validate registration notes.
///
/// # Errors
///
/// Returns a validation error if the notes are too long.
pub fn validate_notes(notes: Option<&str>) -> Result<()> {
    notes.map_or(Ok(()), |n| limit_text("Notes", n, MAX_NOTES_LEN))
}

/// Validate all event fields and their cross-field rules.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate_event(draft: &EventDraft<'_>) -> Result<()> {
    require_text("Title", draft.title, MAX_TITLE_LEN)?;
    limit_text("Description", draft.description, MAX_DESCRIPTION_LEN)?;
    limit_text("Location", draft.location, MAX_LOCATION_LEN)?;

    if draft.ends_at <= draft.starts_at {
        return Err(DomainError::Validation(
            "End time must be after start time".to_string(),
        ));
    }

    if let Some(deadline) = draft.registration_deadline {
        if deadline > draft.starts_at {
            return Err(DomainError::Validation(
                "Registration deadline cannot be after the start time".to_string(),
            ));
        }
    }

    if draft.max_attendees == Some(0) {
        return Err(DomainError::Validation(
            "Max attendees must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn draft() -> EventDraft<'static> {
        let starts_at = Utc::now() + Duration::days(7);
        EventDraft {
            title: "Rust Meetup",
            description: "Talks and pizza",
            location: "Berlin",
            starts_at,
            ends_at: starts_at + Duration::hours(3),
            registration_deadline: None,
            max_attendees: Some(50),
        }
    }

    #[test]
    fn test_valid_event() {
        assert!(validate_event(&draft()).is_ok());
    }

    #[test]
    fn test_blank_title_rejected() {
        let d = EventDraft { title: "   ", ..draft() };
        assert_eq!(
            validate_event(&d),
            Err(DomainError::Validation("Title cannot be empty".to_string()))
        );
    }

    #[test]
    fn test_long_title_counts_chars_not_bytes() {
        let title = "é".repeat(MAX_TITLE_LEN);
        let d = EventDraft { title: &title, ..draft() };
        assert!(validate_event(&d).is_ok());
    }

    #[test]
    fn test_end_before_start_rejected() {
        let base = draft();
        let d = EventDraft { ends_at: base.starts_at, ..base };
        assert!(validate_event(&d).is_err());
    }

    #[test]
    fn test_deadline_after_start_rejected() {
        let base = draft();
        let d = EventDraft {
            registration_deadline: Some(base.starts_at + Duration::minutes(1)),
            ..base
        };
        assert!(validate_event(&d).is_err());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let d = EventDraft { max_attendees: Some(0), ..draft() };
        assert!(validate_event(&d).is_err());
    }

    #[test]
    fn test_password_bounds() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("long enough").is_ok());
        assert!(validate_password(&"x".repeat(MAX_PASSWORD_LEN + 1)).is_err());
    }

    #[test]
    fn test_notes() {
        assert!(validate_notes(None).is_ok());
        assert!(validate_notes(Some(&"n".repeat(MAX_NOTES_LEN + 1))).is_err());
    }
}

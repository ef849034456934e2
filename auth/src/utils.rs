//! Email helpers shared by registration, login and profile updates.

use crate::error::{AuthError, Result};

/// Maximum accepted email length.
pub const MAX_EMAIL_LEN: usize = 255;

/// Trim and lower-case an email address.
///
/// Accounts are keyed by the normalized form, so `Alice@Example.COM` and
/// `alice@example.com` are the same account.
///
/// ```
/// use eventhub_auth::utils::normalize_email;
///
/// assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
/// ```
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate email address format.
///
/// Not full RFC 5322; it accepts what real sign-up forms accept:
/// - Exactly one `@` with non-empty local and domain parts
/// - Local part of alphanumerics and `. - + _`
/// - Dotted domain of alphanumerics and `-`, no empty labels
/// - Between 3 and 255 characters
///
/// # Examples
///
/// ```
/// use eventhub_auth::utils::is_valid_email;
///
/// assert!(is_valid_email("user@example.com"));
/// assert!(is_valid_email("user+tag@subdomain.example.com"));
/// assert!(!is_valid_email("invalid"));
/// assert!(!is_valid_email("@example.com"));
/// assert!(!is_valid_email("user@"));
/// ```
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    if email.len() < 3 || email.len() > MAX_EMAIL_LEN {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }

    let local_ok = local
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '.' | '-' | '+' | '_'));
    let domain_ok = domain.contains('.')
        && domain.split('.').all(|label| {
            !label.is_empty() && label.chars().all(|c| c.is_alphanumeric() || c == '-')
        });

    local_ok && domain_ok
}

/// Normalize then validate, returning the stored form.
///
/// # Errors
///
/// Returns [`AuthError::InvalidEmail`] if the normalized address is malformed.
pub fn parse_email(raw: &str) -> Result<String> {
    let email = normalize_email(raw);
    if is_valid_email(&email) {
        Ok(email)
    } else {
        Err(AuthError::InvalidEmail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_emails() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("user.name@example.com"));
        assert!(is_valid_email("user+tag@example.com"));
        assert!(is_valid_email("user_name@subdomain.example.com"));
        assert!(is_valid_email("user-name@example.co.uk"));
    }

    #[test]
    fn test_invalid_emails() {
        assert!(!is_valid_email("invalid"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@"));
        assert!(!is_valid_email("user@@example.com"));
        assert!(!is_valid_email("user@.com"));
        assert!(!is_valid_email("user@example."));
        assert!(!is_valid_email("user@example..com"));
        assert!(!is_valid_email("user name@example.com"));
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("a@b")); // No dot in domain
    }

    #[test]
    fn test_email_length_limits() {
        assert!(!is_valid_email("a@"));
        assert!(is_valid_email("a@b.c"));

        let long_email = format!("{}@example.com", "a".repeat(250));
        assert!(!is_valid_email(&long_email));
    }

    #[test]
    fn test_parse_email_normalizes() {
        assert_eq!(parse_email(" Bob@Example.org").as_deref(), Ok("bob@example.org"));
        assert_eq!(parse_email("bob"), Err(AuthError::InvalidEmail));
    }
}

//! URL slugs for events.
//!
//! A slug is derived from the event title and must be unique across events.
//! Collisions are resolved by appending `-2`, `-3`, ... to the base slug.

/// Maximum length of a base slug (suffixes may exceed it slightly).
pub const MAX_SLUG_LEN: usize = 80;

/// Fallback when a title has no ASCII alphanumerics.
pub const FALLBACK_SLUG: &str = "event";

/// Turn a title into a URL-safe slug.
///
/// # Examples
///
/// ```
/// use eventhub_core::slug::slugify;
///
/// assert_eq!(slugify("Rust Meetup: Async & You!"), "rust-meetup-async-you");
/// assert_eq!(slugify("  --  "), "event");
/// ```
#[must_use]
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len().min(MAX_SLUG_LEN));
    let mut pending_dash = false;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    if slug.len() > MAX_SLUG_LEN {
        slug.truncate(MAX_SLUG_LEN);
        while slug.ends_with('-') {
            slug.pop();
        }
    }

    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// Slug to try for the given collision attempt (0 = the base itself).
///
/// ```
/// use eventhub_core::slug::candidate;
///
/// assert_eq!(candidate("meetup", 0), "meetup");
/// assert_eq!(candidate("meetup", 1), "meetup-2");
/// ```
#[must_use]
pub fn candidate(base: &str, attempt: u32) -> String {
    if attempt == 0 {
        base.to_string()
    } else {
        format!("{base}-{}", attempt + 1)
    }
}

/// Whether `slug` has the shape `slugify` produces.
#[must_use]
pub fn is_valid(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_basic_slugs() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("RustConf 2025"), "rustconf-2025");
        assert_eq!(slugify("--Leading and trailing--"), "leading-and-trailing");
        assert_eq!(slugify("Café Ünïcode"), "caf-n-code");
        assert_eq!(slugify("日本語"), FALLBACK_SLUG);
    }

    #[test]
    fn test_truncation_does_not_leave_dash() {
        let title = format!("{} tail", "a".repeat(MAX_SLUG_LEN - 1));
        let slug = slugify(&title);
        assert!(slug.len() <= MAX_SLUG_LEN);
        assert!(!slug.ends_with('-'));
    }

    #[test]
    fn test_candidates_are_distinct() {
        let all: Vec<String> = (0..5).map(|n| candidate("launch", n)).collect();
        assert_eq!(all, ["launch", "launch-2", "launch-3", "launch-4", "launch-5"]);
    }

    proptest! {
        #[test]
        fn prop_slugify_always_valid(title in ".{0,200}") {
            let slug = slugify(&title);
            prop_assert!(is_valid(&slug), "invalid slug {slug:?} from {title:?}");
            prop_assert!(slug.len() <= MAX_SLUG_LEN);
        }

        #[test]
        fn prop_slugify_is_idempotent(title in "[a-zA-Z0-9 _.-]{1,120}") {
            let once = slugify(&title);
            prop_assert_eq!(slugify(&once), once);
        }

        #[test]
        fn prop_candidates_stay_valid(title in "[a-z ]{1,40}", attempt in 0u32..50) {
            prop_assert!(is_valid(&candidate(&slugify(&title), attempt)));
        }
    }
}

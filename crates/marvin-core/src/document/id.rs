//! Document identifier helpers.
//!
//! Identifiers have the shape `<PREFIX>-<NUMBER>` where the prefix is one or
//! more uppercase ASCII letters and the number has at least three digits.
//! Generated numbers are zero-padded to three digits; longer numbers are
//! accepted so allocation keeps working past `999`.

use std::sync::OnceLock;

use regex::Regex;

use crate::constants::ID_NUMBER_WIDTH;
use crate::errors::MarvinError;

/// Anchored pattern for a whole identifier.
fn id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z]+-\d{3,}$").expect("Invalid regex"))
}

/// Unanchored pattern for identifiers embedded in free text.
///
/// No word boundaries: `D-001_notes` and `xD-001` both contain `D-001`.
pub(crate) fn reference_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[A-Z]+-\d{3,}").expect("Invalid regex"))
}

/// Check whether a string is a well-formed document identifier.
pub fn is_valid_id(id: &str) -> bool {
    id_regex().is_match(id)
}

/// Check whether a string is a usable identifier prefix (uppercase letters only).
pub fn is_valid_prefix(prefix: &str) -> bool {
    !prefix.is_empty() && prefix.chars().all(|c| c.is_ascii_uppercase())
}

/// Build an identifier from a prefix and a number.
///
/// ```
/// use marvin_core::document::id::format_id;
///
/// assert_eq!(format_id("D", 7), "D-007");
/// assert_eq!(format_id("A", 1234), "A-1234");
/// ```
pub fn format_id(prefix: &str, number: u64) -> String {
    format!("{}-{:0width$}", prefix, number, width = ID_NUMBER_WIDTH)
}

/// The number following `n` for identifiers of `prefix`.
///
/// # Errors
///
/// Returns [`MarvinError::InvalidArgument`] once the numbers of `prefix`
/// are exhausted.
pub fn next_number(prefix: &str, n: u64) -> Result<u64, MarvinError> {
    n.checked_add(1).ok_or_else(|| {
        MarvinError::InvalidArgument(format!(
            "No identifiers left for prefix {} after {}",
            prefix,
            format_id(prefix, n)
        ))
    })
}

/// Split an identifier into prefix and number.
///
/// Returns `None` for anything that is not a valid identifier.
pub fn split_id(id: &str) -> Option<(&str, u64)> {
    if !is_valid_id(id) {
        return None;
    }
    let (prefix, digits) = id.split_once('-')?;
    digits.parse().ok().map(|n| (prefix, n))
}

/// Extract the number of an identifier if it carries the given prefix.
pub fn id_number_for_prefix(id: &str, prefix: &str) -> Option<u64> {
    match split_id(id) {
        Some((p, n)) if p == prefix => Some(n),
        _ => None,
    }
}

/// Extract the number from a file name of the form `<prefix>-<digits>.<ext>`.
///
/// Only the digit run is checked here, so `D-1.md` is still counted even
/// though it would not pass [`is_valid_id`].
pub fn file_stem_number(file_name: &str, prefix: &str) -> Option<u64> {
    let (stem, _ext) = file_name.rsplit_once('.')?;
    let digits = stem.strip_prefix(prefix)?.strip_prefix('-')?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Turn a title into a lowercase, hyphen-separated file name fragment.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
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

    if slug.is_empty() {
        "untitled".to_string()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_id() {
        assert!(is_valid_id("D-001"));
        assert!(is_valid_id("FEAT-0042"));
        assert!(is_valid_id("A-1000"));
        assert!(!is_valid_id("D-01"));
        assert!(!is_valid_id("d-001"));
        assert!(!is_valid_id("D001"));
        assert!(!is_valid_id("D-001 "));
    }

    #[test]
    fn test_format_id_pads_to_three_digits() {
        assert_eq!(format_id("Q", 1), "Q-001");
        assert_eq!(format_id("Q", 42), "Q-042");
        assert_eq!(format_id("Q", 999), "Q-999");
        assert_eq!(format_id("Q", 1000), "Q-1000");
        assert!(is_valid_id(&format_id("Q", 1000)));
    }

    #[test]
    fn test_next_number_overflow() {
        assert_eq!(next_number("D", 41).unwrap(), 42);
        assert!(matches!(
            next_number("D", u64::MAX),
            Err(MarvinError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_split_id() {
        assert_eq!(split_id("D-010"), Some(("D", 10)));
        assert_eq!(split_id("EPIC-123"), Some(("EPIC", 123)));
        assert_eq!(split_id("nope"), None);
    }

    #[test]
    fn test_id_number_for_prefix() {
        assert_eq!(id_number_for_prefix("M-004", "M"), Some(4));
        assert_eq!(id_number_for_prefix("M-004", "D"), None);
    }

    #[test]
    fn test_file_stem_number() {
        assert_eq!(file_stem_number("D-003.md", "D"), Some(3));
        assert_eq!(file_stem_number("D-1200.md", "D"), Some(1200));
        assert_eq!(file_stem_number("DA-003.md", "D"), None);
        assert_eq!(file_stem_number("D-00x.md", "D"), None);
        assert_eq!(file_stem_number("notes.md", "D"), None);
        assert_eq!(file_stem_number("D-.md", "D"), None);
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Sprint Planning: Q3!"), "sprint-planning-q3");
        assert_eq!(slugify("  leading and trailing  "), "leading-and-trailing");
        assert_eq!(slugify("???"), "untitled");
    }

    #[test]
    fn test_reference_regex_finds_embedded_ids() {
        let found: Vec<&str> = reference_regex()
            .find_iter("See D-001, A-0003 and (Q-123).")
            .map(|m| m.as_str())
            .collect();
        assert_eq!(found, vec!["D-001", "A-0003", "Q-123"]);

        let found: Vec<&str> = reference_regex()
            .find_iter("D-001_notes, xD-002 and 3Q-004")
            .map(|m| m.as_str())
            .collect();
        assert_eq!(found, vec!["D-001", "D-002", "Q-004"]);
    }
}

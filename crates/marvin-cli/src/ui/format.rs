//! Formatting utilities for CLI output: truncation and timestamps.

use chrono::{DateTime, Utc};

/// Truncate to at most `max_len` characters, ending with `...` when cut.
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    if max_len <= 3 {
        return ".".repeat(max_len);
    }
    let kept: String = s.chars().take(max_len - 3).collect();
    format!("{}...", kept)
}

/// Format a timestamp as relative time ("5 mins ago", "3h ago", "2d ago",
/// or the date when older than a week).
pub fn format_relative_time(timestamp: DateTime<Utc>) -> String {
    let now = Utc::now();
    let duration = now.signed_duration_since(timestamp);

    if duration.num_seconds() < 0 {
        return timestamp.format("%Y-%m-%d").to_string();
    }

    if duration.num_minutes() < 1 {
        "just now".to_string()
    } else if duration.num_hours() < 1 {
        format!("{} mins ago", duration.num_minutes())
    } else if duration.num_hours() < 24 {
        format!("{}h ago", duration.num_hours())
    } else if duration.num_days() < 7 {
        format!("{}d ago", duration.num_days())
    } else {
        timestamp.format("%Y-%m-%d").to_string()
    }
}

/// Relative form of a frontmatter timestamp.
///
/// Frontmatter timestamps are plain strings; anything that is not RFC 3339
/// is shown as written, and an empty value as `-`.
pub fn format_timestamp(raw: &str) -> String {
    if raw.is_empty() {
        return "-".to_string();
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|t| format_relative_time(t.with_timezone(&Utc)))
        .unwrap_or_else(|_| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("hello", 3), "...");
        assert_eq!(truncate_str("décision longue", 6), "déc...");
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(""), "-");
        assert_eq!(format_timestamp("last tuesday"), "last tuesday");
        assert_eq!(format_timestamp("2020-01-15T10:00:00.000Z"), "2020-01-15");
    }
}

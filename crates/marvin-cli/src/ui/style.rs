//! Message styling for CLI output.
//!
//! ## Message Types
//!
//! | Prefix | Meaning | Color |
//! |--------|---------|-------|
//! | `[ok]` | Success | Green |
//! | `[err]` | Error | Red |
//! | `[warn]` | Warning | Yellow |
//! | `[info]` | Information | Blue |
//! | `[hint]` | Suggestion | Cyan |

use owo_colors::OwoColorize;

use super::color::ColorMode;

/// Message severity/type for CLI output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Ok,
    Err,
    Warn,
    Info,
    Hint,
}

impl MessageType {
    /// Returns the prefix text for this message type.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Ok => "[ok]",
            Self::Err => "[err]",
            Self::Warn => "[warn]",
            Self::Info => "[info]",
            Self::Hint => "[hint]",
        }
    }
}

/// Main styling interface for CLI output.
///
/// # Example
///
/// ```ignore
/// let style = Style::new(ColorMode::Never);
/// assert_eq!(style.message(MessageType::Ok, "Created D-001"), "[ok] Created D-001");
/// ```
#[derive(Debug, Clone)]
pub struct Style {
    color_mode: ColorMode,
}

impl Style {
    pub fn new(color_mode: ColorMode) -> Self {
        Self { color_mode }
    }

    pub fn colors_enabled(&self) -> bool {
        self.color_mode.is_enabled()
    }

    /// Format a simple message with a type prefix.
    pub fn message(&self, msg_type: MessageType, text: &str) -> String {
        let prefix = msg_type.prefix();
        if self.colors_enabled() {
            let colored_prefix = match msg_type {
                MessageType::Ok => prefix.green().to_string(),
                MessageType::Err => prefix.red().to_string(),
                MessageType::Warn => prefix.yellow().to_string(),
                MessageType::Info => prefix.blue().to_string(),
                MessageType::Hint => prefix.cyan().to_string(),
            };
            format!("{} {}", colored_prefix, text)
        } else {
            format!("{} {}", prefix, text)
        }
    }

    /// Detail line under a message, indented to line up after the prefix.
    pub fn message_detail(&self, label: &str, value: &str) -> String {
        format!("     {}: {}", label, value)
    }

    /// Section header, bold when colors are on.
    pub fn section(&self, title: &str) -> String {
        if self.colors_enabled() {
            title.bold().to_string()
        } else {
            title.to_string()
        }
    }

    /// Format an error with optional cause and hint lines.
    pub fn error_with_context(&self, msg: &str, cause: Option<&str>, hint: Option<&str>) -> String {
        let mut output = self.message(MessageType::Err, msg);

        if let Some(cause_text) = cause {
            output.push('\n');
            output.push_str(&format!("      Cause: {}", cause_text));
        }

        if let Some(hint_text) = hint {
            output.push('\n');
            output.push_str(&format!("      Hint: {}", hint_text));
        }

        output
    }

    /// List item with a change marker: `+` added, `~` changed, `-` removed.
    pub fn list_item(&self, marker: &str, text: &str) -> String {
        let styled = if self.colors_enabled() {
            match marker {
                "+" => marker.green().to_string(),
                "~" => marker.yellow().to_string(),
                "-" => marker.red().to_string(),
                _ => marker.to_string(),
            }
        } else {
            marker.to_string()
        };
        format!("  {} {}", styled, text)
    }

    pub fn key_value(&self, key: &str, value: &str) -> String {
        if self.colors_enabled() {
            format!("{}: {}", key.dimmed(), value)
        } else {
            format!("{}: {}", key, value)
        }
    }

    /// Document identifier, yellow.
    pub fn doc_id(&self, id: &str) -> String {
        if self.colors_enabled() {
            id.yellow().to_string()
        } else {
            id.to_string()
        }
    }

    /// Workflow or processing status, colored by how settled it is.
    pub fn status(&self, status: &str) -> String {
        if !self.colors_enabled() {
            return status.to_string();
        }
        match status {
            "done" | "closed" | "completed" | "resolved" | "accepted" => status.green().to_string(),
            "blocked" | "error" | "rejected" => status.red().to_string(),
            "pending" | "processing" | "in-progress" => status.yellow().to_string(),
            _ => status.blue().to_string(),
        }
    }

    pub fn file_path(&self, path: &str) -> String {
        if self.colors_enabled() {
            path.cyan().to_string()
        } else {
            path.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() -> Style {
        Style::new(ColorMode::Never)
    }

    #[test]
    fn test_message_type_prefix() {
        assert_eq!(MessageType::Ok.prefix(), "[ok]");
        assert_eq!(MessageType::Err.prefix(), "[err]");
        assert_eq!(MessageType::Warn.prefix(), "[warn]");
    }

    #[test]
    fn test_message_no_color() {
        assert_eq!(plain().message(MessageType::Ok, "Created D-001"), "[ok] Created D-001");
        assert_eq!(plain().message(MessageType::Err, "Failed"), "[err] Failed");
    }

    #[test]
    fn test_error_with_context() {
        let output = plain().error_with_context(
            "Import failed",
            Some("Path not found"),
            Some("Check the path"),
        );
        assert!(output.contains("[err] Import failed"));
        assert!(output.contains("Cause: Path not found"));
        assert!(output.contains("Hint: Check the path"));
    }

    #[test]
    fn test_list_item() {
        assert_eq!(plain().list_item("+", "brief.pdf"), "  + brief.pdf");
        assert_eq!(plain().list_item("~", "notes.txt"), "  ~ notes.txt");
    }

    #[test]
    fn test_status_plain() {
        assert_eq!(plain().status("open"), "open");
    }
}

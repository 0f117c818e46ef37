//! Table rendering for CLI output using comfy-table.
//!
//! | Command | Table Function |
//! |---------|----------------|
//! | `marvin list` | `render_documents_table()` |
//! | `marvin status` | `render_counts_table()` |
//! | `marvin sources list` | `render_sources_table()` |

use std::collections::BTreeMap;

use comfy_table::presets::NOTHING;
use comfy_table::{Cell, CellAlignment, ColumnConstraint, Table, Width};

use marvin_core::{Document, SourceEntry};

use super::color::terminal_width;
use super::format::{format_relative_time, format_timestamp, truncate_str};

/// Width taken by every column except TITLE, including padding.
const DOCUMENT_FIXED_COLUMNS: usize = 56;

/// Render documents for `marvin list`.
///
/// # Example Output
///
/// ```text
/// ID      TYPE      STATUS  TITLE                 OWNER  UPDATED
/// D-001   decision  open    Use REST for the API  alice  2h ago
/// A-004   action    done    Draft the migration   -      3d ago
/// ```
pub fn render_documents_table(docs: &[Document]) -> String {
    if docs.is_empty() {
        return String::new();
    }

    let title_width = terminal_width()
        .saturating_sub(DOCUMENT_FIXED_COLUMNS)
        .max(20);

    let mut table = Table::new();
    table.load_preset(NOTHING);
    table.set_header(vec![
        Cell::new("ID"),
        Cell::new("TYPE"),
        Cell::new("STATUS"),
        Cell::new("TITLE"),
        Cell::new("OWNER"),
        Cell::new("UPDATED"),
    ]);
    table.set_constraints(vec![
        ColumnConstraint::LowerBoundary(Width::Fixed(6)), // ID
        ColumnConstraint::LowerBoundary(Width::Fixed(8)), // TYPE
        ColumnConstraint::LowerBoundary(Width::Fixed(6)), // STATUS
        ColumnConstraint::LowerBoundary(Width::Fixed(10)), // TITLE
        ColumnConstraint::LowerBoundary(Width::Fixed(5)), // OWNER
        ColumnConstraint::LowerBoundary(Width::Fixed(8)), // UPDATED
    ]);

    for doc in docs {
        let fm = &doc.frontmatter;
        table.add_row(vec![
            Cell::new(&fm.id),
            Cell::new(&fm.doc_type),
            Cell::new(&fm.status),
            Cell::new(truncate_str(&fm.title, title_width)),
            Cell::new(fm.owner.as_deref().unwrap_or("-")),
            Cell::new(format_timestamp(&fm.updated)),
        ]);
    }

    table.trim_fmt().to_string()
}

/// Render per-type document counts for `marvin status`.
pub fn render_counts_table(counts: &BTreeMap<String, usize>) -> String {
    let mut table = Table::new();
    table.load_preset(NOTHING);
    table.set_header(vec![
        Cell::new("TYPE"),
        Cell::new("DOCS").set_alignment(CellAlignment::Right),
    ]);
    table.set_constraints(vec![
        ColumnConstraint::LowerBoundary(Width::Fixed(10)),
        ColumnConstraint::LowerBoundary(Width::Fixed(6)),
    ]);

    for (doc_type, count) in counts {
        table.add_row(vec![
            Cell::new(doc_type),
            Cell::new(count).set_alignment(CellAlignment::Right),
        ]);
    }

    table.trim_fmt().to_string()
}

/// Render manifest entries for `marvin sources list`.
///
/// # Example Output
///
/// ```text
/// FILE        STATUS     ADDED    ARTIFACTS
/// brief.pdf   completed  2d ago   D-004, A-011
/// notes.txt   pending    just now -
/// ```
pub fn render_sources_table(entries: &[(&str, &SourceEntry)]) -> String {
    if entries.is_empty() {
        return String::new();
    }

    let mut table = Table::new();
    table.load_preset(NOTHING);
    table.set_header(vec![
        Cell::new("FILE"),
        Cell::new("STATUS"),
        Cell::new("ADDED"),
        Cell::new("ARTIFACTS"),
    ]);

    for (name, entry) in entries {
        let detail = match (&entry.error, entry.artifacts.is_empty()) {
            (Some(error), _) => truncate_str(error, 40),
            (None, true) => "-".to_string(),
            (None, false) => entry.artifacts.join(", "),
        };
        table.add_row(vec![
            Cell::new(truncate_str(name, 40)),
            Cell::new(entry.status),
            Cell::new(format_relative_time(entry.added_at)),
            Cell::new(detail),
        ]);
    }

    table.trim_fmt().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use marvin_core::DocumentFrontmatter;
    use std::path::PathBuf;

    #[test]
    fn test_empty_tables() {
        assert_eq!(render_documents_table(&[]), "");
        assert_eq!(render_sources_table(&[]), "");
    }

    #[test]
    fn test_documents_table_contents() {
        let mut fm = DocumentFrontmatter::new("D-001", "decision", "Use REST", "open");
        fm.owner = Some("alice".to_string());
        let docs = vec![Document {
            frontmatter: fm,
            content: String::new(),
            file_path: PathBuf::from("D-001.md"),
        }];

        let out = render_documents_table(&docs);
        assert!(out.contains("ID"));
        assert!(out.contains("D-001"));
        assert!(out.contains("Use REST"));
        assert!(out.contains("alice"));
    }

    #[test]
    fn test_counts_table() {
        let counts: BTreeMap<String, usize> =
            [("action".to_string(), 2), ("decision".to_string(), 5)].into_iter().collect();
        let out = render_counts_table(&counts);
        assert!(out.contains("action"));
        assert!(out.contains('5'));
    }
}

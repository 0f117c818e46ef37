//! On-disk encoding of documents.
//!
//! A document file is a YAML frontmatter block between `---` lines, a blank
//! line, and the body:
//!
//! ```text
//! ---
//! id: D-001
//! title: Use REST
//! type: decision
//! status: open
//! created: 2024-05-01T10:00:00.000Z
//! updated: 2024-05-01T10:00:00.000Z
//! ---
//!
//! We chose REST.
//! ```

use std::fs;
use std::path::Path;

use thiserror::Error;

use super::{Document, DocumentFrontmatter};
use crate::errors::MarvinError;

const DELIMITER: &str = "---";

/// Failure to decode a document's text.
#[derive(Error, Debug)]
pub enum CodecError {
    /// The text does not start with a `---` line.
    #[error("missing frontmatter block")]
    MissingFrontmatter,

    /// The opening `---` has no matching closing line.
    #[error("unterminated frontmatter block")]
    UnterminatedFrontmatter,

    /// The frontmatter is not valid YAML for a document.
    #[error("invalid frontmatter: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Split text into its raw frontmatter and body.
///
/// The body is returned untrimmed.
pub fn split_frontmatter(text: &str) -> Result<(&str, &str), CodecError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let rest = text
        .strip_prefix(DELIMITER)
        .and_then(|r| r.strip_prefix("\r\n").or_else(|| r.strip_prefix('\n')))
        .ok_or(CodecError::MissingFrontmatter)?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == DELIMITER {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Ok((yaml, body));
        }
        offset += line.len();
    }

    Err(CodecError::UnterminatedFrontmatter)
}

/// Parse the frontmatter as a generic YAML value.
///
/// Used by the import classifier, which must inspect `id`/`type` without
/// committing to the full document shape.
pub fn parse_frontmatter_value(text: &str) -> Result<(serde_yaml::Value, String), CodecError> {
    let (yaml, body) = split_frontmatter(text)?;
    let value: serde_yaml::Value = serde_yaml::from_str(yaml)?;
    Ok((value, body.trim().to_string()))
}

/// Parse document text into frontmatter and trimmed content.
pub fn parse_document(text: &str) -> Result<(DocumentFrontmatter, String), CodecError> {
    let (yaml, body) = split_frontmatter(text)?;
    let frontmatter: DocumentFrontmatter = serde_yaml::from_str(yaml)?;
    Ok((frontmatter, body.trim().to_string()))
}

/// Encode a document as file text.
pub fn serialize_document(
    frontmatter: &DocumentFrontmatter,
    content: &str,
) -> Result<String, MarvinError> {
    let yaml = serde_yaml::to_string(frontmatter)?;
    let content = content.trim();

    let mut out = String::with_capacity(yaml.len() + content.len() + 16);
    out.push_str(DELIMITER);
    out.push('\n');
    out.push_str(&yaml);
    if !yaml.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(DELIMITER);
    out.push('\n');
    if !content.is_empty() {
        out.push('\n');
        out.push_str(content);
        out.push('\n');
    }
    Ok(out)
}

/// Read and decode a document file.
pub fn read_document(path: &Path) -> Result<Document, MarvinError> {
    let text = fs::read_to_string(path)?;
    let (frontmatter, content) =
        parse_document(&text).map_err(|e| MarvinError::InvalidDocument {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    Ok(Document {
        frontmatter,
        content,
        file_path: path.to_path_buf(),
    })
}

/// Encode and write a document file, creating parent directories.
pub fn write_document(
    path: &Path,
    frontmatter: &DocumentFrontmatter,
    content: &str,
) -> Result<(), MarvinError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serialize_document(frontmatter, content)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> DocumentFrontmatter {
        let mut fm = DocumentFrontmatter::new("D-001", "decision", "Use REST", "open");
        fm.owner = Some("alice".to_string());
        fm.tags = vec!["api".to_string(), "architecture".to_string()];
        fm.extra.insert(
            "btpServices".to_string(),
            serde_yaml::to_value(vec!["xsuaa", "destination"]).unwrap(),
        );
        fm
    }

    #[test]
    fn test_round_trip_preserves_frontmatter_and_trims_content() {
        let fm = sample();
        let text = serialize_document(&fm, "\n\n  We chose REST.\n\nBecause.  \n").unwrap();

        let (parsed, content) = parse_document(&text).unwrap();
        assert_eq!(parsed, fm);
        assert_eq!(content, "We chose REST.\n\nBecause.");
    }

    #[test]
    fn test_serialized_layout() {
        let fm = DocumentFrontmatter::new("Q-002", "question", "Why?", "open");
        let text = serialize_document(&fm, "Body").unwrap();

        assert!(text.starts_with("---\nid: Q-002\n"));
        assert!(text.contains("\ntype: question\n"));
        assert!(text.ends_with("---\n\nBody\n"));
        assert!(!text.contains("owner"));
        assert!(!text.contains("tags"));
    }

    #[test]
    fn test_empty_content_round_trip() {
        let fm = DocumentFrontmatter::new("A-001", "action", "Do it", "open");
        let text = serialize_document(&fm, "   ").unwrap();
        let (_, content) = parse_document(&text).unwrap();
        assert_eq!(content, "");
    }

    #[test]
    fn test_missing_frontmatter() {
        assert!(matches!(
            parse_document("# Just a heading\n"),
            Err(CodecError::MissingFrontmatter)
        ));
    }

    #[test]
    fn test_unterminated_frontmatter() {
        assert!(matches!(
            parse_document("---\nid: D-001\ntype: decision\n"),
            Err(CodecError::UnterminatedFrontmatter)
        ));
    }

    #[test]
    fn test_frontmatter_missing_required_field() {
        assert!(matches!(
            parse_document("---\ntitle: no id\n---\nbody"),
            Err(CodecError::Yaml(_))
        ));
    }

    #[test]
    fn test_crlf_input() {
        let text = "---\r\nid: D-004\r\ntype: decision\r\ntitle: CRLF\r\n---\r\n\r\nBody\r\n";
        let (fm, content) = parse_document(text).unwrap();
        assert_eq!(fm.id, "D-004");
        assert_eq!(content, "Body");
    }

    #[test]
    fn test_parse_frontmatter_value() {
        let (value, body) = parse_frontmatter_value("---\nid: X-001\nfoo: [1, 2]\n---\nHello").unwrap();
        assert_eq!(value["id"].as_str(), Some("X-001"));
        assert_eq!(body, "Hello");
    }

    #[test]
    fn test_write_and_read_document() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("decisions/D-001.md");
        let fm = sample();

        write_document(&path, &fm, "We chose REST.").unwrap();
        let doc = read_document(&path).unwrap();

        assert_eq!(doc.frontmatter, fm);
        assert_eq!(doc.content, "We chose REST.");
        assert_eq!(doc.file_path, path);
    }

    #[test]
    fn test_read_invalid_document_reports_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.md");
        fs::write(&path, "no frontmatter here").unwrap();

        match read_document(&path) {
            Err(MarvinError::InvalidDocument { path: p, .. }) => assert_eq!(p, path),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}

//! Common constants used throughout marvin-core.
//!
//! This module centralizes directory names, file names and extension lists
//! so the store, the manifest and the import engine agree on one layout.

// ============================================================================
// Directory Names
// ============================================================================

/// The name of the Marvin metadata directory within a project.
///
/// All Marvin-managed data lives under `.marvin/` at the project root.
pub const MARVIN_DIR: &str = ".marvin";

/// The subdirectory within `.marvin` holding one directory per document type.
///
/// Layout: `.marvin/docs/{type-dir}/{ID}.md`
pub const DOCS_DIR: &str = "docs";

/// The intake directory for external reference files.
///
/// Layout: `.marvin/sources/{file}`
pub const SOURCES_DIR: &str = "sources";

// ============================================================================
// File Names
// ============================================================================

/// The name of the project-level configuration file inside `.marvin/`.
pub const PROJECT_CONFIG_FILENAME: &str = "config.yaml";

/// The persisted source manifest inside the intake directory.
pub const MANIFEST_FILENAME: &str = ".manifest.json";

/// Current on-disk version of the source manifest.
pub const MANIFEST_VERSION: u32 = 1;

/// Extension used for every stored document.
pub const DOCUMENT_EXTENSION: &str = "md";

// ============================================================================
// Extensions
// ============================================================================

/// Extensions tracked by the source manifest.
pub const REFERENCE_EXTENSIONS: &[&str] = &["pdf", "md", "txt"];

/// Extensions the import classifier treats as raw source without parsing.
pub const RAW_SOURCE_EXTENSIONS: &[&str] = &["pdf", "txt"];

/// Check whether an extension (without the leading dot) is a markdown one.
#[inline]
pub fn is_markdown_extension(ext: &str) -> bool {
    matches!(ext.to_lowercase().as_str(), "md" | "markdown")
}

/// Check whether an extension is tracked by the source manifest.
#[inline]
pub fn is_reference_extension(ext: &str) -> bool {
    REFERENCE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
}

/// Check whether an extension is classified as raw source on sight.
#[inline]
pub fn is_raw_source_extension(ext: &str) -> bool {
    RAW_SOURCE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
}

// ============================================================================
// Document Defaults
// ============================================================================

/// Status assigned to newly created documents.
pub const DEFAULT_STATUS: &str = "open";

/// Title assigned to newly created documents without one.
pub const DEFAULT_TITLE: &str = "Untitled";

/// Minimum zero-padded width of a generated identifier number.
pub const ID_NUMBER_WIDTH: usize = 3;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_reference_extension() {
        assert!(is_reference_extension("pdf"));
        assert!(is_reference_extension("MD"));
        assert!(is_reference_extension("txt"));
        assert!(!is_reference_extension("docx"));
        assert!(!is_reference_extension("json"));
    }

    #[test]
    fn test_is_raw_source_extension() {
        assert!(is_raw_source_extension("pdf"));
        assert!(is_raw_source_extension("TXT"));
        assert!(!is_raw_source_extension("md"));
    }

    #[test]
    fn test_is_markdown_extension() {
        assert!(is_markdown_extension("md"));
        assert!(is_markdown_extension("Markdown"));
        assert!(!is_markdown_extension("txt"));
    }
}

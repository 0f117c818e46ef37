//! Classification of import inputs.
//!
//! Classification is a read-only inspection that decides how the import
//! engine treats a path. The decision is an ordered cascade of rules where
//! the first matching rule wins, most specific first:
//!
//! | Input     | Rule                                              | Classification    |
//! |-----------|---------------------------------------------------|-------------------|
//! | file      | `.pdf` / `.txt` extension                         | `raw-source-file` |
//! | file      | markdown with valid `id` and known `type`         | `marvin-document` |
//! | file      | anything else                                     | `raw-source-file` |
//! | directory | named `.marvin`, has `config.yaml` or `.marvin/`  | `marvin-project`  |
//! | directory | has a subdirectory named like a type directory    | `docs-directory`  |
//! | directory | has at least one valid markdown document          | `docs-directory`  |
//! | directory | anything else                                     | `raw-source-dir`  |
//!
//! Reordering the rules changes behavior.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::constants::{
    is_markdown_extension, is_raw_source_extension, MARVIN_DIR, PROJECT_CONFIG_FILENAME,
};
use crate::document::codec::{parse_document, parse_frontmatter_value, CodecError};
use crate::document::id::is_valid_id;
use crate::document::DocumentFrontmatter;
use crate::errors::MarvinError;
use crate::store::DocumentStore;

// ============================================================================
// Classification
// ============================================================================

/// What an import input path represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Classification {
    /// A whole exported Marvin project.
    MarvinProject,
    /// A directory of recognized documents.
    DocsDirectory,
    /// A single recognized document.
    MarvinDocument,
    /// A directory of unrecognized files.
    RawSourceDir,
    /// A single unrecognized file.
    RawSourceFile,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::MarvinProject => "marvin-project",
            Self::DocsDirectory => "docs-directory",
            Self::MarvinDocument => "marvin-document",
            Self::RawSourceDir => "raw-source-dir",
            Self::RawSourceFile => "raw-source-file",
        };
        f.write_str(s)
    }
}

// ============================================================================
// KnownTypes
// ============================================================================

/// The type names and directory names a target store recognizes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnownTypes {
    pub types: BTreeSet<String>,
    pub dirs: BTreeSet<String>,
}

impl KnownTypes {
    pub fn from_store(store: &DocumentStore) -> Self {
        Self {
            types: store.registered_types(),
            dirs: store.type_dir_names(),
        }
    }
}

// ============================================================================
// Rules
// ============================================================================

type Predicate = fn(&Path, &KnownTypes) -> bool;

/// One step of the classification cascade.
struct Rule {
    name: &'static str,
    applies: Predicate,
    classification: Classification,
}

const FILE_RULES: &[Rule] = &[
    Rule {
        name: "raw source extension",
        applies: has_raw_source_extension,
        classification: Classification::RawSourceFile,
    },
    Rule {
        name: "recognized document",
        applies: is_recognized_document,
        classification: Classification::MarvinDocument,
    },
    Rule {
        name: "fallback",
        applies: always,
        classification: Classification::RawSourceFile,
    },
];

const DIR_RULES: &[Rule] = &[
    Rule {
        name: "project marker",
        applies: is_project_dir,
        classification: Classification::MarvinProject,
    },
    Rule {
        name: "type subdirectory",
        applies: has_type_subdir,
        classification: Classification::DocsDirectory,
    },
    Rule {
        name: "recognized documents",
        applies: has_recognized_documents,
        classification: Classification::DocsDirectory,
    },
    Rule {
        name: "fallback",
        applies: always,
        classification: Classification::RawSourceDir,
    },
];

/// Classify an input path.
///
/// # Errors
///
/// Returns [`MarvinError::PathNotFound`] if the path does not exist.
pub fn classify_path(path: &Path, known: &KnownTypes) -> Result<Classification, MarvinError> {
    let rules = if path.is_dir() {
        DIR_RULES
    } else if path.is_file() {
        FILE_RULES
    } else {
        return Err(MarvinError::PathNotFound(path.display().to_string()));
    };

    let rule = rules
        .iter()
        .find(|rule| (rule.applies)(path, known))
        .unwrap_or(&rules[rules.len() - 1]);

    tracing::debug!(
        path = %path.display(),
        rule = rule.name,
        classification = %rule.classification,
        "Classified import input"
    );
    Ok(rule.classification)
}

fn always(_: &Path, _: &KnownTypes) -> bool {
    true
}

fn has_raw_source_extension(path: &Path, _: &KnownTypes) -> bool {
    extension(path).is_some_and(is_raw_source_extension)
}

fn is_recognized_document(path: &Path, known: &KnownTypes) -> bool {
    read_recognized_document(path, known).is_some()
}

fn is_project_dir(path: &Path, _: &KnownTypes) -> bool {
    find_marvin_dir(path).is_some()
}

fn has_type_subdir(path: &Path, known: &KnownTypes) -> bool {
    subdirectories(path)
        .iter()
        .filter_map(|d| d.file_name().and_then(|n| n.to_str()))
        .any(|name| known.dirs.contains(name))
}

fn has_recognized_documents(path: &Path, known: &KnownTypes) -> bool {
    markdown_files(path)
        .iter()
        .any(|f| read_recognized_document(f, known).is_some())
}

// ============================================================================
// Helpers shared with the engine
// ============================================================================

/// Locate the `.marvin` directory of an exported project.
///
/// Accepts the `.marvin` directory itself, a directory containing
/// `config.yaml`, or a project root containing `.marvin/`.
pub fn find_marvin_dir(path: &Path) -> Option<PathBuf> {
    if !path.is_dir() {
        return None;
    }
    if path.file_name().and_then(|n| n.to_str()) == Some(MARVIN_DIR) {
        return Some(path.to_path_buf());
    }
    if path.join(PROJECT_CONFIG_FILENAME).is_file() {
        return Some(path.to_path_buf());
    }
    let nested = path.join(MARVIN_DIR);
    if nested.join(PROJECT_CONFIG_FILENAME).is_file() {
        return Some(nested);
    }
    None
}

/// A markdown file whose frontmatter carries a well-formed `id` and a
/// `type` the target store knows.
#[derive(Debug)]
pub struct RecognizedDocument {
    pub id: String,
    /// Full decode of the file. Loosely typed frontmatter may still fail
    /// here even though the file is a document.
    pub parsed: Result<(DocumentFrontmatter, String), CodecError>,
}

/// Read a markdown file if it is a document the target store recognizes.
///
/// Recognition depends only on `id` and `type`. Returns `None` for anything
/// that is not markdown, has no frontmatter, lacks a well-formed `id`, or
/// has a `type` outside `known`. Never fails.
pub fn read_recognized_document(path: &Path, known: &KnownTypes) -> Option<RecognizedDocument> {
    if !extension(path).is_some_and(is_markdown_extension) {
        return None;
    }

    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            tracing::debug!("Cannot read {}: {}", path.display(), e);
            return None;
        }
    };

    let (value, _) = parse_frontmatter_value(&text).ok()?;
    let id = value.get("id").and_then(|v| v.as_str())?;
    let doc_type = value.get("type").and_then(|v| v.as_str())?;
    if !is_valid_id(id) || !known.types.contains(doc_type) {
        return None;
    }

    Some(RecognizedDocument {
        id: id.to_string(),
        parsed: parse_document(&text),
    })
}

/// Immediate subdirectories of `dir`, sorted, hidden ones excluded.
pub(crate) fn subdirectories(dir: &Path) -> Vec<PathBuf> {
    list_dir(dir, |p| p.is_dir())
}

/// Markdown files directly inside `dir`, sorted.
pub(crate) fn markdown_files(dir: &Path) -> Vec<PathBuf> {
    list_dir(dir, |p| p.is_file() && extension(p).is_some_and(is_markdown_extension))
}

/// Non-hidden regular files directly inside `dir`, sorted.
pub(crate) fn plain_files(dir: &Path) -> Vec<PathBuf> {
    list_dir(dir, |p| p.is_file())
}

fn list_dir(dir: &Path, keep: impl Fn(&Path) -> bool) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut paths: Vec<PathBuf> = entries
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| {
            !p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with('.'))
        })
        .filter(|p| keep(p.as_path()))
        .collect();
    paths.sort();
    paths
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|e| e.to_str())
}

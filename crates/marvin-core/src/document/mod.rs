//! Document model for Marvin.
//!
//! A document is a piece of project governance (a decision, an action, a
//! question, or any registered artifact type) stored as one markdown file
//! with a YAML frontmatter block.
//!
//! ## Key Types
//!
//! - [`DocumentTypeRegistration`] - maps a type name to a directory and id prefix
//! - [`DocumentFrontmatter`] - required metadata plus an open extension map
//! - [`Document`] - frontmatter, body and the file it was read from
//! - [`DocumentPatch`] - partial update applied by `create`/`update`
//! - [`DocumentFilter`] - AND-combined filter used by `list`

pub mod codec;
pub mod id;

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::MarvinError;

// ============================================================================
// Type Registrations
// ============================================================================

/// Registration of one document type with the store.
///
/// Each type owns a directory under `.marvin/docs/` and an identifier prefix.
/// A `dated` type keeps numeric ids in its frontmatter but names its files
/// `<YYYY-MM-DD>-<slug>.md`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentTypeRegistration {
    /// Type name as written in frontmatter (e.g. `decision`).
    #[serde(rename = "type")]
    pub type_name: String,

    /// Directory name under `docs/` (e.g. `decisions`).
    pub dir_name: String,

    /// Identifier prefix (e.g. `D`).
    pub id_prefix: String,

    /// Use date-slug file names instead of `<ID>.md`.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub dated: bool,
}

impl DocumentTypeRegistration {
    /// Create a registration with numeric file names.
    pub fn new(
        type_name: impl Into<String>,
        dir_name: impl Into<String>,
        id_prefix: impl Into<String>,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            dir_name: dir_name.into(),
            id_prefix: id_prefix.into(),
            dated: false,
        }
    }

    /// Switch this registration to date-slug file names.
    pub fn with_dated_filenames(mut self) -> Self {
        self.dated = true;
        self
    }

    /// Validate the shape of this registration in isolation.
    pub fn validate(&self) -> Result<(), MarvinError> {
        let reject = |reason: &str| {
            Err(MarvinError::InvalidDocumentType {
                type_name: self.type_name.clone(),
                reason: reason.to_string(),
            })
        };

        if self.type_name.trim().is_empty() {
            return reject("type name must not be empty");
        }
        if self.dir_name.trim().is_empty()
            || self.dir_name.contains(['/', '\\'])
            || self.dir_name.starts_with('.')
        {
            return reject("directory name must be a plain, non-hidden name");
        }
        if !id::is_valid_prefix(&self.id_prefix) {
            return reject("id prefix must be one or more uppercase letters");
        }
        Ok(())
    }
}

/// Built-in registrations present in every store.
pub fn builtin_registrations() -> Vec<DocumentTypeRegistration> {
    vec![
        DocumentTypeRegistration::new("decision", "decisions", "D"),
        DocumentTypeRegistration::new("action", "actions", "A"),
        DocumentTypeRegistration::new("question", "questions", "Q"),
    ]
}

// ============================================================================
// Frontmatter
// ============================================================================

/// Current time as an RFC 3339 UTC timestamp with millisecond precision.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Metadata block of a document.
///
/// Unknown keys land in [`extra`](Self::extra) and are written back
/// unchanged, so type-specific fields survive a read/write cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentFrontmatter {
    /// Unique identifier (`D-001`).
    pub id: String,

    /// Human-readable title.
    #[serde(default, deserialize_with = "scalar_string")]
    pub title: String,

    /// Registered type name.
    #[serde(rename = "type")]
    pub doc_type: String,

    /// Free-form workflow status (`open`, `done`, ...).
    #[serde(default, deserialize_with = "scalar_string")]
    pub status: String,

    /// Creation timestamp, set once.
    #[serde(default, deserialize_with = "scalar_string")]
    pub created: String,

    /// Last modification timestamp.
    #[serde(default, deserialize_with = "scalar_string")]
    pub updated: String,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "optional_scalar_string"
    )]
    pub owner: Option<String>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "optional_scalar_string"
    )]
    pub priority: Option<String>,

    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "tag_list"
    )]
    pub tags: Vec<String>,

    /// Reference file this document was derived from.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "optional_scalar_string"
    )]
    pub source: Option<String>,

    /// Type-specific fields.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl DocumentFrontmatter {
    /// Create a frontmatter with the required fields and empty optionals.
    pub fn new(
        id: impl Into<String>,
        doc_type: impl Into<String>,
        title: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        let now = now_timestamp();
        Self {
            id: id.into(),
            title: title.into(),
            doc_type: doc_type.into(),
            status: status.into(),
            created: now.clone(),
            updated: now,
            owner: None,
            priority: None,
            tags: Vec::new(),
            source: None,
            extra: BTreeMap::new(),
        }
    }

    /// Whether the tag list contains `tag`.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Append a tag unless it is already present.
    pub fn add_tag(&mut self, tag: &str) {
        if !self.has_tag(tag) {
            self.tags.push(tag.to_string());
        }
    }
}

/// Accept any YAML scalar where a string is expected.
///
/// Hand-edited files often carry `priority: 1` or `owner: null`.
fn scalar_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(optional_scalar_string(deserializer)?.unwrap_or_default())
}

fn optional_scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match serde_yaml::Value::deserialize(deserializer)? {
        serde_yaml::Value::Null => Ok(None),
        serde_yaml::Value::String(s) => Ok(Some(s)),
        serde_yaml::Value::Bool(b) => Ok(Some(b.to_string())),
        serde_yaml::Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(D::Error::custom(format!(
            "expected a scalar value, found {:?}",
            other
        ))),
    }
}

/// Accept `tags: api` as well as `tags: [api, rest]`.
fn tag_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let scalar = |value: serde_yaml::Value| match value {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!(
            "expected a tag, found {:?}",
            other
        ))),
    };

    match serde_yaml::Value::deserialize(deserializer)? {
        serde_yaml::Value::Null => Ok(Vec::new()),
        serde_yaml::Value::Sequence(items) => items
            .into_iter()
            .filter(|v| !v.is_null())
            .map(scalar)
            .collect(),
        other => Ok(vec![scalar(other)?]),
    }
}

/// Frontmatter keys owned by [`DocumentFrontmatter`] itself.
///
/// An extension field with one of these names would be written twice.
pub const RESERVED_FIELDS: &[&str] = &[
    "id", "title", "type", "status", "created", "updated", "owner", "priority", "tags", "source",
];

// ============================================================================
// Document
// ============================================================================

/// A stored document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub frontmatter: DocumentFrontmatter,

    /// Body text, trimmed.
    pub content: String,

    /// File the document was read from or written to.
    pub file_path: PathBuf,
}

impl Document {
    pub fn id(&self) -> &str {
        &self.frontmatter.id
    }

    pub fn doc_type(&self) -> &str {
        &self.frontmatter.doc_type
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.frontmatter.id, self.frontmatter.title)
    }
}

// ============================================================================
// DocumentPatch
// ============================================================================

/// Partial frontmatter used by `create` and `update`.
///
/// Fields left as `None` are not touched, so they never shadow defaults or
/// existing values. `extra` entries are merged key by key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentPatch {
    pub title: Option<String>,
    pub status: Option<String>,
    pub owner: Option<String>,
    pub priority: Option<String>,
    pub tags: Option<Vec<String>>,
    pub source: Option<String>,
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl DocumentPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn with_priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = Some(priority.into());
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: serde_yaml::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Build a patch carrying every mutable field of `frontmatter`.
    ///
    /// Used when an import overwrites an existing document.
    pub fn from_frontmatter(frontmatter: &DocumentFrontmatter) -> Self {
        Self {
            title: Some(frontmatter.title.clone()).filter(|t| !t.is_empty()),
            status: Some(frontmatter.status.clone()).filter(|s| !s.is_empty()),
            owner: frontmatter.owner.clone(),
            priority: frontmatter.priority.clone(),
            tags: Some(frontmatter.tags.clone()),
            source: frontmatter.source.clone(),
            extra: frontmatter.extra.clone(),
        }
    }

    /// Apply this patch over `frontmatter`.
    ///
    /// Extension fields named like a [reserved field](RESERVED_FIELDS) are
    /// dropped with a warning.
    pub fn apply(self, frontmatter: &mut DocumentFrontmatter) {
        if let Some(title) = self.title {
            frontmatter.title = title;
        }
        if let Some(status) = self.status {
            frontmatter.status = status;
        }
        if self.owner.is_some() {
            frontmatter.owner = self.owner;
        }
        if self.priority.is_some() {
            frontmatter.priority = self.priority;
        }
        if let Some(tags) = self.tags {
            frontmatter.tags = tags;
        }
        if self.source.is_some() {
            frontmatter.source = self.source;
        }
        for (key, value) in self.extra {
            if RESERVED_FIELDS.contains(&key.as_str()) {
                tracing::warn!(field = %key, "Ignoring extension field with a reserved name");
                continue;
            }
            frontmatter.extra.insert(key, value);
        }
    }
}

// ============================================================================
// DocumentFilter
// ============================================================================

/// Filter for [`DocumentStore::list`](crate::store::DocumentStore::list).
///
/// All set fields must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentFilter {
    pub doc_type: Option<String>,
    pub status: Option<String>,
    pub owner: Option<String>,
    /// Matches if the document's tag list contains this tag.
    pub tag: Option<String>,
}

impl DocumentFilter {
    /// A filter matching every document.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, doc_type: impl Into<String>) -> Self {
        self.doc_type = Some(doc_type.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn matches(&self, frontmatter: &DocumentFrontmatter) -> bool {
        if let Some(doc_type) = &self.doc_type {
            if &frontmatter.doc_type != doc_type {
                return false;
            }
        }
        if let Some(status) = &self.status {
            if &frontmatter.status != status {
                return false;
            }
        }
        if let Some(owner) = &self.owner {
            if frontmatter.owner.as_ref() != Some(owner) {
                return false;
            }
        }
        if let Some(tag) = &self.tag {
            if !frontmatter.has_tag(tag) {
                return false;
            }
        }
        true
    }
}

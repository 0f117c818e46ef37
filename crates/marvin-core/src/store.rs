//! Directory-backed document store.
//!
//! Every registered document type owns a directory under `.marvin/docs/`.
//! Files on disk are the source of truth; the store keeps an in-memory index
//! of frontmatter keyed by identifier that is rebuilt on [`DocumentStore::open`]
//! and [`DocumentStore::reload`] and updated by every mutation made through
//! the same instance.
//!
//! Identifier allocation never consults the index. [`DocumentStore::next_id`]
//! rescans the type directory on every call so files added or removed by
//! other tools between calls are taken into account.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::constants::{DEFAULT_STATUS, DEFAULT_TITLE, DOCUMENT_EXTENSION};
use crate::document::codec::{read_document, write_document};
use crate::document::id::{
    file_stem_number, format_id, id_number_for_prefix, is_valid_id, next_number, slugify,
};
use crate::document::{
    builtin_registrations, now_timestamp, Document, DocumentFilter, DocumentFrontmatter,
    DocumentPatch, DocumentTypeRegistration,
};
use crate::errors::MarvinError;

// ============================================================================
// Index
// ============================================================================

/// Cached metadata for one document.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub frontmatter: DocumentFrontmatter,
    pub file_path: PathBuf,
}

// ============================================================================
// DocumentStore
// ============================================================================

/// CRUD over the document corpus of one project.
#[derive(Debug)]
pub struct DocumentStore {
    /// `.marvin/docs`
    docs_dir: PathBuf,

    /// Registrations keyed by type name.
    registrations: BTreeMap<String, DocumentTypeRegistration>,

    index: HashMap<String, IndexEntry>,
}

impl DocumentStore {
    /// Open a store rooted at `docs_dir`.
    ///
    /// `extra` registrations are merged over the built-in ones; a registration
    /// with the same type name as a built-in replaces it. Two registrations
    /// may not share a directory or an id prefix.
    ///
    /// # Errors
    ///
    /// Returns [`MarvinError::InvalidDocumentType`] for malformed or clashing
    /// registrations, or an I/O error if the index scan fails.
    pub fn open(
        docs_dir: impl Into<PathBuf>,
        extra: impl IntoIterator<Item = DocumentTypeRegistration>,
    ) -> Result<Self, MarvinError> {
        let mut registrations = BTreeMap::new();
        for reg in builtin_registrations().into_iter().chain(extra) {
            reg.validate()?;
            registrations.insert(reg.type_name.clone(), reg);
        }
        check_unique_registrations(&registrations)?;

        let mut store = Self {
            docs_dir: docs_dir.into(),
            registrations,
            index: HashMap::new(),
        };
        store.reload()?;
        Ok(store)
    }

    /// Root directory holding one subdirectory per type.
    pub fn docs_dir(&self) -> &Path {
        &self.docs_dir
    }

    /// All registrations, ordered by type name.
    pub fn registrations(&self) -> impl Iterator<Item = &DocumentTypeRegistration> {
        self.registrations.values()
    }

    /// Look up the registration for a type.
    ///
    /// # Errors
    ///
    /// Returns [`MarvinError::UnknownDocumentType`] if the type is not registered.
    pub fn registration(&self, doc_type: &str) -> Result<&DocumentTypeRegistration, MarvinError> {
        self.registrations
            .get(doc_type)
            .ok_or_else(|| MarvinError::UnknownDocumentType(doc_type.to_string()))
    }

    /// Names of every registered type.
    pub fn registered_types(&self) -> BTreeSet<String> {
        self.registrations.keys().cloned().collect()
    }

    /// Directory names of every registered type.
    pub fn type_dir_names(&self) -> BTreeSet<String> {
        self.registrations
            .values()
            .map(|r| r.dir_name.clone())
            .collect()
    }

    /// Directory of a registered type.
    pub fn type_dir(&self, registration: &DocumentTypeRegistration) -> PathBuf {
        self.docs_dir.join(&registration.dir_name)
    }

    /// The cached metadata index.
    pub fn index(&self) -> &HashMap<String, IndexEntry> {
        &self.index
    }

    /// Rebuild the index from disk.
    ///
    /// Files that fail to decode are skipped with a warning.
    pub fn reload(&mut self) -> Result<(), MarvinError> {
        let mut index = HashMap::new();
        for reg in self.registrations.values() {
            for doc in self.read_type_dir(reg)? {
                index.insert(
                    doc.frontmatter.id.clone(),
                    IndexEntry {
                        frontmatter: doc.frontmatter,
                        file_path: doc.file_path,
                    },
                );
            }
        }
        tracing::debug!(
            documents = index.len(),
            docs_dir = %self.docs_dir.display(),
            "Document index rebuilt"
        );
        self.index = index;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// List documents matching `filter`.
    ///
    /// Only registered type directories are read. Within a directory,
    /// documents come back in file-name order.
    pub fn list(&self, filter: &DocumentFilter) -> Result<Vec<Document>, MarvinError> {
        let mut docs = Vec::new();
        for reg in self.registrations.values() {
            if let Some(doc_type) = &filter.doc_type {
                if &reg.type_name != doc_type {
                    continue;
                }
            }
            docs.extend(
                self.read_type_dir(reg)?
                    .into_iter()
                    .filter(|d| filter.matches(&d.frontmatter)),
            );
        }
        Ok(docs)
    }

    /// Find a document by identifier.
    ///
    /// This reads every registered directory until a match is found.
    pub fn get(&self, id: &str) -> Result<Option<Document>, MarvinError> {
        for reg in self.registrations.values() {
            if let Some(doc) = self
                .read_type_dir(reg)?
                .into_iter()
                .find(|d| d.frontmatter.id == id)
            {
                return Ok(Some(doc));
            }
        }
        Ok(None)
    }

    /// Whether any document carries `id`.
    pub fn exists(&self, id: &str) -> Result<bool, MarvinError> {
        Ok(self.get(id)?.is_some())
    }

    /// Compute the next free identifier for a type.
    ///
    /// Scans the type directory for `<prefix>-<digits>.md` files (and, for
    /// dated types, the ids inside each file) and returns the successor of
    /// the largest number found, or `<prefix>-001`.
    pub fn next_id(&self, doc_type: &str) -> Result<String, MarvinError> {
        let reg = self.registration(doc_type)?;
        let max = self.max_id_number(reg)?;
        Ok(format_id(&reg.id_prefix, next_number(&reg.id_prefix, max)?))
    }

    /// Number of document files per registered type.
    pub fn counts(&self) -> Result<BTreeMap<String, usize>, MarvinError> {
        let mut counts = BTreeMap::new();
        for reg in self.registrations.values() {
            let count = list_document_files(&self.type_dir(reg))?.len();
            counts.insert(reg.type_name.clone(), count);
        }
        Ok(counts)
    }

    // ------------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------------

    /// Create a document with a freshly allocated identifier.
    ///
    /// Defaults: `status: open`, `title: Untitled`, `created`/`updated` set
    /// to now. Fields set in `patch` override the defaults.
    pub fn create(
        &mut self,
        doc_type: &str,
        patch: DocumentPatch,
        content: Option<&str>,
    ) -> Result<Document, MarvinError> {
        let reg = self.registration(doc_type)?.clone();
        let id = self.next_id(doc_type)?;

        let mut frontmatter = DocumentFrontmatter::new(&id, doc_type, DEFAULT_TITLE, DEFAULT_STATUS);
        patch.apply(&mut frontmatter);

        let path = self.path_for_new(&reg, &frontmatter)?;
        let doc = self.write(frontmatter, content.unwrap_or_default(), path)?;
        tracing::info!(id = %doc.frontmatter.id, doc_type, "Created document");
        Ok(doc)
    }

    /// Store a document whose identifier was chosen by the caller.
    ///
    /// Conflicts are not negotiated here; resolve them before calling.
    ///
    /// # Errors
    ///
    /// - [`MarvinError::UnknownDocumentType`] if the type is not registered
    /// - [`MarvinError::InvalidArgument`] if the id is malformed or its prefix
    ///   does not belong to the type
    /// - [`MarvinError::DocumentExists`] if the id is already taken
    pub fn import_document(
        &mut self,
        doc_type: &str,
        mut frontmatter: DocumentFrontmatter,
        content: Option<&str>,
    ) -> Result<Document, MarvinError> {
        let reg = self.registration(doc_type)?.clone();

        if !is_valid_id(&frontmatter.id) {
            return Err(MarvinError::InvalidArgument(format!(
                "Invalid document id `{}`",
                frontmatter.id
            )));
        }
        if id_number_for_prefix(&frontmatter.id, &reg.id_prefix).is_none() {
            return Err(MarvinError::InvalidArgument(format!(
                "Document id `{}` does not use prefix `{}` of type `{}`",
                frontmatter.id, reg.id_prefix, doc_type
            )));
        }
        if self.exists(&frontmatter.id)? {
            return Err(MarvinError::DocumentExists(frontmatter.id));
        }

        frontmatter.doc_type = doc_type.to_string();
        if frontmatter.title.is_empty() {
            frontmatter.title = DEFAULT_TITLE.to_string();
        }
        if frontmatter.status.is_empty() {
            frontmatter.status = DEFAULT_STATUS.to_string();
        }
        if frontmatter.created.is_empty() {
            frontmatter.created = now_timestamp();
        }
        if frontmatter.updated.is_empty() {
            frontmatter.updated = frontmatter.created.clone();
        }

        let path = self.path_for_new(&reg, &frontmatter)?;
        let doc = self.write(frontmatter, content.unwrap_or_default(), path)?;
        tracing::info!(id = %doc.frontmatter.id, doc_type, "Imported document");
        Ok(doc)
    }

    /// Apply `patch` to an existing document and refresh `updated`.
    ///
    /// The document is rewritten in place. `content`, when given, replaces
    /// the body.
    pub fn update(
        &mut self,
        id: &str,
        patch: DocumentPatch,
        content: Option<&str>,
    ) -> Result<Document, MarvinError> {
        let existing = self
            .get(id)?
            .ok_or_else(|| MarvinError::DocumentNotFound(id.to_string()))?;

        let mut frontmatter = existing.frontmatter;
        patch.apply(&mut frontmatter);
        frontmatter.updated = now_timestamp();

        let content = content.unwrap_or(&existing.content).to_string();
        let doc = self.write(frontmatter, &content, existing.file_path)?;
        tracing::info!(id, "Updated document");
        Ok(doc)
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn write(
        &mut self,
        frontmatter: DocumentFrontmatter,
        content: &str,
        path: PathBuf,
    ) -> Result<Document, MarvinError> {
        write_document(&path, &frontmatter, content)?;
        self.index.insert(
            frontmatter.id.clone(),
            IndexEntry {
                frontmatter: frontmatter.clone(),
                file_path: path.clone(),
            },
        );
        Ok(Document {
            frontmatter,
            content: content.trim().to_string(),
            file_path: path,
        })
    }

    /// Pick the file path for a document that does not exist yet.
    fn path_for_new(
        &self,
        reg: &DocumentTypeRegistration,
        frontmatter: &DocumentFrontmatter,
    ) -> Result<PathBuf, MarvinError> {
        let dir = self.type_dir(reg);
        if !reg.dated {
            return Ok(dir.join(format!("{}.{}", frontmatter.id, DOCUMENT_EXTENSION)));
        }

        let date = frontmatter
            .created
            .get(..10)
            .filter(|d| chrono::NaiveDate::parse_from_str(d, "%Y-%m-%d").is_ok())
            .map(str::to_string)
            .unwrap_or_else(|| Utc::now().format("%Y-%m-%d").to_string());
        let stem = format!("{}-{}", date, slugify(&frontmatter.title));

        let mut candidate = dir.join(format!("{}.{}", stem, DOCUMENT_EXTENSION));
        let mut n = 1;
        while candidate.exists() {
            candidate = dir.join(format!("{}-{}.{}", stem, n, DOCUMENT_EXTENSION));
            n += 1;
        }
        Ok(candidate)
    }

    fn max_id_number(&self, reg: &DocumentTypeRegistration) -> Result<u64, MarvinError> {
        let files = list_document_files(&self.type_dir(reg))?;
        let mut max = 0;

        for path in &files {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if let Some(n) = file_stem_number(name, &reg.id_prefix) {
                max = max.max(n);
            } else if reg.dated {
                match read_document(path) {
                    Ok(doc) => {
                        if let Some(n) = id_number_for_prefix(&doc.frontmatter.id, &reg.id_prefix)
                        {
                            max = max.max(n);
                        }
                    }
                    Err(e) => tracing::debug!("Ignoring {} for id allocation: {}", path.display(), e),
                }
            }
        }

        tracing::debug!(doc_type = %reg.type_name, max, "Scanned ids for allocation");
        Ok(max)
    }

    fn read_type_dir(&self, reg: &DocumentTypeRegistration) -> Result<Vec<Document>, MarvinError> {
        let mut docs = Vec::new();
        for path in list_document_files(&self.type_dir(reg))? {
            match read_document(&path) {
                Ok(doc) => docs.push(doc),
                Err(MarvinError::InvalidDocument { path, message }) => {
                    tracing::warn!("Skipping unreadable document {}: {}", path.display(), message);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(docs)
    }
}

/// Markdown files directly inside `dir`, sorted by name.
///
/// A missing directory yields an empty list.
pub fn list_document_files(dir: &Path) -> Result<Vec<PathBuf>, MarvinError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_doc = path.is_file()
            && path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e == DOCUMENT_EXTENSION);
        if is_doc {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn check_unique_registrations(
    registrations: &BTreeMap<String, DocumentTypeRegistration>,
) -> Result<(), MarvinError> {
    let mut dirs: HashMap<&str, &str> = HashMap::new();
    let mut prefixes: HashMap<&str, &str> = HashMap::new();

    for reg in registrations.values() {
        if let Some(other) = dirs.insert(&reg.dir_name, &reg.type_name) {
            return Err(MarvinError::InvalidDocumentType {
                type_name: reg.type_name.clone(),
                reason: format!("directory `{}` is already used by `{}`", reg.dir_name, other),
            });
        }
        if let Some(other) = prefixes.insert(&reg.id_prefix, &reg.type_name) {
            return Err(MarvinError::InvalidDocumentType {
                type_name: reg.type_name.clone(),
                reason: format!("id prefix `{}` is already used by `{}`", reg.id_prefix, other),
            });
        }
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

//! Project detection and layout.
//!
//! A [`Project`] is a directory containing `.marvin/`. It ties together the
//! project configuration, the document store and the source manifest:
//!
//! ```text
//! <root>/.marvin/
//!   config.yaml
//!   docs/<type-dir>/...
//!   sources/...
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::ProjectConfig;
use crate::constants::{DOCS_DIR, MARVIN_DIR, SOURCES_DIR};
use crate::errors::MarvinError;
use crate::manifest::{ManifestSummary, SourceManifest};
use crate::store::DocumentStore;

// ============================================================================
// Project
// ============================================================================

/// A resolved Marvin project.
#[derive(Debug, Clone)]
pub struct Project {
    /// Absolute path to the project root.
    root: PathBuf,

    /// `<root>/.marvin`
    marvin_dir: PathBuf,

    config: ProjectConfig,
}

impl Project {
    /// Open the project rooted at `root`.
    ///
    /// # Errors
    ///
    /// - [`MarvinError::PathNotFound`] if `root` does not exist
    /// - [`MarvinError::ProjectNotFound`] if `root` has no `.marvin/`
    /// - [`MarvinError::InvalidProjectConfig`] / [`MarvinError::InvalidDocumentType`]
    ///   for a bad config file
    pub fn open(root: &Path) -> Result<Self, MarvinError> {
        let root = root
            .canonicalize()
            .map_err(|_| MarvinError::PathNotFound(root.display().to_string()))?;

        let marvin_dir = root.join(MARVIN_DIR);
        if !marvin_dir.is_dir() {
            return Err(MarvinError::ProjectNotFound(root.display().to_string()));
        }

        let config = ProjectConfig::load_from_marvin_dir(&marvin_dir)?;
        config.validate()?;

        Ok(Self {
            root,
            marvin_dir,
            config,
        })
    }

    /// Find the project containing `start_dir` by walking up its ancestors.
    ///
    /// The first directory with a `.marvin/` subdirectory wins.
    pub fn discover(start_dir: &Path) -> Result<Self, MarvinError> {
        let start = start_dir
            .canonicalize()
            .map_err(|_| MarvinError::PathNotFound(start_dir.display().to_string()))?;

        let mut current = Some(start.as_path());
        while let Some(dir) = current {
            if dir.join(MARVIN_DIR).is_dir() {
                tracing::debug!(root = %dir.display(), "Found Marvin project");
                return Self::open(dir);
            }
            current = dir.parent();
        }

        Err(MarvinError::ProjectNotFound(start.display().to_string()))
    }

    /// Create the `.marvin/` layout under `root` and write `config`.
    ///
    /// Every registered type directory is created up front so the layout is
    /// visible before the first document exists.
    ///
    /// # Errors
    ///
    /// Returns [`MarvinError::AlreadyInitialized`] if `.marvin/` exists.
    pub fn init(root: &Path, config: ProjectConfig) -> Result<Self, MarvinError> {
        let root = root
            .canonicalize()
            .map_err(|_| MarvinError::PathNotFound(root.display().to_string()))?;
        let marvin_dir = root.join(MARVIN_DIR);
        if marvin_dir.exists() {
            return Err(MarvinError::AlreadyInitialized(root.display().to_string()));
        }

        config.validate()?;
        // Fails on clashes with the built-in types before anything is written.
        let store = DocumentStore::open(marvin_dir.join(DOCS_DIR), config.document_types.clone())?;

        for reg in store.registrations() {
            fs::create_dir_all(store.type_dir(reg))?;
        }
        fs::create_dir_all(marvin_dir.join(SOURCES_DIR))?;
        config.save(&marvin_dir)?;

        tracing::info!(root = %root.display(), name = %config.name, "Initialized Marvin project");
        Ok(Self {
            root,
            marvin_dir,
            config,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn marvin_dir(&self) -> &Path {
        &self.marvin_dir
    }

    pub fn docs_dir(&self) -> PathBuf {
        self.marvin_dir.join(DOCS_DIR)
    }

    /// The intake directory for reference files.
    pub fn sources_dir(&self) -> PathBuf {
        self.marvin_dir.join(SOURCES_DIR)
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    /// Display name, falling back to the root directory name.
    pub fn name(&self) -> String {
        if !self.config.name.is_empty() {
            return self.config.name.clone();
        }
        self.root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Open the document store with the project's registrations.
    pub fn open_store(&self) -> Result<DocumentStore, MarvinError> {
        DocumentStore::open(self.docs_dir(), self.config.document_types.clone())
    }

    /// Open the source manifest of the intake directory.
    pub fn open_manifest(&self) -> SourceManifest {
        SourceManifest::open(self.sources_dir())
    }

    /// Collect document counts and the manifest summary.
    pub fn status(&self) -> Result<ProjectStatus, MarvinError> {
        let store = self.open_store()?;
        Ok(ProjectStatus {
            name: self.name(),
            root: self.root.clone(),
            documents: store.counts()?,
            sources: self.open_manifest().summary(),
        })
    }
}

// ============================================================================
// Status
// ============================================================================

/// Overview reported by `marvin status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStatus {
    pub name: String,
    pub root: PathBuf,
    /// Document count per type name.
    pub documents: BTreeMap<String, usize>,
    pub sources: ManifestSummary,
}

impl ProjectStatus {
    pub fn total_documents(&self) -> usize {
        self.documents.values().sum()
    }
}

//! # marvin-core
//!
//! Document store and import engine for Marvin projects.
//!
//! This crate owns everything with data-integrity rules: typed documents
//! stored as markdown files, identifier allocation, the change-tracking
//! manifest of reference files, and the import pipeline that merges external
//! documents into a project without clobbering existing identifiers. It is
//! designed to be consumed by the `marvin` CLI and other Rust tools.
//!
//! ## Main Types
//!
//! - [`Project`] – a resolved `.marvin/` project on disk
//! - [`DocumentStore`] – directory-backed CRUD with per-type id allocation
//! - [`SourceManifest`] – hash-based tracking of files in the intake directory
//! - [`ImportPlan`] – side-effect-free description of an import
//! - [`MarvinError`] – domain-specific error type
//!
//! ## Modules
//!
//! - [`document`] – document model, frontmatter codec and identifiers
//! - [`store`] – the document store
//! - [`manifest`] – the source manifest
//! - [`import`] – classification, conflict resolution and plan execution
//! - [`config`] – project configuration (`.marvin/config.yaml`)
//! - [`project`] – project detection and layout
//!
//! ## Example
//!
//! ```ignore
//! use marvin_core::{build_import_plan, execute_import_plan, ImportOptions, Project};
//! use std::path::Path;
//!
//! let project = Project::discover(Path::new("."))?;
//! let mut store = project.open_store()?;
//!
//! let options = ImportOptions::default();
//! let plan = build_import_plan(Path::new("../export"), &store, project.marvin_dir(), &options)?;
//! println!("{}", marvin_core::format_plan_summary(&plan));
//! execute_import_plan(&plan, &mut store, project.marvin_dir(), &options)?;
//! ```

// Modules
pub mod config;
pub mod constants;
pub mod document;
pub mod errors;
pub mod import;
pub mod manifest;
pub mod project;
pub mod store;

// Re-exports for convenience
pub use config::ProjectConfig;
pub use constants::{
    DOCS_DIR, MANIFEST_FILENAME, MARVIN_DIR, PROJECT_CONFIG_FILENAME, SOURCES_DIR,
};
pub use document::codec::{parse_document, read_document, serialize_document, write_document};
pub use document::id::{format_id, is_valid_id};
pub use document::{
    builtin_registrations, Document, DocumentFilter, DocumentFrontmatter, DocumentPatch,
    DocumentTypeRegistration,
};
pub use errors::MarvinError;
pub use import::{
    build_import_plan, classify_path, execute_import_plan, format_plan_summary, rewrite_references,
    Classification, ConflictStrategy, ImportOptions, ImportPlan, ImportPlanItem, ImportResult,
};
pub use manifest::{hash_file, ManifestSummary, ScanResult, SourceEntry, SourceManifest, SourceStatus};
pub use project::{Project, ProjectStatus};
pub use store::DocumentStore;

//! Error types for marvin-core.

use std::path::PathBuf;

use thiserror::Error;

/// Domain-specific errors for Marvin operations.
#[derive(Error, Debug)]
pub enum MarvinError {
    // =========================================================================
    // Project Errors
    // =========================================================================
    /// No `.marvin` directory was found at or above the given path.
    #[error("No Marvin project found at or above {0}. Run `marvin init`.")]
    ProjectNotFound(String),

    /// The project is already initialized.
    #[error("Marvin project already initialized at {0}.")]
    AlreadyInitialized(String),

    /// Project configuration is invalid.
    #[error("Project config invalid: {0}")]
    InvalidProjectConfig(String),

    /// A document type registration is malformed or clashes with another one.
    #[error("Invalid document type registration `{type_name}`: {reason}")]
    InvalidDocumentType {
        /// The offending type name.
        type_name: String,
        /// Why the registration was rejected.
        reason: String,
    },

    /// A path or file was not found.
    #[error("Path not found: {0}")]
    PathNotFound(String),

    /// Invalid argument provided to an operation.
    #[error("{0}")]
    InvalidArgument(String),

    // =========================================================================
    // Document Store Errors
    // =========================================================================
    /// The document type is not registered with the store.
    #[error("Unknown document type: {0}")]
    UnknownDocumentType(String),

    /// No document carries the requested identifier.
    #[error("Document {0} not found.")]
    DocumentNotFound(String),

    /// A document with this identifier already exists.
    #[error("Document {0} already exists.")]
    DocumentExists(String),

    /// A document file could not be decoded.
    #[error("Invalid document at `{path}`: {message}")]
    InvalidDocument {
        /// Path to the document file.
        path: PathBuf,
        /// Description of the decoding failure.
        message: String,
    },

    // =========================================================================
    // Source Manifest Errors
    // =========================================================================
    /// The source file is not tracked by the manifest.
    #[error("Source file `{0}` not found in manifest. Run `marvin sources scan` first.")]
    SourceNotFound(String),

    // =========================================================================
    // Wrapped Errors
    // =========================================================================
    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

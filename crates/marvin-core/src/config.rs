//! Project configuration for Marvin.
//!
//! A project keeps its configuration in `.marvin/config.yaml`:
//!
//! ```yaml
//! name: my-project
//! methodology: generic-agile
//! documentTypes:
//!   - type: meeting
//!     dirName: meetings
//!     idPrefix: M
//!     dated: true
//!   - type: report
//!     dirName: reports
//!     idPrefix: R
//! ```
//!
//! `documentTypes` are merged over the built-in decision/action/question
//! registrations when the project's store is opened.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::PROJECT_CONFIG_FILENAME;
use crate::document::DocumentTypeRegistration;
use crate::errors::MarvinError;

/// Per-project configuration stored in `.marvin/config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    /// Display name of the project.
    #[serde(default)]
    pub name: String,

    /// Methodology package the project was created with. Informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub methodology: Option<String>,

    /// Registrations added on top of the built-in types.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub document_types: Vec<DocumentTypeRegistration>,
}

impl ProjectConfig {
    /// Load the configuration of the project whose `.marvin` directory is
    /// `marvin_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`MarvinError::InvalidProjectConfig`] if the file exists but
    /// cannot be parsed.
    pub fn load_from_marvin_dir(marvin_dir: &Path) -> Result<Self, MarvinError> {
        Self::from_path(&Self::config_path(marvin_dir))
    }

    /// Load a configuration file.
    ///
    /// If the file does not exist, returns a default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`MarvinError::InvalidProjectConfig`] if the file exists but
    /// cannot be read or parsed.
    pub fn from_path(path: &Path) -> Result<Self, MarvinError> {
        if !path.exists() {
            tracing::debug!(
                "Project config not found at {}, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            MarvinError::InvalidProjectConfig(format!("Failed to read {}: {}", path.display(), e))
        })?;

        // An empty file parses as YAML null.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&content).map_err(|e| {
            MarvinError::InvalidProjectConfig(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    /// Write the configuration into `marvin_dir`.
    pub fn save(&self, marvin_dir: &Path) -> Result<(), MarvinError> {
        fs::create_dir_all(marvin_dir)?;
        let yaml = serde_yaml::to_string(self)?;
        fs::write(Self::config_path(marvin_dir), yaml)?;
        Ok(())
    }

    /// Path of the config file inside a `.marvin` directory.
    pub fn config_path(marvin_dir: &Path) -> PathBuf {
        marvin_dir.join(PROJECT_CONFIG_FILENAME)
    }

    /// Configuration written by `marvin init`.
    ///
    /// Registers the common project artifact types: meetings (dated file
    /// names), reports, features and epics.
    pub fn default_for_init(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methodology: None,
            document_types: vec![
                DocumentTypeRegistration::new("meeting", "meetings", "M").with_dated_filenames(),
                DocumentTypeRegistration::new("report", "reports", "R"),
                DocumentTypeRegistration::new("feature", "features", "F"),
                DocumentTypeRegistration::new("epic", "epics", "E"),
            ],
        }
    }

    /// Check every registration and reject duplicates within the file.
    ///
    /// Clashes with the built-in types are detected when the store opens.
    pub fn validate(&self) -> Result<(), MarvinError> {
        let mut types = HashSet::new();
        for reg in &self.document_types {
            reg.validate()?;
            if !types.insert(reg.type_name.as_str()) {
                return Err(MarvinError::InvalidDocumentType {
                    type_name: reg.type_name.clone(),
                    reason: "registered more than once".to_string(),
                });
            }
        }
        Ok(())
    }
}

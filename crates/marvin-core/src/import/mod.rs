//! Import of external documents and reference files.
//!
//! Importing is a two-phase workflow:
//!
//! 1. [`build_import_plan`] classifies the input path, collects documents or
//!    raw files, resolves identifier conflicts and rewrites cross-references.
//!    It never writes to disk.
//! 2. [`execute_import_plan`] applies the plan to a [`DocumentStore`] and
//!    copies raw files into the intake directory.
//!
//! [`format_plan_summary`] renders a plan for dry runs.
//!
//! [`DocumentStore`]: crate::store::DocumentStore

pub mod classify;
pub mod engine;
pub mod resolve;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::document::DocumentFrontmatter;
use crate::errors::MarvinError;

pub use classify::{classify_path, Classification, KnownTypes};
pub use engine::{build_import_plan, execute_import_plan, format_plan_summary};
pub use resolve::{
    resolve_conflicts, rewrite_references, IncomingDocument, Resolution, ResolvedDocument,
    SkippedDocument,
};

// ============================================================================
// ConflictStrategy
// ============================================================================

/// What to do when an incoming document's id already exists in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConflictStrategy {
    /// Give the incoming document the next free id of its type.
    #[default]
    Renumber,
    /// Drop the incoming document.
    Skip,
    /// Replace the existing document's metadata and content.
    Overwrite,
}

impl fmt::Display for ConflictStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Renumber => write!(f, "renumber"),
            Self::Skip => write!(f, "skip"),
            Self::Overwrite => write!(f, "overwrite"),
        }
    }
}

impl FromStr for ConflictStrategy {
    type Err = MarvinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "renumber" => Ok(Self::Renumber),
            "skip" => Ok(Self::Skip),
            "overwrite" => Ok(Self::Overwrite),
            other => Err(MarvinError::InvalidArgument(format!(
                "Invalid conflict strategy `{}`. Valid options: renumber, skip, overwrite",
                other
            ))),
        }
    }
}

// ============================================================================
// Options
// ============================================================================

/// Options shared by planning and execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportOptions {
    pub conflict: ConflictStrategy,

    /// Extra tag added to every imported document.
    pub tag: Option<String>,
}

impl ImportOptions {
    pub fn new(conflict: ConflictStrategy) -> Self {
        Self {
            conflict,
            tag: None,
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }
}

// ============================================================================
// Plan
// ============================================================================

/// One action of an import plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ImportPlanItem {
    /// Merge a recognized document into the store.
    #[serde(rename_all = "camelCase")]
    Import {
        source_path: PathBuf,
        doc_type: String,
        original_id: String,
        new_id: String,
        frontmatter: DocumentFrontmatter,
        /// Body with cross-references already rewritten.
        content: String,
    },

    /// Copy a raw file into the intake directory.
    #[serde(rename_all = "camelCase")]
    Copy {
        source_path: PathBuf,
        target_name: String,
    },

    /// Drop a recognized document.
    #[serde(rename_all = "camelCase")]
    Skip {
        source_path: PathBuf,
        original_id: String,
        reason: String,
    },
}

impl ImportPlanItem {
    /// Short action name (`import`, `copy`, `skip`).
    pub fn action(&self) -> &'static str {
        match self {
            Self::Import { .. } => "import",
            Self::Copy { .. } => "copy",
            Self::Skip { .. } => "skip",
        }
    }

    pub fn source_path(&self) -> &PathBuf {
        match self {
            Self::Import { source_path, .. }
            | Self::Copy { source_path, .. }
            | Self::Skip { source_path, .. } => source_path,
        }
    }
}

/// Side-effect-free description of an import.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportPlan {
    pub input_path: PathBuf,
    pub classification: Classification,
    pub items: Vec<ImportPlanItem>,
}

impl ImportPlan {
    /// True when there is nothing to import, copy or report.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn imports(&self) -> impl Iterator<Item = &ImportPlanItem> {
        self.items.iter().filter(|i| matches!(i, ImportPlanItem::Import { .. }))
    }

    pub fn copies(&self) -> impl Iterator<Item = &ImportPlanItem> {
        self.items.iter().filter(|i| matches!(i, ImportPlanItem::Copy { .. }))
    }

    pub fn skips(&self) -> impl Iterator<Item = &ImportPlanItem> {
        self.items.iter().filter(|i| matches!(i, ImportPlanItem::Skip { .. }))
    }
}

/// Outcome of [`execute_import_plan`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    pub imported: usize,
    pub skipped: usize,
    pub copied: usize,
    pub items: Vec<ImportPlanItem>,
}

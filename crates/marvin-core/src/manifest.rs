//! Source manifest for the intake directory.
//!
//! The manifest tracks every reference file (PDF, Markdown, text) dropped
//! into `.marvin/sources/` by content hash, together with its processing
//! status and the documents derived from it. A scan compares the directory
//! against the manifest and reports what was added, changed or removed; a
//! changed hash forces the file back to `pending` so it is ingested again.
//!
//! ## On-Disk Format
//!
//! `sources/.manifest.json`, rewritten wholesale on every mutating call:
//!
//! ```json
//! {
//!   "version": 1,
//!   "files": {
//!     "requirements.pdf": {
//!       "hash": "9f86d0...",
//!       "addedAt": "2024-05-01T10:00:00Z",
//!       "processedAt": null,
//!       "status": "pending",
//!       "artifacts": [],
//!       "error": null
//!     }
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::constants::{is_reference_extension, MANIFEST_FILENAME, MANIFEST_VERSION};
use crate::errors::MarvinError;

// ============================================================================
// SourceStatus
// ============================================================================

/// Processing status of a reference file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceStatus {
    /// Seen by a scan, not yet ingested (or changed since).
    #[default]
    Pending,
    /// Ingestion has started.
    Processing,
    /// Ingestion finished; artifacts are recorded.
    Completed,
    /// Ingestion failed; eligible for retry.
    Error,
}

impl fmt::Display for SourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Processing => write!(f, "processing"),
            Self::Completed => write!(f, "completed"),
            Self::Error => write!(f, "error"),
        }
    }
}

impl FromStr for SourceStatus {
    type Err = MarvinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "error" => Ok(Self::Error),
            other => Err(MarvinError::InvalidArgument(format!(
                "Invalid source status `{}`. Valid options: pending, processing, completed, error",
                other
            ))),
        }
    }
}

// ============================================================================
// SourceEntry
// ============================================================================

/// Manifest record for one reference file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceEntry {
    /// SHA-256 of the file bytes at the last scan (hex).
    pub hash: String,

    /// When a scan first saw this file.
    pub added_at: DateTime<Utc>,

    /// When ingestion last completed.
    pub processed_at: Option<DateTime<Utc>>,

    pub status: SourceStatus,

    /// Identifiers of documents derived from this file.
    #[serde(default)]
    pub artifacts: Vec<String>,

    /// Last ingestion error.
    pub error: Option<String>,
}

impl SourceEntry {
    fn new(hash: String) -> Self {
        Self {
            hash,
            added_at: Utc::now(),
            processed_at: None,
            status: SourceStatus::Pending,
            artifacts: Vec::new(),
            error: None,
        }
    }

    /// Reset to `pending` after a content change.
    fn reset(&mut self, hash: String) {
        self.hash = hash;
        self.status = SourceStatus::Pending;
        self.processed_at = None;
        self.artifacts.clear();
        self.error = None;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ManifestData {
    version: u32,
    #[serde(default)]
    files: BTreeMap<String, SourceEntry>,
}

impl Default for ManifestData {
    fn default() -> Self {
        Self {
            version: MANIFEST_VERSION,
            files: BTreeMap::new(),
        }
    }
}

// ============================================================================
// Scan results and summary
// ============================================================================

/// Outcome of [`SourceManifest::scan`]. Names are sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanResult {
    pub added: Vec<String>,
    pub changed: Vec<String>,
    pub removed: Vec<String>,
}

impl ScanResult {
    /// True when the scan found nothing new.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.changed.is_empty() && self.removed.is_empty()
    }
}

/// Count of manifest entries per status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestSummary {
    pub pending: usize,
    pub processing: usize,
    pub completed: usize,
    pub error: usize,
}

impl ManifestSummary {
    pub fn total(&self) -> usize {
        self.pending + self.processing + self.completed + self.error
    }
}

// ============================================================================
// SourceManifest
// ============================================================================

/// Change-tracking manifest for the intake directory.
#[derive(Debug)]
pub struct SourceManifest {
    sources_dir: PathBuf,
    manifest_path: PathBuf,
    data: ManifestData,
}

impl SourceManifest {
    /// Load the manifest for `sources_dir`.
    ///
    /// A missing, unreadable or corrupt manifest file yields an empty
    /// manifest; corruption is logged, not returned.
    pub fn open(sources_dir: impl Into<PathBuf>) -> Self {
        let sources_dir = sources_dir.into();
        let manifest_path = sources_dir.join(MANIFEST_FILENAME);
        let data = load_manifest(&manifest_path);
        Self {
            sources_dir,
            manifest_path,
            data,
        }
    }

    /// The intake directory.
    pub fn sources_dir(&self) -> &Path {
        &self.sources_dir
    }

    /// Path of the persisted manifest file.
    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    /// Compare the intake directory with the manifest and persist the result.
    pub fn scan(&mut self) -> Result<ScanResult, MarvinError> {
        let mut result = ScanResult::default();
        let on_disk = list_reference_files(&self.sources_dir)?;

        for (name, path) in &on_disk {
            let hash = hash_file(path)?;
            match self.data.files.get_mut(name) {
                None => {
                    tracing::debug!(file = %name, "New source file");
                    self.data.files.insert(name.clone(), SourceEntry::new(hash));
                    result.added.push(name.clone());
                }
                Some(entry) if entry.hash != hash => {
                    tracing::debug!(file = %name, "Source file changed");
                    entry.reset(hash);
                    result.changed.push(name.clone());
                }
                Some(_) => {}
            }
        }

        let removed: Vec<String> = self
            .data
            .files
            .keys()
            .filter(|name| !on_disk.contains_key(*name))
            .cloned()
            .collect();
        for name in &removed {
            tracing::debug!(file = %name, "Source file removed");
            self.data.files.remove(name);
        }
        result.removed = removed;

        self.save()?;
        tracing::info!(
            added = result.added.len(),
            changed = result.changed.len(),
            removed = result.removed.len(),
            "Scanned sources"
        );
        Ok(result)
    }

    /// Entries, optionally restricted to one status.
    pub fn list(&self, status: Option<SourceStatus>) -> Vec<(&str, &SourceEntry)> {
        self.data
            .files
            .iter()
            .filter(|(_, e)| status.map_or(true, |s| e.status == s))
            .map(|(name, e)| (name.as_str(), e))
            .collect()
    }

    /// Entry for one file name.
    pub fn get(&self, name: &str) -> Option<&SourceEntry> {
        self.data.files.get(name)
    }

    /// File names eligible for (re)ingestion: `pending` or `error`.
    pub fn unprocessed(&self) -> Vec<String> {
        self.data
            .files
            .iter()
            .filter(|(_, e)| matches!(e.status, SourceStatus::Pending | SourceStatus::Error))
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Mark a file as being ingested.
    pub fn mark_processing(&mut self, name: &str) -> Result<(), MarvinError> {
        let entry = self.entry_mut(name)?;
        entry.status = SourceStatus::Processing;
        self.save()
    }

    /// Record successful ingestion and the documents it produced.
    pub fn mark_completed(&mut self, name: &str, artifacts: Vec<String>) -> Result<(), MarvinError> {
        let entry = self.entry_mut(name)?;
        entry.status = SourceStatus::Completed;
        entry.processed_at = Some(Utc::now());
        entry.artifacts = artifacts;
        entry.error = None;
        self.save()
    }

    /// Record failed ingestion.
    pub fn mark_error(&mut self, name: &str, message: impl Into<String>) -> Result<(), MarvinError> {
        let entry = self.entry_mut(name)?;
        entry.status = SourceStatus::Error;
        entry.error = Some(message.into());
        self.save()
    }

    /// Count entries per status.
    pub fn summary(&self) -> ManifestSummary {
        let mut summary = ManifestSummary::default();
        for entry in self.data.files.values() {
            match entry.status {
                SourceStatus::Pending => summary.pending += 1,
                SourceStatus::Processing => summary.processing += 1,
                SourceStatus::Completed => summary.completed += 1,
                SourceStatus::Error => summary.error += 1,
            }
        }
        summary
    }

    fn entry_mut(&mut self, name: &str) -> Result<&mut SourceEntry, MarvinError> {
        self.data
            .files
            .get_mut(name)
            .ok_or_else(|| MarvinError::SourceNotFound(name.to_string()))
    }

    fn save(&self) -> Result<(), MarvinError> {
        fs::create_dir_all(&self.sources_dir)?;
        let json = serde_json::to_string_pretty(&self.data)?;
        fs::write(&self.manifest_path, json)?;
        Ok(())
    }
}

fn load_manifest(path: &Path) -> ManifestData {
    if !path.exists() {
        return ManifestData::default();
    }

    let parsed = fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|text| serde_json::from_str::<ManifestData>(&text).map_err(|e| e.to_string()));

    match parsed {
        Ok(data) => data,
        Err(e) => {
            tracing::warn!(
                "Ignoring unreadable source manifest {}: {}",
                path.display(),
                e
            );
            ManifestData::default()
        }
    }
}

/// Reference files directly in `dir`, keyed by file name.
fn list_reference_files(dir: &Path) -> Result<BTreeMap<String, PathBuf>, MarvinError> {
    let mut files = BTreeMap::new();
    if !dir.is_dir() {
        return Ok(files);
    }

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        let tracked = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(is_reference_extension);
        if tracked {
            files.insert(name.to_string(), path.clone());
        }
    }
    Ok(files)
}

/// SHA-256 of a file's bytes as lowercase hex.
pub fn hash_file(path: &Path) -> Result<String, MarvinError> {
    let bytes = fs::read(path)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

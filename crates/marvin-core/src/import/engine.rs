//! Plan construction, execution and rendering for imports.
//!
//! Planning reads the input and the target store but never writes. The plan
//! is a flat list of [`ImportPlanItem`]s: documents to import first, then
//! skipped documents, then raw files to copy.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use super::classify::{
    classify_path, find_marvin_dir, markdown_files, plain_files, read_recognized_document,
    subdirectories, Classification, KnownTypes,
};
use super::resolve::{resolve_conflicts, rewrite_references, IncomingDocument};
use super::{ConflictStrategy, ImportOptions, ImportPlan, ImportPlanItem, ImportResult};
use crate::constants::{is_reference_extension, DOCS_DIR, SOURCES_DIR};
use crate::document::id::id_number_for_prefix;
use crate::document::DocumentPatch;
use crate::errors::MarvinError;
use crate::store::DocumentStore;

// ============================================================================
// Planning
// ============================================================================

/// Build an import plan for `input` against `store`.
///
/// `marvin_dir` is the target project's `.marvin` directory; its intake
/// directory is consulted so planned copies never overwrite existing files.
///
/// # Errors
///
/// Returns [`MarvinError::PathNotFound`] if `input` does not exist, or an
/// error from the store while checking identifiers.
pub fn build_import_plan(
    input: &Path,
    store: &DocumentStore,
    marvin_dir: &Path,
    options: &ImportOptions,
) -> Result<ImportPlan, MarvinError> {
    let known = KnownTypes::from_store(store);
    let classification = classify_path(input, &known)?;

    let collected = collect(input, classification, &known);
    tracing::debug!(
        input = %input.display(),
        %classification,
        documents = collected.documents.len(),
        unreadable = collected.unreadable.len(),
        raw_files = collected.raw_files.len(),
        "Collected import input"
    );

    let mut items = Vec::new();
    let mut skips = Vec::new();

    let (accepted, mismatched) = partition_by_prefix(collected.documents, store);
    skips.extend(mismatched);
    skips.extend(collected.unreadable);

    let resolution = resolve_conflicts(accepted, store, options.conflict)?;
    for doc in resolution.resolved {
        let content = rewrite_references(&doc.content, &resolution.id_mapping);
        items.push(ImportPlanItem::Import {
            source_path: doc.source_path,
            doc_type: doc.frontmatter.doc_type.clone(),
            original_id: doc.original_id,
            new_id: doc.new_id,
            frontmatter: doc.frontmatter,
            content,
        });
    }
    for skipped in resolution.skipped {
        skips.push(ImportPlanItem::Skip {
            source_path: skipped.source_path,
            original_id: skipped.original_id,
            reason: skipped.reason,
        });
    }
    items.extend(skips);

    let intake = marvin_dir.join(SOURCES_DIR);
    let mut planned = HashSet::new();
    for source_path in collected.raw_files {
        let Some(name) = source_path.file_name().and_then(|n| n.to_str()) else {
            tracing::warn!("Skipping file with non UTF-8 name: {}", source_path.display());
            continue;
        };
        let target_name = unique_target_name(&intake, name, &planned);
        planned.insert(target_name.clone());
        items.push(ImportPlanItem::Copy {
            source_path,
            target_name,
        });
    }

    Ok(ImportPlan {
        input_path: input.to_path_buf(),
        classification,
        items,
    })
}

/// Everything gathered from an import input before resolution.
#[derive(Debug, Default)]
struct Collected {
    documents: Vec<IncomingDocument>,
    /// Recognized documents whose frontmatter could not be decoded.
    unreadable: Vec<ImportPlanItem>,
    raw_files: Vec<PathBuf>,
}

impl Collected {
    fn add_document(&mut self, path: &Path, known: &KnownTypes) {
        let Some(recognized) = read_recognized_document(path, known) else {
            return;
        };
        match recognized.parsed {
            Ok((frontmatter, content)) => self.documents.push(IncomingDocument {
                frontmatter,
                content,
                source_path: path.to_path_buf(),
            }),
            Err(e) => {
                tracing::warn!("Cannot decode document {}: {}", path.display(), e);
                self.unreadable.push(ImportPlanItem::Skip {
                    source_path: path.to_path_buf(),
                    original_id: recognized.id,
                    reason: e.to_string(),
                });
            }
        }
    }
}

/// Gather documents and raw files according to the classification.
fn collect(input: &Path, classification: Classification, known: &KnownTypes) -> Collected {
    let mut collected = Collected::default();
    match classification {
        Classification::MarvinProject => collect_project(input, known, &mut collected),
        Classification::DocsDirectory => collect_docs_directory(input, known, &mut collected),
        Classification::MarvinDocument => collected.add_document(input, known),
        Classification::RawSourceFile => collected.raw_files.push(input.to_path_buf()),
        Classification::RawSourceDir => collected.raw_files = plain_files(input),
    }
    collected
}

fn collect_project(input: &Path, known: &KnownTypes, collected: &mut Collected) {
    let Some(marvin_dir) = find_marvin_dir(input) else {
        return;
    };

    let docs_dir = marvin_dir.join(DOCS_DIR);
    for dir in &known.dirs {
        for path in markdown_files(&docs_dir.join(dir)) {
            collected.add_document(&path, known);
        }
    }

    collected.raw_files = plain_files(&marvin_dir.join(SOURCES_DIR))
        .into_iter()
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(is_reference_extension)
        })
        .collect();
}

/// Top-level markdown plus one level of subdirectories.
fn collect_docs_directory(input: &Path, known: &KnownTypes, collected: &mut Collected) {
    let mut files = markdown_files(input);
    for sub in subdirectories(input) {
        files.extend(markdown_files(&sub));
    }
    for path in &files {
        collected.add_document(path, known);
    }
}

/// Split off documents whose id does not carry their type's prefix.
///
/// Such documents cannot be stored under their own id, and renumbering
/// them would silently change their identity.
fn partition_by_prefix(
    documents: Vec<IncomingDocument>,
    store: &DocumentStore,
) -> (Vec<IncomingDocument>, Vec<ImportPlanItem>) {
    let mut accepted = Vec::with_capacity(documents.len());
    let mut rejected = Vec::new();

    for doc in documents {
        let prefix = store
            .registration(&doc.frontmatter.doc_type)
            .map(|reg| reg.id_prefix.clone());
        match prefix {
            Ok(prefix) if id_number_for_prefix(&doc.frontmatter.id, &prefix).is_some() => {
                accepted.push(doc)
            }
            Ok(prefix) => rejected.push(ImportPlanItem::Skip {
                reason: format!(
                    "{} does not use prefix {} of type {}",
                    doc.frontmatter.id, prefix, doc.frontmatter.doc_type
                ),
                original_id: doc.frontmatter.id,
                source_path: doc.source_path,
            }),
            Err(_) => rejected.push(ImportPlanItem::Skip {
                reason: format!("unknown type {}", doc.frontmatter.doc_type),
                original_id: doc.frontmatter.id,
                source_path: doc.source_path,
            }),
        }
    }

    (accepted, rejected)
}

/// Pick a file name free in both `dir` and `planned`.
///
/// `report.pdf` becomes `report-1.pdf`, `report-2.pdf`, ...
fn unique_target_name(dir: &Path, name: &str, planned: &HashSet<String>) -> String {
    let taken = |candidate: &str| planned.contains(candidate) || dir.join(candidate).exists();
    if !taken(name) {
        return name.to_string();
    }

    let path = Path::new(name);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name);
    let ext = path.extension().and_then(|e| e.to_str());

    (1u32..)
        .map(|n| match ext {
            Some(ext) => format!("{}-{}.{}", stem, n, ext),
            None => format!("{}-{}", stem, n),
        })
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| name.to_string())
}

// ============================================================================
// Execution
// ============================================================================

/// Apply a plan to `store`, copying raw files into `<marvin_dir>/sources/`.
///
/// Items are applied in plan order. A failure stops execution; items
/// already applied stay applied.
pub fn execute_import_plan(
    plan: &ImportPlan,
    store: &mut DocumentStore,
    marvin_dir: &Path,
    options: &ImportOptions,
) -> Result<ImportResult, MarvinError> {
    let mut result = ImportResult {
        items: plan.items.clone(),
        ..Default::default()
    };
    let intake = marvin_dir.join(SOURCES_DIR);

    for item in &plan.items {
        match item {
            ImportPlanItem::Skip { .. } => result.skipped += 1,

            ImportPlanItem::Copy {
                source_path,
                target_name,
            } => {
                fs::create_dir_all(&intake)?;
                let target = intake.join(target_name);
                fs::copy(source_path, &target)?;
                tracing::debug!(from = %source_path.display(), to = %target.display(), "Copied source");
                result.copied += 1;
            }

            ImportPlanItem::Import {
                doc_type,
                new_id,
                frontmatter,
                content,
                ..
            } => {
                let mut frontmatter = frontmatter.clone();
                frontmatter.id = new_id.clone();
                if let Some(tag) = &options.tag {
                    frontmatter.add_tag(tag);
                }

                if options.conflict == ConflictStrategy::Overwrite && store.exists(new_id)? {
                    store.update(
                        new_id,
                        DocumentPatch::from_frontmatter(&frontmatter),
                        Some(content),
                    )?;
                } else {
                    store.import_document(doc_type, frontmatter, Some(content))?;
                }
                result.imported += 1;
            }
        }
    }

    tracing::info!(
        imported = result.imported,
        skipped = result.skipped,
        copied = result.copied,
        "Import finished"
    );
    Ok(result)
}

// ============================================================================
// Rendering
// ============================================================================

/// Human-readable summary of a plan, used for dry runs and confirmation.
pub fn format_plan_summary(plan: &ImportPlan) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Import: {}", plan.input_path.display());
    let _ = writeln!(out, "Detected: {}", plan.classification);

    if plan.is_empty() {
        let _ = writeln!(out, "\nNothing to import.");
        return out;
    }

    let imports: Vec<_> = plan.imports().collect();
    if !imports.is_empty() {
        let _ = writeln!(out, "\nDocuments to import ({}):", imports.len());
        for item in imports {
            if let ImportPlanItem::Import {
                original_id,
                new_id,
                frontmatter,
                ..
            } = item
            {
                if original_id == new_id {
                    let _ = writeln!(out, "  {}  {}", new_id, frontmatter.title);
                } else {
                    let _ = writeln!(
                        out,
                        "  {}  {} (was {} \u{2192} {})",
                        new_id, frontmatter.title, original_id, new_id
                    );
                }
            }
        }
    }

    let copies: Vec<_> = plan.copies().collect();
    if !copies.is_empty() {
        let _ = writeln!(out, "\nFiles to copy into sources ({}):", copies.len());
        for item in copies {
            if let ImportPlanItem::Copy {
                source_path,
                target_name,
            } = item
            {
                let source_name = source_path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                if source_name == *target_name {
                    let _ = writeln!(out, "  {}", target_name);
                } else {
                    let _ = writeln!(out, "  {} (as {})", source_name, target_name);
                }
            }
        }
    }

    let skips: Vec<_> = plan.skips().collect();
    if !skips.is_empty() {
        let _ = writeln!(out, "\nSkipped ({}):", skips.len());
        for item in skips {
            if let ImportPlanItem::Skip {
                original_id, reason, ..
            } = item
            {
                let _ = writeln!(out, "  {}  {}", original_id, reason);
            }
        }
    }

    out
}

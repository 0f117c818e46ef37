//! Identifier conflict resolution and cross-reference rewriting.
//!
//! An incoming document conflicts when the target store already holds its
//! id, or when an earlier document of the same batch claimed it. Conflicts
//! are handled by the batch's [`ConflictStrategy`]; everything else passes
//! through with its original id.
//!
//! Renumbering keeps a per-type counter for the whole pass, seeded from the
//! store's next id and skipping ids claimed elsewhere in the batch, so two
//! conflicting documents of one type never receive the same new id.
//!
//! Rewriting is purely textual: every `PREFIX-NNN` token found in a body is
//! looked up in the id mapping, including tokens inside code blocks.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;

use super::ConflictStrategy;
use crate::document::id::{format_id, next_number, split_id};
use crate::document::DocumentFrontmatter;
use crate::errors::MarvinError;
use crate::store::DocumentStore;

/// A document collected for import.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingDocument {
    pub frontmatter: DocumentFrontmatter,
    pub content: String,
    pub source_path: PathBuf,
}

/// A document that will be imported.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedDocument {
    pub original_id: String,
    pub new_id: String,
    /// Incoming frontmatter, still carrying the original id.
    pub frontmatter: DocumentFrontmatter,
    pub content: String,
    pub source_path: PathBuf,
    /// Whether the original id collided with an existing one.
    pub conflicted: bool,
}

/// A document dropped by the skip strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedDocument {
    pub original_id: String,
    pub source_path: PathBuf,
    pub reason: String,
}

/// Output of [`resolve_conflicts`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    pub resolved: Vec<ResolvedDocument>,
    pub skipped: Vec<SkippedDocument>,
    /// Old id → new id for every resolved document, identity included.
    pub id_mapping: BTreeMap<String, String>,
}

/// Resolve identifier conflicts for a batch against `store`.
///
/// Input order is preserved in the output.
pub fn resolve_conflicts(
    incoming: Vec<IncomingDocument>,
    store: &DocumentStore,
    strategy: ConflictStrategy,
) -> Result<Resolution, MarvinError> {
    // First pass: which documents keep their id.
    let mut claimed: HashSet<String> = HashSet::new();
    let mut conflicts = Vec::with_capacity(incoming.len());
    for doc in &incoming {
        let id = &doc.frontmatter.id;
        let conflicted = claimed.contains(id) || store.exists(id)?;
        if !conflicted {
            claimed.insert(id.clone());
        }
        conflicts.push(conflicted);
    }

    let mut allocator = BatchAllocator::new(store);
    let mut resolution = Resolution::default();

    for (doc, conflicted) in incoming.into_iter().zip(conflicts) {
        let original_id = doc.frontmatter.id.clone();

        let new_id = if !conflicted {
            original_id.clone()
        } else {
            match strategy {
                ConflictStrategy::Skip => {
                    tracing::debug!(id = %original_id, "Skipping conflicting document");
                    resolution.skipped.push(SkippedDocument {
                        reason: format!("{} already exists", original_id),
                        original_id,
                        source_path: doc.source_path,
                    });
                    continue;
                }
                ConflictStrategy::Overwrite => original_id.clone(),
                ConflictStrategy::Renumber => {
                    let new_id = allocator.allocate(&doc.frontmatter.doc_type, &mut claimed)?;
                    tracing::debug!(from = %original_id, to = %new_id, "Renumbered document");
                    new_id
                }
            }
        };

        resolution
            .id_mapping
            .entry(original_id.clone())
            .or_insert_with(|| new_id.clone());
        resolution.resolved.push(ResolvedDocument {
            original_id,
            new_id,
            frontmatter: doc.frontmatter,
            content: doc.content,
            source_path: doc.source_path,
            conflicted,
        });
    }

    Ok(resolution)
}

/// Per-type id counters for one resolution pass.
struct BatchAllocator<'a> {
    store: &'a DocumentStore,
    next: HashMap<String, (String, u64)>,
}

impl<'a> BatchAllocator<'a> {
    fn new(store: &'a DocumentStore) -> Self {
        Self {
            store,
            next: HashMap::new(),
        }
    }

    fn allocate(&mut self, doc_type: &str, claimed: &mut HashSet<String>) -> Result<String, MarvinError> {
        if !self.next.contains_key(doc_type) {
            let seed = self.store.next_id(doc_type)?;
            let (prefix, n) = split_id(&seed).ok_or_else(|| {
                MarvinError::InvalidArgument(format!("Unexpected allocated id `{}`", seed))
            })?;
            self.next.insert(doc_type.to_string(), (prefix.to_string(), n));
        }

        let Some((prefix, n)) = self.next.get_mut(doc_type) else {
            return Err(MarvinError::UnknownDocumentType(doc_type.to_string()));
        };
        loop {
            let candidate = format_id(prefix, *n);
            if claimed.insert(candidate.clone()) {
                // Stays at the maximum; the next call then finds it claimed and fails.
                *n = n.saturating_add(1);
                return Ok(candidate);
            }
            *n = next_number(prefix, *n)?;
        }
    }
}

/// Replace identifiers in `content` according to `mapping`.
///
/// Ids missing from the mapping are left untouched.
pub fn rewrite_references(content: &str, mapping: &BTreeMap<String, String>) -> String {
    if mapping.is_empty() {
        return content.to_string();
    }
    crate::document::id::reference_regex()
        .replace_all(content, |caps: &regex::Captures<'_>| {
            let id = &caps[0];
            mapping.get(id).cloned().unwrap_or_else(|| id.to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentPatch;
    use tempfile::TempDir;

    fn incoming(id: &str, doc_type: &str, title: &str) -> IncomingDocument {
        IncomingDocument {
            frontmatter: DocumentFrontmatter::new(id, doc_type, title, "open"),
            content: format!("Body of {}", id),
            source_path: PathBuf::from(format!("/import/{}.md", id)),
        }
    }

    fn store_with_d001(temp: &TempDir) -> DocumentStore {
        let mut store = DocumentStore::open(temp.path().join("docs"), vec![]).unwrap();
        store
            .create("decision", DocumentPatch::new().with_title("Existing"), None)
            .unwrap();
        store
    }

    #[test]
    fn test_skip_strategy() {
        let temp = TempDir::new().unwrap();
        let store = store_with_d001(&temp);

        let res = resolve_conflicts(
            vec![incoming("D-001", "decision", "Incoming")],
            &store,
            ConflictStrategy::Skip,
        )
        .unwrap();

        assert!(res.resolved.is_empty());
        assert_eq!(res.skipped.len(), 1);
        assert_eq!(res.skipped[0].original_id, "D-001");
        assert!(res.id_mapping.is_empty());
    }

    #[test]
    fn test_overwrite_strategy() {
        let temp = TempDir::new().unwrap();
        let store = store_with_d001(&temp);

        let res = resolve_conflicts(
            vec![incoming("D-001", "decision", "Incoming")],
            &store,
            ConflictStrategy::Overwrite,
        )
        .unwrap();

        assert_eq!(res.resolved.len(), 1);
        assert_eq!(res.resolved[0].new_id, "D-001");
        assert_eq!(res.resolved[0].frontmatter.title, "Incoming");
        assert!(res.resolved[0].conflicted);
    }

    #[test]
    fn test_renumber_strategy() {
        let temp = TempDir::new().unwrap();
        let store = store_with_d001(&temp);

        let res = resolve_conflicts(
            vec![incoming("D-001", "decision", "Incoming")],
            &store,
            ConflictStrategy::Renumber,
        )
        .unwrap();

        assert_eq!(res.resolved.len(), 1);
        assert_eq!(res.resolved[0].original_id, "D-001");
        assert_eq!(res.resolved[0].new_id, "D-002");
        assert_eq!(res.id_mapping["D-001"], "D-002");
    }

    #[test]
    fn test_non_conflicting_passes_through() {
        let temp = TempDir::new().unwrap();
        let store = store_with_d001(&temp);

        for strategy in [
            ConflictStrategy::Renumber,
            ConflictStrategy::Skip,
            ConflictStrategy::Overwrite,
        ] {
            let res = resolve_conflicts(vec![incoming("A-007", "action", "New")], &store, strategy)
                .unwrap();
            assert_eq!(res.resolved.len(), 1);
            assert_eq!(res.resolved[0].new_id, "A-007");
            assert!(!res.resolved[0].conflicted);
            assert_eq!(res.id_mapping["A-007"], "A-007");
        }
    }

    #[test]
    fn test_renumber_within_batch_gets_distinct_ids() {
        let temp = TempDir::new().unwrap();
        let store = store_with_d001(&temp);

        let res = resolve_conflicts(
            vec![
                incoming("D-001", "decision", "First"),
                incoming("D-002", "decision", "Keeps id"),
                incoming("D-001", "decision", "Second"),
            ],
            &store,
            ConflictStrategy::Renumber,
        )
        .unwrap();

        let ids: Vec<&str> = res.resolved.iter().map(|r| r.new_id.as_str()).collect();
        assert_eq!(ids, vec!["D-003", "D-002", "D-004"]);
        // First mapping wins for repeated original ids.
        assert_eq!(res.id_mapping["D-001"], "D-003");
        assert_eq!(res.id_mapping["D-002"], "D-002");
    }

    #[test]
    fn test_renumber_stops_at_exhausted_id_space() {
        let temp = TempDir::new().unwrap();
        let store = store_with_d001(&temp);
        std::fs::write(
            temp.path().join(format!("docs/decisions/D-{}.md", u64::MAX - 1)),
            "x",
        )
        .unwrap();

        let res = resolve_conflicts(
            vec![
                incoming("D-001", "decision", "First"),
                incoming("D-001", "decision", "Second"),
            ],
            &store,
            ConflictStrategy::Renumber,
        );
        assert!(matches!(res, Err(MarvinError::InvalidArgument(_))));
    }

    #[test]
    fn test_duplicate_within_batch_is_a_conflict() {
        let temp = TempDir::new().unwrap();
        let store = DocumentStore::open(temp.path().join("docs"), vec![]).unwrap();

        let res = resolve_conflicts(
            vec![
                incoming("Q-001", "question", "One"),
                incoming("Q-001", "question", "Two"),
            ],
            &store,
            ConflictStrategy::Skip,
        )
        .unwrap();

        assert_eq!(res.resolved.len(), 1);
        assert_eq!(res.resolved[0].frontmatter.title, "One");
        assert_eq!(res.skipped.len(), 1);
    }

    #[test]
    fn test_rewrite_references() {
        let mapping: BTreeMap<String, String> = [
            ("D-001".to_string(), "D-010".to_string()),
            ("A-003".to_string(), "A-020".to_string()),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            rewrite_references("See D-001 for context. Related action: A-003.", &mapping),
            "See D-010 for context. Related action: A-020."
        );
        assert_eq!(rewrite_references("Q-005 stays", &mapping), "Q-005 stays");
        assert_eq!(rewrite_references("no ids here", &mapping), "no ids here");
        assert_eq!(
            rewrite_references("See D-001", &BTreeMap::new()),
            "See D-001"
        );
    }

    #[test]
    fn test_rewrite_ids_next_to_word_characters() {
        let mapping: BTreeMap<String, String> =
            [("D-001".to_string(), "D-010".to_string())].into_iter().collect();
        assert_eq!(
            rewrite_references("see D-001_notes and xD-001", &mapping),
            "see D-010_notes and xD-010"
        );
    }

    #[test]
    fn test_rewrite_does_not_chain() {
        let mapping: BTreeMap<String, String> = [
            ("D-001".to_string(), "D-002".to_string()),
            ("D-002".to_string(), "D-003".to_string()),
        ]
        .into_iter()
        .collect();

        assert_eq!(rewrite_references("D-001 then D-002", &mapping), "D-002 then D-003");
    }

    #[test]
    fn test_rewrite_is_textual_inside_code_blocks() {
        let mapping: BTreeMap<String, String> =
            [("D-001".to_string(), "D-009".to_string())].into_iter().collect();
        assert_eq!(
            rewrite_references("```\nref D-001\n```", &mapping),
            "```\nref D-009\n```"
        );
    }
}

//! Resolving two records that claim the same catalog name.
//!
//! The rules run in a fixed order and the first one that applies decides the
//! outcome:
//!
//! 1. a `see below` placeholder loses to anything else,
//! 2. differing breadcrumb trails split the name in two,
//! 3. a `See under preparations below` placeholder loses to anything else,
//! 4. records with identical clinical sections are merged,
//! 5. otherwise the existing record stays and the pair is flagged for review.

pub mod taxonomy;

use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, warn};

use crate::catalog::Catalog;
use crate::record::{DrugRecord, DRUG_SECTIONS, PREPS, SEE_BELOW};

/// Renamed records are re-inserted through the collision path; this bounds
/// how many times a single insert may be renamed.
const MAX_RENAME_DEPTH: usize = 4;

/// A collision that no rule could settle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub name: String,
    pub existing: Option<PathBuf>,
    pub incoming: Option<PathBuf>,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The name was free.
    Inserted,
    /// Same doses; the incoming record added nothing.
    Identical,
    ReplacedSeeBelow,
    DiscardedSeeBelow,
    /// Both records were renamed. `nested` holds any collisions the new names ran into.
    Split {
        names: [String; 2],
        nested: Vec<Resolution>,
    },
    /// One record was renamed after its more general taxonomy label.
    Generalised {
        renamed: String,
        nested: Vec<Resolution>,
    },
    ReplacedPreparations,
    DiscardedPreparations,
    ReplacedSingleDose,
    DiscardedSingleDose,
    MergedDoses,
    Unresolved(Diagnostic),
}

impl Resolution {
    pub fn kind(&self) -> &'static str {
        match self {
            Resolution::Inserted => "inserted",
            Resolution::Identical => "identical",
            Resolution::ReplacedSeeBelow => "replaced_see_below",
            Resolution::DiscardedSeeBelow => "discarded_see_below",
            Resolution::Split { .. } => "split",
            Resolution::Generalised { .. } => "generalised",
            Resolution::ReplacedPreparations => "replaced_preparations",
            Resolution::DiscardedPreparations => "discarded_preparations",
            Resolution::ReplacedSingleDose => "replaced_single_dose",
            Resolution::DiscardedSingleDose => "discarded_single_dose",
            Resolution::MergedDoses => "merged_doses",
            Resolution::Unresolved(_) => "unresolved",
        }
    }

    /// Resolutions of collisions hit while re-inserting renamed records.
    pub fn nested(&self) -> &[Resolution] {
        match self {
            Resolution::Split { nested, .. } | Resolution::Generalised { nested, .. } => nested,
            _ => &[],
        }
    }

    /// Every unresolved collision in this resolution tree.
    pub fn diagnostics(&self) -> Vec<&Diagnostic> {
        match self {
            Resolution::Unresolved(d) => vec![d],
            other => other.nested().iter().flat_map(Resolution::diagnostics).collect(),
        }
    }
}

/// Insert `incoming`, reconciling it against any record already holding its name.
pub fn reconcile(catalog: &mut Catalog, incoming: DrugRecord) -> Resolution {
    insert_at(catalog, incoming, 0)
}

fn insert_at(catalog: &mut Catalog, incoming: DrugRecord, depth: usize) -> Resolution {
    match catalog.take(&incoming.name) {
        None => {
            catalog.put(incoming);
            Resolution::Inserted
        }
        Some(existing) => resolve(catalog, existing, incoming, depth),
    }
}

/// `existing` has already been taken out of the catalog; every branch puts
/// back exactly the records that survive.
fn resolve(
    catalog: &mut Catalog,
    mut existing: DrugRecord,
    incoming: DrugRecord,
    depth: usize,
) -> Resolution {
    if existing.doses == incoming.doses {
        catalog.put(existing);
        return Resolution::Identical;
    }

    if depth >= MAX_RENAME_DEPTH {
        return unresolved(catalog, existing, &incoming, "rename chain too deep");
    }

    if existing.is_sentinel(SEE_BELOW) {
        catalog.put(incoming);
        return Resolution::ReplacedSeeBelow;
    }
    if incoming.is_sentinel(SEE_BELOW) {
        catalog.put(existing);
        return Resolution::DiscardedSeeBelow;
    }

    if let Some(split) = taxonomy::split(&existing, &incoming) {
        let renames_existing = split.existing.is_some();
        let renames_incoming = split.incoming.is_some();
        let (existing, incoming) = split.apply(existing, incoming);
        let [a, b] = [existing.name.clone(), incoming.name.clone()];
        debug!("Split {} / {}", a, b);

        let nested: Vec<Resolution> = [existing, incoming]
            .into_iter()
            .map(|d| insert_at(catalog, d, depth + 1))
            .filter(|r| *r != Resolution::Inserted)
            .collect();

        return match (renames_existing, renames_incoming) {
            (true, true) => Resolution::Split {
                names: [a, b],
                nested,
            },
            (true, false) => Resolution::Generalised { renamed: a, nested },
            _ => Resolution::Generalised { renamed: b, nested },
        };
    }

    if existing.is_sentinel(PREPS) {
        catalog.put(incoming);
        return Resolution::ReplacedPreparations;
    }
    if incoming.is_sentinel(PREPS) {
        catalog.put(existing);
        return Resolution::DiscardedPreparations;
    }

    if content_matches(&existing, &incoming) {
        return match (existing.doses.len(), incoming.doses.len()) {
            (1, n) if n > 1 => {
                catalog.put(incoming);
                Resolution::ReplacedSingleDose
            }
            (n, 1) if n > 1 => {
                catalog.put(existing);
                Resolution::DiscardedSingleDose
            }
            _ => {
                existing.doses.extend(incoming.doses);
                existing.doses.sort();
                existing.doses.dedup();
                catalog.put(existing);
                Resolution::MergedDoses
            }
        };
    }

    unresolved(catalog, existing, &incoming, "no reconciliation rule matched")
}

fn unresolved(
    catalog: &mut Catalog,
    existing: DrugRecord,
    incoming: &DrugRecord,
    reason: &str,
) -> Resolution {
    let diagnostic = Diagnostic {
        name: existing.name.clone(),
        existing: existing.source.clone(),
        incoming: incoming.source.clone(),
        reason: reason.to_string(),
    };
    warn!(
        name = %diagnostic.name,
        existing = ?diagnostic.existing,
        incoming = ?diagnostic.incoming,
        "Unresolved collision: {}", reason
    );
    catalog.put(existing);
    Resolution::Unresolved(diagnostic)
}

/// True when both records carry the same set of comparable sections with
/// identical text.
pub fn content_matches(a: &DrugRecord, b: &DrugRecord) -> bool {
    DRUG_SECTIONS.iter().all(|k| a.section(k) == b.section(k))
}

// ── Tests ──

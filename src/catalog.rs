use std::collections::BTreeMap;

use serde::Serialize;

use crate::reconcile::{self, Resolution};
use crate::record::DrugRecord;

/// Parent drug name → subsection record names, in extraction order.
pub type Subsections = BTreeMap<String, Vec<String>>;

/// Drug records keyed by name. Ordered, so serialisation is stable run to run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Catalog {
    drugs: BTreeMap<String, DrugRecord>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record, reconciling it with any record that already has its name.
    pub fn insert(&mut self, record: DrugRecord) -> Resolution {
        reconcile::reconcile(self, record)
    }

    /// Fold another catalog into this one through the same collision rules.
    pub fn absorb(&mut self, other: Catalog) -> Vec<Resolution> {
        other.into_records().map(|r| self.insert(r)).collect()
    }

    pub fn get(&self, name: &str) -> Option<&DrugRecord> {
        self.drugs.get(name)
    }

    pub fn len(&self) -> usize {
        self.drugs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drugs.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.drugs.keys().map(String::as_str)
    }

    pub fn into_records(self) -> impl Iterator<Item = DrugRecord> {
        self.drugs.into_values()
    }

    /// Copy with provenance paths removed, for external exposure.
    pub fn without_sources(&self) -> Catalog {
        Catalog {
            drugs: self
                .drugs
                .iter()
                .map(|(k, v)| (k.clone(), v.without_source()))
                .collect(),
        }
    }

    /// Overwrite whatever holds `record.name`. Only the reconciler calls this.
    pub(crate) fn put(&mut self, record: DrugRecord) {
        self.drugs.insert(record.name.clone(), record);
    }

    pub(crate) fn take(&mut self, name: &str) -> Option<DrugRecord> {
        self.drugs.remove(name)
    }
}

// ── Tests ──

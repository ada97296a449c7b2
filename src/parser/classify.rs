use std::path::PathBuf;
use std::sync::LazyLock;

use rayon::prelude::*;
use scraper::Selector;
use tracing::warn;

use super::document::{selector, text, Document};

static H2: LazyLock<Selector> = LazyLock::new(|| selector("h2"));

/// A page is a drug monograph when one of its `<h2>`s mentions "Dose".
pub fn is_drug_document(doc: &Document) -> bool {
    doc.query(&H2).iter().any(|h| text(h).contains("Dose"))
}

/// The subset of `paths` that are drug pages, in input order.
pub fn drug_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    paths
        .par_iter()
        .filter(|path| match Document::read(path) {
            Ok(doc) => is_drug_document(&doc),
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                false
            }
        })
        .cloned()
        .collect()
}

// ── Tests ──

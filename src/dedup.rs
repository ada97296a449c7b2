use std::collections::HashMap;
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::parser;
use crate::reconcile::content_matches;
use crate::record::DrugRecord;

/// Drop documents whose content would be merged into an earlier document of
/// the same name. Pages that are not drugs, or fail to parse, pass through.
pub fn filter_duplicates(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut kept: HashMap<String, Vec<DrugRecord>> = HashMap::new();
    let mut out = Vec::with_capacity(paths.len());

    for path in paths {
        match parser::extract(path) {
            Ok(Some(extraction)) => {
                let record = extraction.record;
                let group = kept.entry(record.name.clone()).or_default();
                if group.iter().any(|k| content_matches(k, &record)) {
                    debug!("Duplicate of {}: {}", record.name, path.display());
                    continue;
                }
                group.push(record);
            }
            Ok(None) => {}
            Err(e) => warn!("Keeping unparseable {}: {}", path.display(), e),
        }
        out.push(path.clone());
    }
    out
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const PAGE: &str = r#"<html><body>
<div id="pT"><a>1 Gastro-intestinal system</a></div>
<h1>{name}</h1>
<div class="cAF"><h2>Indications</h2><p>{ind}</p></div>
<div class="cAF"><h2>Dose</h2><p>{dose}</p></div>
</body></html>"#;

    fn page(dir: &std::path::Path, file: &str, name: &str, ind: &str, dose: &str) -> PathBuf {
        let path = dir.join(file);
        let html = PAGE
            .replace("{name}", name)
            .replace("{ind}", ind)
            .replace("{dose}", dose);
        fs::write(&path, html).unwrap();
        path
    }

    #[test]
    fn same_content_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let a = page(dir.path(), "1.htm", "FOO", "colic", "5mg");
        let b = page(dir.path(), "2.htm", "FOO", "colic", "10mg");
        let c = page(dir.path(), "3.htm", "FOO", "spasm", "10mg");
        let d = page(dir.path(), "4.htm", "BAR", "colic", "5mg");
        let kept = filter_duplicates(&[a.clone(), b, c.clone(), d.clone()]);
        assert_eq!(kept, vec![a, c, d]);
    }

    #[test]
    fn non_drugs_and_failures_pass_through() {
        let nondrug = PathBuf::from("tests/fixtures/nondrug.htm");
        let missing = PathBuf::from("tests/fixtures/missing.htm");
        let kept = filter_duplicates(&[nondrug.clone(), missing.clone()]);
        assert_eq!(kept, vec![nondrug, missing]);
    }
}

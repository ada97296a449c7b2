use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use indicatif::ProgressBar;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, Subsections};
use crate::config::Settings;
use crate::error::Result;
use crate::parser::{self, Extraction};
use crate::reconcile::{Diagnostic, Resolution};

/// Counters for one extraction run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub documents: usize,
    pub drugs: usize,
    pub not_drugs: usize,
    pub skipped: usize,
    pub failed: usize,
    pub resolutions: BTreeMap<&'static str, usize>,
}

impl RunStats {
    fn record(&mut self, resolution: &Resolution) {
        *self.resolutions.entry(resolution.kind()).or_default() += 1;
        for nested in resolution.nested() {
            self.record(nested);
        }
    }
}

/// What parsing one path produced, before it touches the catalog.
#[derive(Debug)]
enum Parsed {
    Skipped,
    NotDrug,
    Failed,
    Drug(Extraction),
}

fn parse_one(path: &Path, settings: &Settings) -> Parsed {
    if !path.to_string_lossy().ends_with(&settings.extension) {
        return Parsed::Skipped;
    }
    match parser::extract(path) {
        Ok(Some(extraction)) => Parsed::Drug(extraction),
        Ok(None) => Parsed::NotDrug,
        Err(e) => {
            warn!("Skipping {}: {}", path.display(), e);
            Parsed::Failed
        }
    }
}

/// Everything one run produces.
#[derive(Debug, Clone, Default)]
pub struct Aggregate {
    pub drugs: Catalog,
    pub subsections: Subsections,
    pub review: Vec<Diagnostic>,
    pub stats: RunStats,
}

impl Aggregate {
    fn insert(&mut self, extraction: Extraction) {
        let Extraction { record, parent } = extraction;
        let child = record.name.clone();
        let resolution = self.drugs.insert(record);
        self.stats.record(&resolution);
        self.review.extend(resolution.diagnostics().into_iter().cloned());
        if let Some(parent) = parent {
            self.subsections.entry(parent).or_default().push(child);
        }
    }

    fn fold(&mut self, parsed: Parsed) {
        match parsed {
            Parsed::Skipped => self.stats.skipped += 1,
            Parsed::NotDrug => {
                self.stats.documents += 1;
                self.stats.not_drugs += 1;
            }
            Parsed::Failed => {
                self.stats.documents += 1;
                self.stats.failed += 1;
            }
            Parsed::Drug(extraction) => {
                self.stats.documents += 1;
                self.stats.drugs += 1;
                self.insert(extraction);
            }
        }
    }

    fn full(&self, settings: &Settings) -> bool {
        let full = settings.reached_cap(self.drugs.len());
        if full {
            debug!("Reached cap of {:?} drugs", settings.max_drugs);
        }
        full
    }
}

/// Extract every path, in parallel unless a single worker is configured.
pub fn extract_drugs(paths: Vec<PathBuf>, settings: &Settings, pb: &ProgressBar) -> Result<Aggregate> {
    let workers = settings.worker_count();
    let agg = if workers == 1 {
        extract_sequential(paths, settings, pb)
    } else {
        extract_parallel(&paths, workers, settings, pb)?
    };
    info!(
        drugs = agg.drugs.len(),
        subsections = agg.subsections.len(),
        unresolved = agg.review.len(),
        stats = ?agg.stats,
        "Extraction finished"
    );
    Ok(agg)
}

pub fn extract_sequential<I>(paths: I, settings: &Settings, pb: &ProgressBar) -> Aggregate
where
    I: IntoIterator<Item = PathBuf>,
{
    let mut agg = Aggregate::default();
    for path in paths {
        if agg.full(settings) {
            break;
        }
        pb.inc(1);
        agg.fold(parse_one(&path, settings));
    }
    agg
}

/// Parse on a pool of `workers` threads, then fold the results into one
/// catalog in path order, so the outcome matches a sequential run.
pub fn extract_parallel(
    paths: &[PathBuf],
    workers: usize,
    settings: &Settings,
    pb: &ProgressBar,
) -> Result<Aggregate> {
    let chunk_size = paths.len().div_ceil(workers.max(1)).max(1);
    let pool = rayon::ThreadPoolBuilder::new().num_threads(workers).build()?;
    debug!("{} workers, {} paths per chunk", workers, chunk_size);

    let parsed: Vec<Vec<Parsed>> = pool.install(|| {
        paths
            .par_chunks(chunk_size)
            .map(|chunk| {
                chunk
                    .iter()
                    .map(|path| {
                        pb.inc(1);
                        parse_one(path, settings)
                    })
                    .collect()
            })
            .collect()
    });

    let mut agg = Aggregate::default();
    for result in parsed.into_iter().flatten() {
        if agg.full(settings) {
            break;
        }
        agg.fold(result);
    }
    Ok(agg)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn fixtures(names: &[&str]) -> Vec<PathBuf> {
        names
            .iter()
            .map(|n| Path::new("tests/fixtures").join(format!("{}.htm", n)))
            .collect()
    }

    fn sequential(settings: &Settings, paths: Vec<PathBuf>) -> Aggregate {
        extract_sequential(paths, settings, &ProgressBar::hidden())
    }

    #[test]
    fn atenolol_pages_split_by_taxonomy() {
        let agg = sequential(
            &Settings::default(),
            fixtures(&["atenolol_cardio", "atenolol_thyroid", "nondrug"]),
        );
        assert_eq!(
            agg.drugs.names().collect::<Vec<_>>(),
            vec!["ATENOLOL - BETA-ADRENOCEPTOR BLOCKING DRUGS", "ATENOLOL - THYROID DISORDERS"]
        );
        assert_eq!(agg.stats.documents, 3);
        assert_eq!(agg.stats.drugs, 2);
        assert_eq!(agg.stats.not_drugs, 1);
        assert_eq!(agg.stats.resolutions.get("split"), Some(&1));
    }

    #[test]
    fn subsection_map_is_built() {
        let agg = sequential(&Settings::default(), fixtures(&["aspirin_overdose"]));
        assert_eq!(agg.subsections.get("ASPIRIN"), Some(&vec!["ASPIRIN Overdose".to_string()]));
    }

    #[test]
    fn failures_and_other_extensions_are_skipped() {
        let mut paths = fixtures(&["missing", "tacrolimus_brand"]);
        paths.push(PathBuf::from("tests/fixtures/readme.txt"));
        let agg = sequential(&Settings::default(), paths);
        assert_eq!(agg.stats.failed, 1);
        assert_eq!(agg.stats.skipped, 1);
        assert_eq!(agg.drugs.len(), 1);
    }

    #[test]
    fn cap_halts_extraction() {
        let settings = Settings {
            max_drugs: Some(1),
            ..Default::default()
        };
        let agg = sequential(&settings, fixtures(&["tacrolimus_brand", "interferon_beta"]));
        assert_eq!(agg.drugs.len(), 1);
        assert_eq!(agg.stats.documents, 1);
    }

    #[test]
    fn parallel_matches_sequential() {
        let paths = fixtures(&[
            "atenolol_cardio",
            "tacrolimus_brand",
            "aspirin_overdose",
            "nondrug",
            "interferon_beta",
            "atenolol_thyroid",
        ]);
        let settings = Settings::default();
        let seq = sequential(&settings, paths.clone());
        let par = extract_parallel(&paths, 3, &settings, &ProgressBar::hidden()).unwrap();
        assert_eq!(seq.drugs, par.drugs);
        assert_eq!(seq.subsections, par.subsections);
        assert_eq!(seq.stats, par.stats);
    }

    fn page(dir: &Path, file: &str, name: &str, doses: &[&str]) -> PathBuf {
        let doses: String = doses.iter().map(|d| format!("<p>{}</p>", d)).collect();
        let html = format!(
            r#"<html><body>
<div id="pT"><a>1 Gastro-intestinal system</a></div>
<h1>{}</h1>
<div class="cAF"><h2>Indications</h2><p>colic</p></div>
<div class="cAF"><h2>Dose</h2>{}</div>
</body></html>"#,
            name, doses
        );
        let path = dir.join(file);
        fs::write(&path, html).unwrap();
        path
    }

    #[test]
    fn single_dose_rule_ignores_worker_boundaries() {
        let dir = tempfile::tempdir().unwrap();
        let paths = vec![
            page(dir.path(), "1.htm", "FOO", &["a", "b"]),
            page(dir.path(), "2.htm", "BAR", &["x"]),
            page(dir.path(), "3.htm", "FOO", &["c"]),
            page(dir.path(), "4.htm", "FOO", &["d"]),
        ];
        let settings = Settings::default();
        let seq = sequential(&settings, paths.clone());
        assert_eq!(seq.drugs.get("FOO").unwrap().doses, vec!["a", "b"]);
        for workers in [2, 3, 4] {
            let par = extract_parallel(&paths, workers, &settings, &ProgressBar::hidden()).unwrap();
            assert_eq!(seq.drugs, par.drugs, "{} workers", workers);
            assert_eq!(seq.stats, par.stats, "{} workers", workers);
        }
        assert_eq!(seq.stats.resolutions.get("inserted"), Some(&2));
        assert_eq!(seq.stats.resolutions.get("discarded_single_dose"), Some(&2));
    }

    #[test]
    fn parallel_cap_matches_sequential() {
        let paths = fixtures(&["tacrolimus_brand", "nondrug", "interferon_beta", "aspirin_overdose"]);
        let settings = Settings {
            max_drugs: Some(2),
            ..Default::default()
        };
        let seq = sequential(&settings, paths.clone());
        let par = extract_parallel(&paths, 2, &settings, &ProgressBar::hidden()).unwrap();
        assert_eq!(seq.drugs.len(), 2);
        assert_eq!(seq.drugs, par.drugs);
        assert_eq!(seq.stats, par.stats);
    }

    #[test]
    fn reruns_are_byte_identical() {
        let paths = fixtures(&["atenolol_thyroid", "interferon_beta", "atenolol_cardio"]);
        let settings = Settings::default();
        let a = extract_drugs(paths.clone(), &settings, &ProgressBar::hidden()).unwrap();
        let b = extract_drugs(paths, &settings, &ProgressBar::hidden()).unwrap();
        assert_eq!(
            serde_json::to_string(&a.drugs).unwrap(),
            serde_json::to_string(&b.drugs).unwrap()
        );
    }

    #[test]
    fn empty_input() {
        let agg = extract_parallel(&[], 4, &Settings::default(), &ProgressBar::hidden()).unwrap();
        assert!(agg.drugs.is_empty());
    }
}

use std::path::PathBuf;

use config::Config;
use regex::Regex;
use serde::Deserialize;

use crate::error::Result;

pub const DOC_EXTENSION: &str = ".htm";

/// Run parameters. Built once, then only ever borrowed.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Root of the scraped monograph snapshot.
    pub html_dir: PathBuf,
    /// Stop once the catalog holds this many drugs. `None` parses everything.
    pub max_drugs: Option<usize>,
    /// File-name patterns to skip during the walk.
    pub exclude: Vec<String>,
    /// Worker count for parallel extraction; `None` picks `2 * cores + 1`.
    pub workers: Option<usize>,
    pub extension: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            html_dir: PathBuf::from("bnf-html"),
            max_drugs: None,
            exclude: vec!["alphaindex".to_string()],
            workers: None,
            extension: DOC_EXTENSION.to_string(),
        }
    }
}

impl Settings {
    /// Defaults, then `bnf.toml` if present, then `BNF_*` environment variables.
    pub fn load() -> Result<Self> {
        let settings = Config::builder()
            .add_source(config::File::with_name("bnf").required(false))
            .add_source(
                config::Environment::with_prefix("BNF")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("exclude"),
            )
            .build()?
            .try_deserialize::<Settings>()?;
        Ok(settings)
    }

    pub fn worker_count(&self) -> usize {
        self.workers.filter(|&n| n > 0).unwrap_or_else(|| {
            let cores = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
            cores * 2 + 1
        })
    }

    pub fn exclude_patterns(&self) -> Result<Vec<Regex>> {
        let patterns = self
            .exclude
            .iter()
            .map(|p| Regex::new(p))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(patterns)
    }

    pub fn reached_cap(&self, count: usize) -> bool {
        self.max_drugs.is_some_and(|max| count >= max)
    }
}

// ── Tests ──

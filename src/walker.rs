use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::warn;
use walkdir::WalkDir;

use crate::config::Settings;
use crate::error::{Error, Result};

/// Lazily yield every candidate document under `root`. Output order is
/// whatever the filesystem gives us.
pub fn walk(root: &Path, settings: &Settings) -> Result<impl Iterator<Item = PathBuf>> {
    std::fs::read_dir(root).map_err(|source| Error::CorpusRoot {
        path: root.to_path_buf(),
        source,
    })?;

    let exclude = settings.exclude_patterns()?;
    let extension = settings.extension.clone();

    let paths = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .filter(move |e| is_candidate(&e.file_name().to_string_lossy(), &extension, &exclude))
        .map(|e| e.into_path());

    Ok(paths)
}

fn is_candidate(file_name: &str, extension: &str, exclude: &[Regex]) -> bool {
    file_name.ends_with(extension) && !exclude.iter().any(|re| re.is_match(file_name))
}

// ── Tests ──

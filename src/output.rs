use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::aggregate::Aggregate;
use crate::error::{Error, Result};

pub const CATALOG_FILE: &str = "bnf.json";
pub const SUBSECTIONS_FILE: &str = "subsections.json";
pub const REVIEW_FILE: &str = "review.json";

/// Write the catalog, subsection map and review list into `dir`.
pub fn write_artifacts(dir: &Path, agg: &Aggregate, strip_provenance: bool) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|source| Error::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    if strip_provenance {
        write_json(&dir.join(CATALOG_FILE), &agg.drugs.without_sources())?;
    } else {
        write_json(&dir.join(CATALOG_FILE), &agg.drugs)?;
    }
    write_json(&dir.join(SUBSECTIONS_FILE), &agg.subsections)?;
    write_json(&dir.join(REVIEW_FILE), &agg.review)?;

    info!(
        "Wrote {} drugs, {} subsection parents, {} review items to {}",
        agg.drugs.len(),
        agg.subsections.len(),
        agg.review.len(),
        dir.display()
    );
    Ok(())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let io_err = |source: std::io::Error| Error::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut out = BufWriter::new(File::create(path).map_err(io_err)?);
    serde_json::to_writer_pretty(&mut out, value)?;
    out.write_all(b"\n").map_err(io_err)?;
    out.flush().map_err(io_err)?;
    Ok(())
}

// ── Tests ──

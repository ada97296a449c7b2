use std::path::Path;
use std::sync::LazyLock;

use scraper::{ElementRef, Selector};
use tracing::debug;

use super::classify::is_drug_document;
use super::document::{selector, text, Document};
use crate::error::{Error, Result};
use crate::record::{DrugRecord, PREPS};

static H1: LazyLock<Selector> = LazyLock::new(|| selector("h1"));
static H2: LazyLock<Selector> = LazyLock::new(|| selector("h2"));
static PARA: LazyLock<Selector> = LazyLock::new(|| selector("p"));
static BREADCRUMBS: LazyLock<Selector> = LazyLock::new(|| selector("#pT a"));
static CONTENT_BLOCK: LazyLock<Selector> = LazyLock::new(|| selector("div.cAF"));
static BRAND_DOSE: LazyLock<Selector> = LazyLock::new(|| selector("div.cAY"));

/// A draft record, plus the parent drug when the page is a subsection.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub record: DrugRecord,
    pub parent: Option<String>,
}

/// Parse one file. `Ok(None)` means the page is not a drug monograph.
pub fn extract(path: &Path) -> Result<Option<Extraction>> {
    let doc = Document::read(path)?;
    extract_document(&doc, path)
}

pub fn extract_document(doc: &Document, path: &Path) -> Result<Option<Extraction>> {
    if !is_drug_document(doc) {
        return Ok(None);
    }

    let h1s = doc.query(&H1);
    let heading = h1s
        .first()
        .map(text)
        .ok_or_else(|| Error::MissingName(path.to_path_buf()))?;
    let breadcrumbs: Vec<String> = doc.query(&BREADCRUMBS).iter().map(text).collect();
    let (name, parent) = subsection_name(heading, &breadcrumbs);
    debug!("{} -> {}", path.display(), name);

    let mut drug = DrugRecord::new(name);
    drug.source = Some(path.to_path_buf());
    drug.breadcrumbs = breadcrumbs;

    for block in doc.query(&CONTENT_BLOCK) {
        let Some(title) = block.select(&H2).next().map(|h| text(&h).to_lowercase()) else {
            debug!("Untitled content block in {}", path.display());
            continue;
        };
        if title == "dose" {
            drug.doses.extend(block.select(&PARA).map(|p| text(&p)));
        } else {
            drug.set_section(&title, text(&block));
        }
    }

    apply_brand_names(&mut drug, &h1s);
    Ok(Some(Extraction {
        record: drug,
        parent,
    }))
}

/// A heading that also appears mid-trail is a parent drug; the crumb after it
/// names the subsection.
fn subsection_name(heading: String, breadcrumbs: &[String]) -> (String, Option<String>) {
    match breadcrumbs.iter().position(|b| *b == heading) {
        Some(i) if i + 1 < breadcrumbs.len() => {
            let name = format!("{} {}", heading, breadcrumbs[i + 1]);
            (name, Some(heading))
        }
        _ => (heading, None),
    }
}

/// Brand pages carry extra `<h1>`s naming the proprietary preparation.
fn apply_brand_names(drug: &mut DrugRecord, h1s: &[ElementRef]) {
    if drug.doses.len() == 2 && h1s.len() == 2 {
        if let Some(i) = drug.doses.iter().position(|d| d == PREPS) {
            drug.doses.remove(i);
            drug.doses[0] = format!("Name[{}] {}", text(&h1s[1]), drug.doses[0]);
        }
    }

    if h1s.len() == 3 {
        let brand = &h1s[2];
        let Some(container) = brand.parent().and_then(ElementRef::wrap) else {
            return;
        };
        let dose_text = container
            .select(&BRAND_DOSE)
            .map(|d| text(&d))
            .collect::<Vec<_>>()
            .join("\n");
        drug.doses.retain(|d| !dose_text.contains(d.as_str()));
        drug.doses.push(format!("Name[{}] {}", text(brand), dose_text));
    }
}

// ── Tests ──

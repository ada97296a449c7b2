use std::path::Path;

use scraper::{ElementRef, Html, Selector};

use crate::error::{Error, Result};

/// A parsed monograph page.
pub struct Document {
    html: Html,
}

impl Document {
    pub fn parse(markup: &str) -> Self {
        Document {
            html: Html::parse_document(markup),
        }
    }

    /// Read and parse a file. Snapshot pages are not guaranteed to be UTF-8,
    /// so undecodable bytes are replaced rather than rejected.
    pub fn read(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&String::from_utf8_lossy(&bytes)))
    }

    /// All elements matching `selector`, in document order.
    pub fn query(&self, selector: &Selector) -> Vec<ElementRef<'_>> {
        self.html.select(selector).collect()
    }
}

/// Concatenated text of an element and its descendants, trimmed.
pub fn text(el: &ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Compile a selector literal.
pub(crate) fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap()
}

// ── Tests ──

pub mod classify;
pub mod document;
pub mod extract;

pub use classify::{drug_files, is_drug_document};
pub use document::Document;
pub use extract::{extract, extract_document, Extraction};

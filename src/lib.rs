//! Turn a scraped BNF snapshot into a deduplicated catalog of drug records.
//!
//! Pages are walked ([`walker`]), classified and extracted ([`parser`]), then
//! folded into a [`Catalog`] whose name collisions are settled by the
//! [`reconcile`] rules. [`aggregate`] drives that over a worker pool.

pub mod aggregate;
pub mod catalog;
pub mod config;
pub mod dedup;
pub mod error;
pub mod output;
pub mod parser;
pub mod reconcile;
pub mod record;
pub mod walker;

pub use aggregate::{extract_drugs, Aggregate, RunStats};
pub use catalog::{Catalog, Subsections};
pub use config::Settings;
pub use error::{Error, Result};
pub use record::DrugRecord;

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

pub const SEE_BELOW: &str = "see below";
pub const PREPS: &str = "See under preparations below";

/// Sections compared when deciding whether two same-named records describe
/// the same drug.
pub const DRUG_SECTIONS: &[&str] = &["indications", "cautions", "side-effects", "pregnancy"];

/// One drug (or named variant) as it ends up in the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DrugRecord {
    pub name: String,
    #[serde(rename = "fname", default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
    #[serde(default)]
    pub breadcrumbs: Vec<String>,
    #[serde(default)]
    pub doses: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indications: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cautions: Option<String>,
    #[serde(rename = "side-effects", default, skip_serializing_if = "Option::is_none")]
    pub side_effects: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pregnancy: Option<String>,
    #[serde(rename = "contra-indications", default, skip_serializing_if = "Option::is_none")]
    pub contra_indications: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interactions: Option<String>,
    /// `hepatic impairment`, `renal impairment`, ... keyed by lower-cased heading.
    #[serde(flatten)]
    pub impairments: BTreeMap<String, String>,
}

impl DrugRecord {
    pub fn new(name: impl Into<String>) -> Self {
        DrugRecord {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Store a section body under its lower-cased heading. Returns false when
    /// the heading is not one we keep.
    pub fn set_section(&mut self, heading: &str, text: String) -> bool {
        let slot = match heading {
            "indications" => &mut self.indications,
            "cautions" => &mut self.cautions,
            "side-effects" => &mut self.side_effects,
            "pregnancy" => &mut self.pregnancy,
            "contra-indications" => &mut self.contra_indications,
            "interactions" => &mut self.interactions,
            h if h.contains("impairment") => {
                self.impairments.insert(h.to_string(), text);
                return true;
            }
            _ => return false,
        };
        *slot = Some(text);
        true
    }

    /// Text of one of the [`DRUG_SECTIONS`].
    pub fn section(&self, key: &str) -> Option<&str> {
        match key {
            "indications" => self.indications.as_deref(),
            "cautions" => self.cautions.as_deref(),
            "side-effects" => self.side_effects.as_deref(),
            "pregnancy" => self.pregnancy.as_deref(),
            _ => None,
        }
    }

    pub fn is_sentinel(&self, sentinel: &str) -> bool {
        self.doses.len() == 1 && self.doses[0].eq_ignore_ascii_case(sentinel)
    }

    pub fn renamed(mut self, suffix: &str) -> Self {
        self.name = format!("{} - {}", self.name, suffix);
        self
    }

    /// Copy suitable for external query exposure.
    pub fn without_source(&self) -> Self {
        DrugRecord {
            source: None,
            ..self.clone()
        }
    }
}

// ── Tests ──

use std::sync::LazyLock;

use regex::Regex;

use crate::record::DrugRecord;

static SECTION_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d\.?)+").unwrap());

/// Breadcrumbs without section numbers or the drug's own name, most specific
/// label first, upper-cased.
pub fn taxonomy_path(drug: &DrugRecord) -> Vec<String> {
    let mut labels: Vec<String> = drug
        .breadcrumbs
        .iter()
        .map(|b| SECTION_NUMBER.replace(b, "").trim().to_string())
        .collect();
    if let Some(i) = labels.iter().position(|l| *l == drug.name) {
        labels.remove(i);
    }
    labels.reverse();
    labels.into_iter().map(|l| l.to_uppercase()).collect()
}

/// Name suffixes that tell two same-named drugs apart. `None` keeps the name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub existing: Option<String>,
    pub incoming: Option<String>,
}

impl Split {
    pub fn apply(self, existing: DrugRecord, incoming: DrugRecord) -> (DrugRecord, DrugRecord) {
        let rename = |d: DrugRecord, suffix: Option<String>| match suffix {
            Some(s) => d.renamed(&s),
            None => d,
        };
        (rename(existing, self.existing), rename(incoming, self.incoming))
    }
}

/// Find where the two breadcrumb trails disagree.
pub fn split(existing: &DrugRecord, incoming: &DrugRecord) -> Option<Split> {
    let a = taxonomy_path(existing);
    let b = taxonomy_path(incoming);

    let a_only = a.iter().find(|l| !b.contains(l));
    let b_only = b.iter().find(|l| !a.contains(l));
    if let (Some(x), Some(y)) = (a_only, b_only) {
        return Some(Split {
            existing: Some(x.clone()),
            incoming: Some(y.clone()),
        });
    }

    // Same specific trail, one filed under a more general heading as well.
    if a.len() != b.len() {
        let k = a.len().min(b.len()).saturating_sub(1);
        if k > 0 && a[a.len() - k..] == b[b.len() - k..] {
            return Some(if a.len() > b.len() {
                Split {
                    existing: Some(a[0].clone()),
                    incoming: None,
                }
            } else {
                Split {
                    existing: None,
                    incoming: Some(b[0].clone()),
                }
            });
        }
    }

    None
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn drug(name: &str, crumbs: &[&str]) -> DrugRecord {
        let mut d = DrugRecord::new(name);
        d.breadcrumbs = crumbs.iter().map(|s| s.to_string()).collect();
        d
    }

    #[test]
    fn path_is_cleaned_and_reversed() {
        let d = drug("ASPIRIN", &["2 Cardiovascular system", "2.9 Antiplatelet drugs", "ASPIRIN"]);
        assert_eq!(taxonomy_path(&d), vec!["ANTIPLATELET DRUGS", "CARDIOVASCULAR SYSTEM"]);
    }

    #[test]
    fn disjoint_trails_rename_both() {
        let a = drug("ATENOLOL", &["3 Cardiovascular system", "1 Beta-adrenoceptor blocking drugs"]);
        let b = drug("ATENOLOL", &["5 Endocrine system", "2 Thyroid disorders"]);
        let s = split(&a, &b).unwrap();
        assert_eq!(s.existing.as_deref(), Some("BETA-ADRENOCEPTOR BLOCKING DRUGS"));
        assert_eq!(s.incoming.as_deref(), Some("THYROID DISORDERS"));

        let (a, b) = s.apply(a, b);
        assert_eq!(a.name, "ATENOLOL - BETA-ADRENOCEPTOR BLOCKING DRUGS");
        assert_eq!(b.name, "ATENOLOL - THYROID DISORDERS");
    }

    #[test]
    fn longer_trail_gets_its_first_label() {
        let a = drug("COLESTYRAMINE", &["1 Gastro-intestinal system", "9 Bile acids"]);
        let b = drug(
            "COLESTYRAMINE",
            &["1 Gastro-intestinal system", "9 Bile acids", "2 Pruritus"],
        );
        let s = split(&a, &b).unwrap();
        assert_eq!(s.existing, None);
        assert_eq!(s.incoming.as_deref(), Some("PRURITUS"));
    }

    #[test]
    fn identical_trails_do_not_split() {
        let a = drug("X", &["1 A", "2 B"]);
        let b = drug("X", &["1 A", "2 B"]);
        assert!(split(&a, &b).is_none());
    }

    #[test]
    fn single_label_trail_never_generalises() {
        let a = drug("X", &["1 A"]);
        let b = drug("X", &["1 A", "2 A"]);
        // both cleaned labels are "A"; nothing is unique and k == 0
        assert!(split(&a, &b).is_none());
    }
}

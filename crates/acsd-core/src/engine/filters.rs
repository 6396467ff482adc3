use crate::core::chem::elements::is_metal;
use crate::core::models::entry::Entry;
use std::fmt;

/// A reason to exclude an entry before any structure is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RejectionReason {
    Polymeric,
    Organometallic,
    ContainsMetal,
    NotOrganic,
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Polymeric => "polymeric",
                Self::Organometallic => "organometallic",
                Self::ContainsMetal => "contains metal",
                Self::NotOrganic => "not organic",
            }
        )
    }
}

/// Collects every classification reason that excludes `entry`. An empty result means
/// the entry may be processed.
///
/// Metal content is taken from the declared flag or from any atom whose element is a
/// metal, since database flags are not always reliable for salts.
pub fn classify(entry: &Entry) -> Vec<RejectionReason> {
    let class = &entry.classification;
    let mut reasons = Vec::new();
    if class.is_polymeric {
        reasons.push(RejectionReason::Polymeric);
    }
    if class.is_organometallic {
        reasons.push(RejectionReason::Organometallic);
    }
    if class.contains_metal || entry.atom_elements().any(is_metal) {
        reasons.push(RejectionReason::ContainsMetal);
    }
    if !class.is_organic {
        reasons.push(RejectionReason::NotOrganic);
    }
    reasons
}

/// Joins reasons into the text recorded in the rejection ledger.
pub fn describe(reasons: &[RejectionReason]) -> String {
    reasons
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::entry::{CellParameters, Classification, EntryAtom, EntryComponent};

    fn entry(classification: Classification, elements: &[&str]) -> Entry {
        Entry {
            identifier: "TEST01".to_string(),
            formula: String::new(),
            has_disorder: false,
            cell: CellParameters {
                lengths: [1.0; 3],
                angles: [90.0; 3],
            },
            symmetry_operators: vec![],
            classification,
            components: vec![EntryComponent {
                smiles: None,
                atoms: elements
                    .iter()
                    .enumerate()
                    .map(|(i, e)| EntryAtom::new(i, e, Some([0.0; 3])))
                    .collect(),
                bonds: vec![],
            }],
        }
    }

    #[test]
    fn plain_organic_entry_passes() {
        assert!(classify(&entry(Classification::default(), &["C", "O"])).is_empty());
    }

    #[test]
    fn reasons_accumulate() {
        let class = Classification {
            is_polymeric: true,
            is_organometallic: true,
            contains_metal: false,
            is_organic: false,
        };
        let reasons = classify(&entry(class, &["C", "Fe"]));
        assert_eq!(
            reasons,
            [
                RejectionReason::Polymeric,
                RejectionReason::Organometallic,
                RejectionReason::ContainsMetal,
                RejectionReason::NotOrganic,
            ]
        );
        assert_eq!(
            describe(&reasons),
            "polymeric, organometallic, contains metal, not organic"
        );
    }

    #[test]
    fn metal_atom_rejects_despite_flags() {
        let reasons = classify(&entry(Classification::default(), &["Na", "Cl"]));
        assert_eq!(reasons, [RejectionReason::ContainsMetal]);
    }
}

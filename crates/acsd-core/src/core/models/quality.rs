use crate::core::chem::formula::FormulaError;
use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Coarse description of an atom by its immediate bonding shell.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct AtomEnvironment {
    pub element: String,
    /// Number of bonded atoms that are not hydrogen.
    pub heavy_neighbours: u32,
    pub charge: i32,
    /// Number of hydrogens on the atom, implicit and explicit.
    pub hydrogens: u32,
}

/// A count-preserving multiset of atom environments describing one molecule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentMultiset {
    counts: BTreeMap<AtomEnvironment, u32>,
}

impl EnvironmentMultiset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, environment: AtomEnvironment) {
        *self.counts.entry(environment).or_insert(0) += 1;
    }

    pub fn count(&self, environment: &AtomEnvironment) -> u32 {
        self.counts.get(environment).copied().unwrap_or(0)
    }

    /// Total number of environments, counting repeats.
    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AtomEnvironment, u32)> {
        self.counts.iter().map(|(env, &n)| (env, n))
    }

    /// Per-environment count difference `self - other` over the union of both key sets.
    pub fn difference<'a>(&'a self, other: &'a Self) -> BTreeMap<&'a AtomEnvironment, i64> {
        let mut diff = BTreeMap::new();
        for (env, &n) in &self.counts {
            *diff.entry(env).or_insert(0) += i64::from(n);
        }
        for (env, &n) in &other.counts {
            *diff.entry(env).or_insert(0) -= i64::from(n);
        }
        diff
    }

    /// `true` when every environment occurs equally often in both multisets.
    pub fn matches(&self, other: &Self) -> bool {
        self.difference(other).values().all(|d| *d == 0)
    }
}

impl FromIterator<AtomEnvironment> for EnvironmentMultiset {
    fn from_iter<I: IntoIterator<Item = AtomEnvironment>>(iter: I) -> Self {
        let mut multiset = Self::new();
        for env in iter {
            multiset.add(env);
        }
        multiset
    }
}

#[derive(Serialize)]
struct CountedEnvironment<'a> {
    #[serde(flatten)]
    environment: &'a AtomEnvironment,
    count: u32,
}

impl Serialize for EnvironmentMultiset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.counts.len()))?;
        for (environment, count) in self.iter() {
            seq.serialize_element(&CountedEnvironment { environment, count })?;
        }
        seq.end()
    }
}

/// Outcome of comparing reconstructed molecules with the declared SMILES.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SmilesComparison {
    /// Some component has no declared SMILES, so nothing was compared.
    Unavailable { missing_components: Vec<usize> },
    /// A declared SMILES could not be read.
    Unparseable { component: usize, reason: String },
    Compared {
        unmatched_declared: Vec<EnvironmentMultiset>,
        unmatched_actual: Vec<EnvironmentMultiset>,
    },
}

impl SmilesComparison {
    pub fn is_match(&self) -> bool {
        matches!(self, Self::Compared { unmatched_actual, .. } if unmatched_actual.is_empty())
    }

    pub fn was_compared(&self) -> bool {
        matches!(self, Self::Compared { .. })
    }
}

/// Per-identifier quality flags. Computed once and appended to the ledger as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct QualityFlags {
    pub identifier: String,
    pub has_disorder: bool,
    pub differs_with_hydrogens: bool,
    pub differs_without_hydrogens: bool,
    pub is_charge_zero: bool,
    pub is_multiplicity_one: bool,
    pub smiles: SmilesComparison,
    /// Set when the declared formula could not be read; both formula flags are then `true`.
    pub formula_error: Option<FormulaError>,
}

impl QualityFlags {
    pub fn smiles_match(&self) -> bool {
        self.smiles.is_match()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(element: &str, heavy: u32, hydrogens: u32) -> AtomEnvironment {
        AtomEnvironment {
            element: element.to_string(),
            heavy_neighbours: heavy,
            charge: 0,
            hydrogens,
        }
    }

    #[test]
    fn multiset_counts_repeats() {
        let set: EnvironmentMultiset = [env("C", 1, 3), env("C", 1, 3), env("O", 1, 1)]
            .into_iter()
            .collect();
        assert_eq!(set.count(&env("C", 1, 3)), 2);
        assert_eq!(set.count(&env("N", 1, 3)), 0);
        assert_eq!(set.total(), 3);
    }

    #[test]
    fn difference_covers_keys_of_both_sides() {
        let left: EnvironmentMultiset = [env("C", 1, 3), env("O", 1, 1)].into_iter().collect();
        let right: EnvironmentMultiset = [env("C", 1, 3), env("N", 1, 2)].into_iter().collect();
        let diff = left.difference(&right);
        assert_eq!(diff.len(), 3);
        assert_eq!(diff[&env("O", 1, 1)], 1);
        assert_eq!(diff[&env("N", 1, 2)], -1);
        assert_eq!(diff[&env("C", 1, 3)], 0);
        assert!(!left.matches(&right));
    }

    #[test]
    fn difference_keys_borrow_from_both_multisets() {
        let declared: EnvironmentMultiset = [env("C", 2, 2), env("C", 2, 2)].into_iter().collect();
        let built: EnvironmentMultiset = [env("C", 2, 2), env("C", 1, 3)].into_iter().collect();
        let nonzero: Vec<(&AtomEnvironment, i64)> = declared
            .difference(&built)
            .into_iter()
            .filter(|(_, d)| *d != 0)
            .collect();
        assert_eq!(nonzero, [(&env("C", 1, 3), -1), (&env("C", 2, 2), 1)]);
    }

    #[test]
    fn superset_does_not_match() {
        let small: EnvironmentMultiset = [env("C", 0, 4)].into_iter().collect();
        let large: EnvironmentMultiset = [env("C", 0, 4), env("O", 0, 2)].into_iter().collect();
        assert!(!small.matches(&large));
        assert!(!large.matches(&small));
        assert!(large.matches(&large.clone()));
    }

    #[test]
    fn multiset_serializes_as_counted_list() {
        let set: EnvironmentMultiset = [env("O", 0, 2), env("O", 0, 2)].into_iter().collect();
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(
            json,
            r#"[{"element":"O","heavy_neighbours":0,"charge":0,"hydrogens":2,"count":2}]"#
        );
    }

    #[test]
    fn only_fully_consumed_comparisons_match() {
        let matched = SmilesComparison::Compared {
            unmatched_declared: vec![],
            unmatched_actual: vec![],
        };
        let leftover = SmilesComparison::Compared {
            unmatched_declared: vec![],
            unmatched_actual: vec![EnvironmentMultiset::new()],
        };
        let unavailable = SmilesComparison::Unavailable {
            missing_components: vec![1],
        };
        assert!(matched.is_match());
        assert!(!leftover.is_match());
        assert!(!unavailable.is_match());
        assert!(!unavailable.was_compared());
    }
}

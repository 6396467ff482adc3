use super::atom::Atom;
use super::graph::MoleculeGraph;
use std::collections::BTreeMap;
use thiserror::Error;

/// Per-molecule map from heavy-atom local index to the number of bonded hydrogens that
/// had no coordinates, keyed by molecule name.
pub type HydrogenDeficits = BTreeMap<usize, BTreeMap<usize, u32>>;

/// Total number of missing hydrogens recorded in a deficit map.
pub fn total_deficit(deficits: &HydrogenDeficits) -> u32 {
    deficits.values().flat_map(|m| m.values()).sum()
}

/// Structural violations in entry data. These are never recovered from.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StructureError {
    #[error("Molecule {molecule}: atom index {index} appears more than once")]
    DuplicateAtomIndex { molecule: usize, index: usize },

    #[error(
        "Molecule {molecule}: atom {index} ({element}) has no coordinates and is not a hydrogen isotope"
    )]
    UncoordinatedHeavyAtom {
        molecule: usize,
        index: usize,
        element: String,
    },

    #[error("Molecule {molecule}: atom {index} has unknown element '{element}'")]
    UnknownElement {
        molecule: usize,
        index: usize,
        element: String,
    },

    #[error("Molecule {molecule}: atom {index} is bonded to itself")]
    SelfBond { molecule: usize, index: usize },

    #[error("Molecule {molecule}: bond {a}-{b} is listed more than once")]
    DuplicateBond { molecule: usize, a: usize, b: usize },

    #[error("Molecule {molecule}: bond {a}-{b} connects two atoms without coordinates")]
    BondBetweenUncoordinatedAtoms { molecule: usize, a: usize, b: usize },

    #[error("Molecule {molecule}: bond references atom index {index}, which is not in the component")]
    UnknownBondAtom { molecule: usize, index: usize },

    #[error("Molecule {molecule}: {atoms} atoms but {nodes} graph nodes")]
    AtomCountMismatch {
        molecule: usize,
        atoms: usize,
        nodes: usize,
    },

    #[error("The {container} container has molecule names {found:?}, expected 1..={expected}")]
    NonConsecutiveMolecules {
        container: &'static str,
        found: Vec<usize>,
        expected: usize,
    },

    #[error("Atom container names {atoms:?} differ from graph container names {graphs:?}")]
    MismatchedContainers {
        atoms: Vec<usize>,
        graphs: Vec<usize>,
    },
}

/// The coordinated atoms of one molecule, in the order they appear in the entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Molecule {
    pub atoms: Vec<Atom>,
}

impl Molecule {
    pub fn new(atoms: Vec<Atom>) -> Self {
        Self { atoms }
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }
}

/// Parallel atom and graph containers keyed by molecule name.
///
/// Well-formed sets have names exactly `1..=N` in both containers. Use
/// [`MoleculeSet::validate`] to enforce this before consuming a set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoleculeSet {
    molecules: BTreeMap<usize, Molecule>,
    graphs: BTreeMap<usize, MoleculeGraph>,
}

impl MoleculeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(
        molecules: BTreeMap<usize, Molecule>,
        graphs: BTreeMap<usize, MoleculeGraph>,
    ) -> Self {
        Self { molecules, graphs }
    }

    pub fn insert(&mut self, name: usize, molecule: Molecule, graph: MoleculeGraph) {
        self.molecules.insert(name, molecule);
        self.graphs.insert(name, graph);
    }

    pub fn len(&self) -> usize {
        self.molecules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.molecules.is_empty()
    }

    pub fn molecule(&self, name: usize) -> Option<&Molecule> {
        self.molecules.get(&name)
    }

    pub fn graph(&self, name: usize) -> Option<&MoleculeGraph> {
        self.graphs.get(&name)
    }

    pub fn get_mut(&mut self, name: usize) -> Option<(&mut Molecule, &mut MoleculeGraph)> {
        match (self.molecules.get_mut(&name), self.graphs.get_mut(&name)) {
            (Some(m), Some(g)) => Some((m, g)),
            _ => None,
        }
    }

    /// Iterates `(name, molecule, graph)` for names present in both containers.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Molecule, &MoleculeGraph)> {
        self.molecules
            .iter()
            .filter_map(|(&name, m)| self.graphs.get(&name).map(|g| (name, m, g)))
    }

    /// Checks the naming and size invariants and returns the number of molecules.
    pub fn validate(&self) -> Result<usize, StructureError> {
        let atom_names: Vec<usize> = self.molecules.keys().copied().collect();
        let graph_names: Vec<usize> = self.graphs.keys().copied().collect();

        check_consecutive("atoms", &atom_names)?;
        check_consecutive("graphs", &graph_names)?;
        if atom_names != graph_names {
            return Err(StructureError::MismatchedContainers {
                atoms: atom_names,
                graphs: graph_names,
            });
        }

        for (name, molecule, graph) in self.iter() {
            if molecule.len() != graph.node_count() {
                return Err(StructureError::AtomCountMismatch {
                    molecule: name,
                    atoms: molecule.len(),
                    nodes: graph.node_count(),
                });
            }
        }
        Ok(atom_names.len())
    }
}

fn check_consecutive(container: &'static str, names: &[usize]) -> Result<(), StructureError> {
    let expected = names.len();
    if names.iter().copied().eq(1..=expected) {
        Ok(())
    } else {
        Err(StructureError::NonConsecutiveMolecules {
            container,
            found: names.to_vec(),
            expected,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::AtomAttributes;
    use nalgebra::Point3;

    fn single_atom_parts() -> (Molecule, MoleculeGraph) {
        let molecule = Molecule::new(vec![Atom::new("O", Point3::origin())]);
        let mut graph = MoleculeGraph::new();
        graph.add_node(AtomAttributes {
            element: "O".to_string(),
            ..Default::default()
        });
        (molecule, graph)
    }

    #[test]
    fn validate_accepts_consecutive_matching_names() {
        let mut set = MoleculeSet::new();
        for name in 1..=3 {
            let (m, g) = single_atom_parts();
            set.insert(name, m, g);
        }
        assert_eq!(set.validate(), Ok(3));
    }

    #[test]
    fn validate_accepts_empty_set() {
        assert_eq!(MoleculeSet::new().validate(), Ok(0));
    }

    #[test]
    fn validate_rejects_gap_in_names() {
        let mut set = MoleculeSet::new();
        for name in [1, 3] {
            let (m, g) = single_atom_parts();
            set.insert(name, m, g);
        }
        assert!(matches!(
            set.validate(),
            Err(StructureError::NonConsecutiveMolecules {
                container: "atoms",
                ..
            })
        ));
    }

    #[test]
    fn validate_rejects_zero_based_names() {
        let mut set = MoleculeSet::new();
        let (m, g) = single_atom_parts();
        set.insert(0, m, g);
        assert!(set.validate().is_err());
    }

    #[test]
    fn validate_rejects_mismatched_containers() {
        let (m1, g1) = single_atom_parts();
        let (m2, _) = single_atom_parts();
        let molecules = BTreeMap::from([(1, m1), (2, m2)]);
        let graphs = BTreeMap::from([(1, g1)]);
        let set = MoleculeSet::from_parts(molecules, graphs);
        assert!(matches!(
            set.validate(),
            Err(StructureError::MismatchedContainers { .. })
        ));
    }

    #[test]
    fn validate_rejects_atom_node_count_mismatch() {
        let (mut m, g) = single_atom_parts();
        m.atoms.push(Atom::new("H", Point3::new(0.9, 0.0, 0.0)));
        let mut set = MoleculeSet::new();
        set.insert(1, m, g);
        assert_eq!(
            set.validate(),
            Err(StructureError::AtomCountMismatch {
                molecule: 1,
                atoms: 2,
                nodes: 1
            })
        );
    }

    #[test]
    fn total_deficit_sums_all_molecules() {
        let mut deficits = HydrogenDeficits::new();
        deficits.entry(1).or_default().insert(0, 2);
        deficits.entry(2).or_default().insert(3, 1);
        assert_eq!(total_deficit(&deficits), 3);
    }
}

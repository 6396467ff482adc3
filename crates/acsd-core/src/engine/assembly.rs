use crate::core::models::crystal::{CellError, Crystal, CrystalGraph, CrystalNode, UnitCell};
use crate::core::models::entry::CellParameters;
use crate::core::models::molecule::{HydrogenDeficits, Molecule, MoleculeSet, StructureError};
use crate::core::models::symmetry::{SymmetryError, SymmetryOperator};
use nalgebra::Vector3;
use thiserror::Error;
use tracing::debug;

/// Two copies of a molecule closer than this (Angstroms, per atom) are the same copy.
pub const DEFAULT_DUPLICATE_TOLERANCE: f64 = 0.01;

#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("Invalid unit cell: {0}")]
    Cell(#[from] CellError),
    #[error("Invalid symmetry operator: {0}")]
    Symmetry(#[from] SymmetryError),
    #[error("Inconsistent molecules: {0}")]
    Structure(#[from] StructureError),
}

/// Everything needed to expand the asymmetric unit into a crystal.
#[derive(Debug, Clone, Copy)]
pub struct AssemblyRequest<'a> {
    pub molecules: &'a MoleculeSet,
    /// Attached to the crystal nodes when present; `None` for a final assembly.
    pub deficits: Option<&'a HydrogenDeficits>,
    pub cell: &'a CellParameters,
    /// Operators in text form; an empty list means identity only.
    pub symmetry_operators: &'a [String],
}

/// Builds the periodic crystal from molecules, cell and symmetry.
pub trait CrystalAssembler: Send + Sync {
    fn assemble(&self, request: &AssemblyRequest<'_>) -> Result<Crystal, AssemblyError>;
}

/// Applies every symmetry operator to every molecule and keeps whole molecules inside the
/// cell.
///
/// Each copy is shifted by whole lattice vectors so its fractional centroid lies in
/// `[0, 1)`. Copies that land on an already placed copy of the same molecule, as happens
/// for molecules on special positions, are dropped.
#[derive(Debug, Clone)]
pub struct SymmetryCrystalAssembler {
    duplicate_tolerance: f64,
}

impl Default for SymmetryCrystalAssembler {
    fn default() -> Self {
        Self {
            duplicate_tolerance: DEFAULT_DUPLICATE_TOLERANCE,
        }
    }
}

impl SymmetryCrystalAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tolerance(duplicate_tolerance: f64) -> Self {
        Self {
            duplicate_tolerance,
        }
    }

    fn coincides(
        &self,
        cell: &UnitCell,
        molecule: &Molecule,
        placed: &[Vector3<f64>],
        candidate: &[Vector3<f64>],
    ) -> bool {
        candidate.iter().enumerate().all(|(i, c)| {
            placed.iter().enumerate().any(|(j, p)| {
                molecule.atoms[i].element == molecule.atoms[j].element
                    && minimum_image_distance(cell, p, c) < self.duplicate_tolerance
            })
        })
    }
}

impl CrystalAssembler for SymmetryCrystalAssembler {
    fn assemble(&self, request: &AssemblyRequest<'_>) -> Result<Crystal, AssemblyError> {
        request.molecules.validate()?;
        let cell = UnitCell::from_parameters(request.cell.lengths, request.cell.angles)?;
        let operators = if request.symmetry_operators.is_empty() {
            vec![SymmetryOperator::identity()]
        } else {
            request
                .symmetry_operators
                .iter()
                .map(|text| text.parse::<SymmetryOperator>())
                .collect::<Result<Vec<_>, _>>()?
        };

        let mut atoms = Vec::new();
        let mut graph = CrystalGraph::new();

        for (name, molecule, molecule_graph) in request.molecules.iter() {
            if molecule.is_empty() {
                continue;
            }
            let fractional: Vec<Vector3<f64>> = molecule
                .atoms
                .iter()
                .map(|a| cell.to_fractional(&a.position))
                .collect();
            let sites = request.deficits.and_then(|d| d.get(&name));
            let mut placed: Vec<Vec<Vector3<f64>>> = Vec::new();

            for (op_index, operator) in operators.iter().enumerate() {
                let mut copy: Vec<Vector3<f64>> =
                    fractional.iter().map(|f| operator.apply(f)).collect();
                let centroid =
                    copy.iter().fold(Vector3::zeros(), |acc, f| acc + f) / copy.len() as f64;
                let shift = centroid.map(|c| -c.floor());
                for f in &mut copy {
                    *f += shift;
                }

                if placed
                    .iter()
                    .any(|p| self.coincides(&cell, molecule, p, &copy))
                {
                    debug!(
                        "Molecule {} under operator '{}' duplicates an existing copy",
                        name, operator
                    );
                    continue;
                }

                graph.absorb(molecule_graph, |index, attributes| CrystalNode {
                    molecule: name,
                    symmetry_operator: op_index,
                    source_index: index,
                    attributes: attributes.clone(),
                    missing_hydrogens: sites.and_then(|s| s.get(&index).copied()),
                });
                for (atom, f) in molecule.atoms.iter().zip(&copy) {
                    let mut placed_atom = atom.clone();
                    placed_atom.position = cell.to_cartesian(f);
                    atoms.push(placed_atom);
                }
                placed.push(copy);
            }
        }

        debug!(
            "Assembled crystal with {} atoms from {} operators",
            atoms.len(),
            operators.len()
        );
        Ok(Crystal { cell, atoms, graph })
    }
}

fn minimum_image_distance(cell: &UnitCell, a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    let delta = (a - b).map(|d| d - d.round());
    (cell.matrix() * delta).norm()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::{Atom, AtomAttributes};
    use crate::core::models::graph::MoleculeGraph;
    use crate::core::models::topology::{BondAttributes, BondType};
    use nalgebra::Point3;
    use std::collections::BTreeMap;

    const EPS: f64 = 1e-9;

    fn diatomic(a: Point3<f64>, b: Point3<f64>) -> MoleculeSet {
        let molecule = Molecule::new(vec![Atom::new("C", a), Atom::new("O", b)]);
        let mut graph = MoleculeGraph::new();
        for element in ["C", "O"] {
            graph.add_node(AtomAttributes {
                element: element.to_string(),
                ..Default::default()
            });
        }
        graph
            .add_edge(0, 1, BondAttributes::new(BondType::Double))
            .unwrap();
        let mut set = MoleculeSet::new();
        set.insert(1, molecule, graph);
        set
    }

    fn cubic() -> CellParameters {
        CellParameters {
            lengths: [10.0, 10.0, 10.0],
            angles: [90.0, 90.0, 90.0],
        }
    }

    fn ops(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn identity_only_reproduces_the_molecule() {
        let set = diatomic(Point3::new(1.0, 1.0, 1.0), Point3::new(2.2, 1.0, 1.0));
        let cell = cubic();
        let crystal = SymmetryCrystalAssembler::new()
            .assemble(&AssemblyRequest {
                molecules: &set,
                deficits: None,
                cell: &cell,
                symmetry_operators: &[],
            })
            .unwrap();

        assert_eq!(crystal.len(), 2);
        assert_eq!(crystal.graph.edge_count(), 1);
        assert!((crystal.atoms[1].position - Point3::new(2.2, 1.0, 1.0)).norm() < EPS);
        assert!(!crystal.has_hydrogen_deficits());
    }

    #[test]
    fn inversion_copy_is_wrapped_into_the_cell() {
        let set = diatomic(Point3::new(1.0, 1.0, 1.0), Point3::new(2.2, 1.0, 1.0));
        let cell = cubic();
        let operators = ops(&["x,y,z", "-x,-y,-z"]);
        let crystal = SymmetryCrystalAssembler::new()
            .assemble(&AssemblyRequest {
                molecules: &set,
                deficits: None,
                cell: &cell,
                symmetry_operators: &operators,
            })
            .unwrap();

        assert_eq!(crystal.len(), 4);
        assert_eq!(crystal.graph.edge_count(), 2);
        assert!(crystal.graph.contains_edge(2, 3));
        assert!((crystal.atoms[2].position - Point3::new(9.0, 9.0, 9.0)).norm() < 1e-6);
        assert!((crystal.atoms[3].position - Point3::new(7.8, 9.0, 9.0)).norm() < 1e-6);
        let node = crystal.graph.node(3).unwrap();
        assert_eq!(node.symmetry_operator, 1);
        assert_eq!(node.source_index, 1);
        assert_eq!(node.molecule, 1);
    }

    #[test]
    fn copies_on_special_positions_are_dropped() {
        // The centroid sits on the inversion centre at the cell origin.
        let set = diatomic(Point3::new(-0.6, 0.0, 0.0), Point3::new(0.6, 0.0, 0.0));
        let cell = cubic();
        let operators = ops(&["x,y,z", "-x,-y,-z"]);
        let crystal = SymmetryCrystalAssembler::new()
            .assemble(&AssemblyRequest {
                molecules: &set,
                deficits: None,
                cell: &cell,
                symmetry_operators: &operators,
            })
            .unwrap();
        // Inversion swaps C and O, so this copy is distinct.
        assert_eq!(crystal.len(), 4);

        let mut symmetric = diatomic(Point3::new(-0.6, 0.0, 0.0), Point3::new(0.6, 0.0, 0.0));
        if let Some((molecule, graph)) = symmetric.get_mut(1) {
            molecule.atoms[0].element = "O".to_string();
            graph.node_mut(0).unwrap().element = "O".to_string();
        }
        let crystal = SymmetryCrystalAssembler::new()
            .assemble(&AssemblyRequest {
                molecules: &symmetric,
                deficits: None,
                cell: &cell,
                symmetry_operators: &operators,
            })
            .unwrap();
        assert_eq!(crystal.len(), 2);
    }

    #[test]
    fn deficits_are_attached_to_source_atoms() {
        let set = diatomic(Point3::new(1.0, 1.0, 1.0), Point3::new(2.2, 1.0, 1.0));
        let cell = cubic();
        let deficits = HydrogenDeficits::from([(1, BTreeMap::from([(1, 2)]))]);
        let crystal = SymmetryCrystalAssembler::new()
            .assemble(&AssemblyRequest {
                molecules: &set,
                deficits: Some(&deficits),
                cell: &cell,
                symmetry_operators: &[],
            })
            .unwrap();
        assert_eq!(crystal.graph.node(0).unwrap().missing_hydrogens, None);
        assert_eq!(crystal.graph.node(1).unwrap().missing_hydrogens, Some(2));
        assert!(crystal.has_hydrogen_deficits());
    }

    #[test]
    fn invalid_inputs_are_reported() {
        let set = diatomic(Point3::origin(), Point3::new(1.2, 0.0, 0.0));
        let bad_cell = CellParameters {
            lengths: [0.0, 1.0, 1.0],
            angles: [90.0, 90.0, 90.0],
        };
        let result = SymmetryCrystalAssembler::new().assemble(&AssemblyRequest {
            molecules: &set,
            deficits: None,
            cell: &bad_cell,
            symmetry_operators: &[],
        });
        assert!(matches!(result, Err(AssemblyError::Cell(_))));

        let cell = cubic();
        let operators = ops(&["x,y"]);
        let result = SymmetryCrystalAssembler::new().assemble(&AssemblyRequest {
            molecules: &set,
            deficits: None,
            cell: &cell,
            symmetry_operators: &operators,
        });
        assert!(matches!(result, Err(AssemblyError::Symmetry(_))));
    }
}

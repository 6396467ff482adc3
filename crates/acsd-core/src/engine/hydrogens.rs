use crate::core::chem::elements::xh_bond_length;
use crate::core::models::atom::{Atom, AtomAttributes, Hybridisation};
use crate::core::models::graph::GraphError;
use crate::core::models::molecule::{HydrogenDeficits, MoleculeSet};
use crate::core::models::topology::{BondAttributes, BondType};
use crate::core::utils::geometry::{Geometry, place_hydrogens};
use nalgebra::Point3;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImputationError {
    #[error("Hydrogen deficits refer to molecule {molecule}, which does not exist")]
    UnknownMolecule { molecule: usize },
    #[error("Hydrogen deficits refer to atom {index} of molecule {molecule}, which does not exist")]
    UnknownAtom { molecule: usize, index: usize },
    #[error("Failed to bond imputed hydrogen in molecule {molecule}: {source}")]
    Graph { molecule: usize, source: GraphError },
}

/// A heavy atom whose missing hydrogens could not be placed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedSite {
    pub molecule: usize,
    pub atom: usize,
    pub element: String,
    pub missing: u32,
    /// Number of coordinated neighbours the atom already had.
    pub neighbours: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Imputation {
    pub molecules: MoleculeSet,
    /// Number of hydrogens created.
    pub added: usize,
    pub unresolved: Vec<UnresolvedSite>,
}

/// Fills in hydrogens that the entry lists without coordinates.
pub trait HydrogenImputer: Send + Sync {
    fn impute(
        &self,
        molecules: MoleculeSet,
        deficits: &HydrogenDeficits,
    ) -> Result<Imputation, ImputationError>;
}

/// Leaves the molecules untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHydrogenImputer;

impl HydrogenImputer for NoHydrogenImputer {
    fn impute(
        &self,
        molecules: MoleculeSet,
        _deficits: &HydrogenDeficits,
    ) -> Result<Imputation, ImputationError> {
        Ok(Imputation {
            molecules,
            added: 0,
            unresolved: Vec::new(),
        })
    }
}

/// Places hydrogens at ideal geometry around each deficient heavy atom, using
/// element-specific X-H bond lengths. New atoms are appended to their molecule and
/// flagged as added.
///
/// The geometry comes from the atom's recorded hybridisation when there is one, and
/// from its total coordination (known neighbours plus missing hydrogens) otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeometricHydrogenImputer;

impl HydrogenImputer for GeometricHydrogenImputer {
    fn impute(
        &self,
        mut molecules: MoleculeSet,
        deficits: &HydrogenDeficits,
    ) -> Result<Imputation, ImputationError> {
        let mut added = 0;
        let mut unresolved = Vec::new();

        for (&name, sites) in deficits {
            let (molecule, graph) = molecules
                .get_mut(name)
                .ok_or(ImputationError::UnknownMolecule { molecule: name })?;

            for (&index, &missing) in sites {
                let base = molecule
                    .atoms
                    .get(index)
                    .ok_or(ImputationError::UnknownAtom {
                        molecule: name,
                        index,
                    })?;
                let base_pos = base.position;
                let element = base.element.clone();
                let hybridisation = graph
                    .node(index)
                    .map_or(Hybridisation::Unknown, |n| n.hybridisation);
                let neighbors: Vec<Point3<f64>> = graph
                    .neighbors(index)
                    .filter_map(|n| molecule.atoms.get(n).map(|a| a.position))
                    .collect();

                let Some(positions) =
                    target_geometry(hybridisation, neighbors.len() + missing as usize).and_then(
                        |geometry| {
                            place_hydrogens(
                                &base_pos,
                                &neighbors,
                                missing as usize,
                                geometry,
                                xh_bond_length(&element),
                            )
                        },
                    )
                else {
                    unresolved.push(UnresolvedSite {
                        molecule: name,
                        atom: index,
                        element,
                        missing,
                        neighbours: neighbors.len(),
                    });
                    continue;
                };

                for position in positions {
                    molecule.atoms.push(Atom::new("H", position));
                    let node = graph.add_node(AtomAttributes {
                        element: "H".to_string(),
                        added_or_modified: true,
                        ..Default::default()
                    });
                    graph
                        .add_edge(index, node, BondAttributes::new(BondType::Single))
                        .map_err(|source| ImputationError::Graph {
                            molecule: name,
                            source,
                        })?;
                    added += 1;
                }
            }
        }

        Ok(Imputation {
            molecules,
            added,
            unresolved,
        })
    }
}

fn target_geometry(hybridisation: Hybridisation, coordination: usize) -> Option<Geometry> {
    match hybridisation {
        Hybridisation::Sp3 => Some(Geometry::Tetrahedral),
        Hybridisation::Sp2 => Some(Geometry::Trigonal),
        Hybridisation::Sp => Some(Geometry::Linear),
        _ => Geometry::for_coordination(coordination),
    }
}

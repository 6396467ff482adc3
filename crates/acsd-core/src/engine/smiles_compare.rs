//! Coarse structural comparison of reconstructed molecules with declared SMILES.
//!
//! Each molecule is reduced to the multiset of its heavy-atom environments (element,
//! heavy-neighbour count, charge, hydrogen count). Two molecules match when their
//! multisets are equal. Connectivity beyond the first neighbour shell is not checked, so
//! for example two constitutional isomers that share every atom environment compare
//! equal.

use crate::core::chem::smiles::{SmilesAtom, SmilesGraph, parse_smiles};
use crate::core::models::graph::MoleculeGraph;
use crate::core::models::molecule::{Molecule, MoleculeSet, StructureError};
use crate::core::models::quality::{AtomEnvironment, EnvironmentMultiset, SmilesComparison};

/// Environments of the heavy atoms of a parsed SMILES, counting implicit and explicit
/// hydrogens alike.
pub fn environments_from_smiles(smiles: &SmilesGraph) -> EnvironmentMultiset {
    smiles
        .atoms()
        .filter(|(_, atom)| !atom.is_hydrogen())
        .map(|(index, atom)| {
            let mut heavy_neighbours = 0;
            let mut hydrogens = atom.implicit_hydrogens;
            for n in smiles.neighbors(index) {
                if smiles.atom(n).is_some_and(SmilesAtom::is_hydrogen) {
                    hydrogens += 1;
                } else {
                    heavy_neighbours += 1;
                }
            }
            AtomEnvironment {
                element: atom.element.clone(),
                heavy_neighbours,
                charge: atom.charge,
                hydrogens,
            }
        })
        .collect()
}

/// Environments of the heavy atoms of a reconstructed molecule. Only hydrogens present
/// as bonded atoms are counted.
pub fn environments_from_molecule(molecule: &Molecule, graph: &MoleculeGraph) -> EnvironmentMultiset {
    graph
        .nodes()
        .filter(|(_, attrs)| !attrs.is_hydrogen())
        .map(|(index, attrs)| {
            let mut heavy_neighbours = 0;
            let mut hydrogens = 0;
            for n in graph.neighbors(index) {
                match graph.node(n) {
                    Some(neighbour) if neighbour.is_hydrogen() => hydrogens += 1,
                    _ => heavy_neighbours += 1,
                }
            }
            let charge = molecule
                .atoms
                .get(index)
                .map_or(0, |a| a.formal_charge.round() as i32);
            AtomEnvironment {
                element: attrs.element.clone(),
                heavy_neighbours,
                charge,
                hydrogens,
            }
        })
        .collect()
}

/// Pairs each declared multiset with the first still-unclaimed actual multiset equal to
/// it. Returns the declared and the actual multisets left without a partner.
///
/// Because pairing requires exact equality, the number of leftovers on each side does
/// not depend on the order of either list.
pub fn greedy_match(
    declared: Vec<EnvironmentMultiset>,
    actual: Vec<EnvironmentMultiset>,
) -> (Vec<EnvironmentMultiset>, Vec<EnvironmentMultiset>) {
    let mut remaining = actual;
    let mut unmatched_declared = Vec::new();
    for expected in declared {
        match remaining.iter().position(|candidate| candidate.matches(&expected)) {
            Some(position) => {
                remaining.remove(position);
            }
            None => unmatched_declared.push(expected),
        }
    }
    (unmatched_declared, remaining)
}

/// Compares the molecules of an entry with the SMILES declared for its components.
///
/// A component without SMILES, or a SMILES that cannot be read, gives a "cannot compare"
/// outcome rather than an error.
///
/// # Errors
///
/// Returns [`StructureError`] when `molecules` violates the naming invariants.
pub fn compare_with_smiles(
    molecules: &MoleculeSet,
    declared: &[Option<String>],
) -> Result<SmilesComparison, StructureError> {
    molecules.validate()?;

    let missing_components: Vec<usize> = declared
        .iter()
        .enumerate()
        .filter(|(_, smiles)| smiles.as_deref().is_none_or(|s| s.trim().is_empty()))
        .map(|(index, _)| index + 1)
        .collect();
    if !missing_components.is_empty() {
        return Ok(SmilesComparison::Unavailable { missing_components });
    }

    let mut declared_sets = Vec::with_capacity(declared.len());
    for (index, smiles) in declared.iter().flatten().enumerate() {
        match parse_smiles(smiles.trim()) {
            Ok(graph) => declared_sets.push(environments_from_smiles(&graph)),
            Err(e) => {
                return Ok(SmilesComparison::Unparseable {
                    component: index + 1,
                    reason: e.to_string(),
                });
            }
        }
    }

    let actual_sets = molecules
        .iter()
        .map(|(_, molecule, graph)| environments_from_molecule(molecule, graph))
        .collect();

    let (unmatched_declared, unmatched_actual) = greedy_match(declared_sets, actual_sets);
    Ok(SmilesComparison::Compared {
        unmatched_declared,
        unmatched_actual,
    })
}

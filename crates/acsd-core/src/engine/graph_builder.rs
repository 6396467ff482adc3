use crate::core::chem::elements::{is_hydrogen_isotope, is_known_element, normalize_hydrogen_isotope};
use crate::core::models::atom::{Atom, AtomAttributes};
use crate::core::models::entry::{EntryBond, EntryComponent};
use crate::core::models::graph::MoleculeGraph;
use crate::core::models::molecule::{HydrogenDeficits, Molecule, MoleculeSet, StructureError};
use crate::core::models::topology::{BondAttributes, canonical_pair};
use nalgebra::Point3;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

/// The molecules of one entry, ready for assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltMolecules {
    /// Atoms and graphs keyed by molecule name `1..=N`, in component order.
    pub molecules: MoleculeSet,
    /// Hydrogens that the entry bonds to a heavy atom but gives no coordinates for.
    pub deficits: HydrogenDeficits,
    pub contains_deuterium: bool,
    pub contains_tritium: bool,
}

struct ComponentGraph {
    molecule: Molecule,
    graph: MoleculeGraph,
    deficits: BTreeMap<usize, u32>,
    contains_deuterium: bool,
    contains_tritium: bool,
}

/// Converts raw entry components into molecule graphs.
///
/// Components become molecules `1..=N` in encounter order. Inside a molecule, coordinated
/// atoms are relabelled to a dense `0..k` index space following the component's atom
/// order. Hydrogens without coordinates never become nodes; each bond to one is tallied
/// against its coordinated partner in the deficit map instead.
///
/// # Errors
///
/// Returns a [`StructureError`] for any record the pipeline cannot represent: repeated
/// atom indices, a heavy atom without coordinates, unknown elements, self-bonds,
/// duplicate bonds (in either orientation), bonds between two uncoordinated atoms and
/// bonds to atoms missing from the component.
pub fn build_molecules(components: &[EntryComponent]) -> Result<BuiltMolecules, StructureError> {
    let mut molecules = MoleculeSet::new();
    let mut deficits = HydrogenDeficits::new();
    let mut contains_deuterium = false;
    let mut contains_tritium = false;

    for (position, component) in components.iter().enumerate() {
        let name = position + 1;
        let built = build_component(name, component)?;
        debug!(
            "Molecule {}: {} atoms, {} bonds, {} hydrogens without coordinates",
            name,
            built.molecule.len(),
            built.graph.edge_count(),
            built.deficits.values().sum::<u32>()
        );

        contains_deuterium |= built.contains_deuterium;
        contains_tritium |= built.contains_tritium;
        if !built.deficits.is_empty() {
            deficits.insert(name, built.deficits);
        }
        molecules.insert(name, built.molecule, built.graph);
    }

    molecules.validate()?;
    Ok(BuiltMolecules {
        molecules,
        deficits,
        contains_deuterium,
        contains_tritium,
    })
}

fn build_component(name: usize, component: &EntryComponent) -> Result<ComponentGraph, StructureError> {
    // === Phase 1: Atoms ===
    let mut seen_atoms = HashSet::new();
    let mut local_index: HashMap<usize, usize> = HashMap::new();
    let mut uncoordinated_hydrogens: HashSet<usize> = HashSet::new();
    let mut atoms = Vec::new();
    let mut graph = MoleculeGraph::new();
    let mut contains_deuterium = false;
    let mut contains_tritium = false;

    for entry_atom in &component.atoms {
        if !seen_atoms.insert(entry_atom.index) {
            return Err(StructureError::DuplicateAtomIndex {
                molecule: name,
                index: entry_atom.index,
            });
        }

        let Some([x, y, z]) = entry_atom.position else {
            if is_hydrogen_isotope(&entry_atom.element) {
                uncoordinated_hydrogens.insert(entry_atom.index);
                continue;
            }
            return Err(StructureError::UncoordinatedHeavyAtom {
                molecule: name,
                index: entry_atom.index,
                element: entry_atom.element.clone(),
            });
        };

        let (element, isotope_mass) = normalize_hydrogen_isotope(&entry_atom.element);
        if !is_known_element(element) {
            return Err(StructureError::UnknownElement {
                molecule: name,
                index: entry_atom.index,
                element: entry_atom.element.clone(),
            });
        }
        match entry_atom.element.as_str() {
            "D" => contains_deuterium = true,
            "T" => contains_tritium = true,
            _ => {}
        }

        local_index.insert(entry_atom.index, atoms.len());
        atoms.push(Atom {
            element: element.to_string(),
            position: Point3::new(x, y, z),
            formal_charge: entry_atom.formal_charge,
            magnetic_moment: entry_atom.magnetic_moment,
            isotope_mass,
        });
        graph.add_node(AtomAttributes {
            element: element.to_string(),
            is_h_donor: entry_atom.is_h_donor,
            is_h_acceptor: entry_atom.is_h_acceptor,
            is_spiro_atom: entry_atom.is_spiro,
            ring_count: entry_atom.ring_count,
            hybridisation: entry_atom.hybridisation,
            added_or_modified: false,
        });
    }

    // === Phase 2: Bonds ===
    let mut seen_bonds = HashSet::new();
    let mut deficits: BTreeMap<usize, u32> = BTreeMap::new();
    let lookup = |index: usize| {
        local_index
            .get(&index)
            .copied()
            .ok_or(StructureError::UnknownBondAtom {
                molecule: name,
                index,
            })
    };

    for bond in &component.bonds {
        let [first, second] = bond.atoms;
        if first == second {
            return Err(StructureError::SelfBond {
                molecule: name,
                index: first,
            });
        }
        let (a, b) = canonical_pair(first, second);
        if !seen_bonds.insert((a, b)) {
            return Err(StructureError::DuplicateBond { molecule: name, a, b });
        }

        match (
            uncoordinated_hydrogens.contains(&a),
            uncoordinated_hydrogens.contains(&b),
        ) {
            (true, true) => {
                return Err(StructureError::BondBetweenUncoordinatedAtoms {
                    molecule: name,
                    a,
                    b,
                });
            }
            (true, false) => *deficits.entry(lookup(b)?).or_insert(0) += 1,
            (false, true) => *deficits.entry(lookup(a)?).or_insert(0) += 1,
            (false, false) => {
                let (la, lb) = (lookup(a)?, lookup(b)?);
                graph
                    .add_edge(la, lb, bond_attributes(bond))
                    .map_err(|_| StructureError::DuplicateBond { molecule: name, a, b })?;
            }
        }
    }

    Ok(ComponentGraph {
        molecule: Molecule::new(atoms),
        graph,
        deficits,
        contains_deuterium,
        contains_tritium,
    })
}

fn bond_attributes(bond: &EntryBond) -> BondAttributes {
    BondAttributes {
        bond_type: bond.bond_type,
        sybyl_type: bond
            .sybyl_type
            .clone()
            .unwrap_or_else(|| bond.bond_type.sybyl_code().to_string()),
        is_conjugated: bond.is_conjugated,
        is_cyclic: bond.is_cyclic,
        ring_count: bond.ring_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chem::elements::DEUTERIUM_MASS;
    use crate::core::models::entry::EntryAtom;
    use crate::core::models::topology::BondType;

    fn atom(index: usize, element: &str, x: f64) -> EntryAtom {
        EntryAtom::new(index, element, Some([x, 0.0, 0.0]))
    }

    fn hidden(index: usize, element: &str) -> EntryAtom {
        EntryAtom::new(index, element, None)
    }

    fn single(a: usize, b: usize) -> EntryBond {
        EntryBond::new(a, b, BondType::Single)
    }

    fn component(atoms: Vec<EntryAtom>, bonds: Vec<EntryBond>) -> EntryComponent {
        EntryComponent {
            smiles: None,
            atoms,
            bonds,
        }
    }

    fn ethanol_missing_hydroxyl_h() -> EntryComponent {
        component(
            vec![
                atom(11, "C", 0.0),
                atom(4, "C", 1.5),
                atom(27, "O", 2.9),
                hidden(30, "H"),
            ],
            vec![single(4, 11), single(27, 4), single(30, 27)],
        )
    }

    #[test]
    fn relabels_atoms_densely_in_native_order() {
        let built = build_molecules(&[ethanol_missing_hydroxyl_h()]).unwrap();
        let graph = built.molecules.graph(1).unwrap();
        let molecule = built.molecules.molecule(1).unwrap();

        assert_eq!(graph.node_count(), 3);
        let elements: Vec<_> = molecule.atoms.iter().map(|a| a.element.as_str()).collect();
        assert_eq!(elements, ["C", "C", "O"]);
        assert!(graph.contains_edge(0, 1));
        assert!(graph.contains_edge(1, 2));
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn hidden_hydrogen_becomes_a_deficit_not_an_edge() {
        let built = build_molecules(&[ethanol_missing_hydroxyl_h()]).unwrap();
        assert_eq!(built.deficits.len(), 1);
        assert_eq!(built.deficits[&1], BTreeMap::from([(2, 1)]));
    }

    #[test]
    fn components_are_named_consecutively() {
        let water = component(vec![atom(1, "O", 0.0)], vec![]);
        let built =
            build_molecules(&[ethanol_missing_hydroxyl_h(), water.clone(), water]).unwrap();
        assert_eq!(built.molecules.validate().unwrap(), 3);
        assert_eq!(built.molecules.molecule(3).unwrap().len(), 1);
    }

    #[test]
    fn duplicate_bond_in_reverse_orientation_is_rejected() {
        let c = component(
            vec![atom(1, "C", 0.0), atom(2, "C", 1.5)],
            vec![single(1, 2), single(2, 1)],
        );
        assert_eq!(
            build_molecules(&[c]).unwrap_err(),
            StructureError::DuplicateBond {
                molecule: 1,
                a: 1,
                b: 2
            }
        );
    }

    #[test]
    fn duplicate_bond_to_hidden_hydrogen_is_rejected() {
        let c = component(
            vec![atom(1, "O", 0.0), hidden(2, "H")],
            vec![single(1, 2), single(2, 1)],
        );
        assert!(matches!(
            build_molecules(&[c]),
            Err(StructureError::DuplicateBond { .. })
        ));
    }

    #[test]
    fn self_bond_is_rejected() {
        let c = component(vec![atom(5, "C", 0.0)], vec![single(5, 5)]);
        assert_eq!(
            build_molecules(&[c]).unwrap_err(),
            StructureError::SelfBond {
                molecule: 1,
                index: 5
            }
        );
    }

    #[test]
    fn uncoordinated_heavy_atom_is_fatal() {
        let c = component(vec![atom(1, "C", 0.0), hidden(2, "N")], vec![]);
        assert!(matches!(
            build_molecules(&[c]),
            Err(StructureError::UncoordinatedHeavyAtom { index: 2, .. })
        ));
    }

    #[test]
    fn bond_between_two_hidden_atoms_is_fatal() {
        let c = component(
            vec![atom(1, "C", 0.0), hidden(2, "H"), hidden(3, "D")],
            vec![single(2, 3)],
        );
        assert!(matches!(
            build_molecules(&[c]),
            Err(StructureError::BondBetweenUncoordinatedAtoms { a: 2, b: 3, .. })
        ));
    }

    #[test]
    fn bond_to_unlisted_atom_is_fatal() {
        let c = component(vec![atom(1, "C", 0.0)], vec![single(1, 99)]);
        assert!(matches!(
            build_molecules(&[c]),
            Err(StructureError::UnknownBondAtom { index: 99, .. })
        ));
    }

    #[test]
    fn repeated_atom_index_is_fatal() {
        let c = component(vec![atom(1, "C", 0.0), atom(1, "O", 1.0)], vec![]);
        assert!(matches!(
            build_molecules(&[c]),
            Err(StructureError::DuplicateAtomIndex { index: 1, .. })
        ));
    }

    #[test]
    fn deuterium_is_stored_as_hydrogen_with_isotope_mass() {
        let c = component(vec![atom(1, "O", 0.0), atom(2, "D", 0.96)], vec![single(1, 2)]);
        let built = build_molecules(&[c]).unwrap();
        let deuteron = &built.molecules.molecule(1).unwrap().atoms[1];

        assert_eq!(deuteron.element, "H");
        assert_eq!(deuteron.isotope_mass, Some(DEUTERIUM_MASS));
        assert!(built.contains_deuterium);
        assert!(!built.contains_tritium);
        assert_eq!(
            built.molecules.graph(1).unwrap().node(1).unwrap().element,
            "H"
        );
    }

    #[test]
    fn bond_attributes_fall_back_to_derived_sybyl_code() {
        let mut aromatic = EntryBond::new(1, 2, BondType::Aromatic);
        aromatic.is_cyclic = true;
        aromatic.ring_count = 1;
        let c = component(vec![atom(1, "C", 0.0), atom(2, "C", 1.4)], vec![aromatic]);
        let built = build_molecules(&[c]).unwrap();
        let edge = built.molecules.graph(1).unwrap().edge(0, 1).unwrap();
        assert_eq!(edge.sybyl_type, "ar");
        assert!(edge.is_cyclic);
        assert_eq!(edge.ring_count, 1);
    }

    #[test]
    fn empty_entry_builds_no_molecules() {
        let built = build_molecules(&[]).unwrap();
        assert!(built.molecules.is_empty());
        assert!(built.deficits.is_empty());
    }
}

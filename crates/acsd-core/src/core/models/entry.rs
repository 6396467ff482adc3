use super::atom::Hybridisation;
use super::topology::BondType;
use serde::{Deserialize, Serialize};

/// A crystal structure record as delivered by an entry provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub identifier: String,
    /// Declared chemical formula, e.g. `"C10 H8 N2 O2,2(H2 O1)"`.
    #[serde(default)]
    pub formula: String,
    #[serde(default)]
    pub has_disorder: bool,
    pub cell: CellParameters,
    #[serde(default)]
    pub symmetry_operators: Vec<String>,
    #[serde(default)]
    pub classification: Classification,
    pub components: Vec<EntryComponent>,
}

impl Entry {
    /// Whether at least one atom of any component has a position.
    pub fn has_coordinates(&self) -> bool {
        self.components
            .iter()
            .flat_map(|c| &c.atoms)
            .any(|a| a.position.is_some())
    }

    /// The declared SMILES of each component, in component order.
    pub fn declared_smiles(&self) -> Vec<Option<String>> {
        self.components.iter().map(|c| c.smiles.clone()).collect()
    }

    pub fn atom_elements(&self) -> impl Iterator<Item = &str> {
        self.components
            .iter()
            .flat_map(|c| &c.atoms)
            .map(|a| a.element.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellParameters {
    /// Cell lengths a, b, c in Angstroms.
    pub lengths: [f64; 3],
    /// Cell angles alpha, beta, gamma in degrees.
    pub angles: [f64; 3],
}

/// Database-side classification used to screen entries before any graph work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Classification {
    pub is_polymeric: bool,
    pub is_organometallic: bool,
    pub contains_metal: bool,
    pub is_organic: bool,
}

impl Default for Classification {
    fn default() -> Self {
        Self {
            is_polymeric: false,
            is_organometallic: false,
            contains_metal: false,
            is_organic: true,
        }
    }
}

/// One connected molecular unit of an entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryComponent {
    #[serde(default)]
    pub smiles: Option<String>,
    pub atoms: Vec<EntryAtom>,
    #[serde(default)]
    pub bonds: Vec<EntryBond>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryAtom {
    /// Database atom index. Not assumed to be contiguous or molecule-local.
    pub index: usize,
    pub element: String,
    #[serde(default)]
    pub position: Option<[f64; 3]>,
    #[serde(default)]
    pub formal_charge: f64,
    #[serde(default)]
    pub magnetic_moment: f64,
    #[serde(default)]
    pub is_h_donor: bool,
    #[serde(default)]
    pub is_h_acceptor: bool,
    #[serde(default)]
    pub is_spiro: bool,
    #[serde(default)]
    pub ring_count: u32,
    #[serde(default)]
    pub hybridisation: Hybridisation,
}

impl EntryAtom {
    /// A bare atom with default attributes, mostly useful for building fixtures.
    pub fn new(index: usize, element: &str, position: Option<[f64; 3]>) -> Self {
        Self {
            index,
            element: element.to_string(),
            position,
            formal_charge: 0.0,
            magnetic_moment: 0.0,
            is_h_donor: false,
            is_h_acceptor: false,
            is_spiro: false,
            ring_count: 0,
            hybridisation: Hybridisation::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryBond {
    /// Database indices of the two bonded atoms.
    pub atoms: [usize; 2],
    #[serde(default)]
    pub bond_type: BondType,
    /// SYBYL code supplied by the database; derived from `bond_type` when absent.
    #[serde(default)]
    pub sybyl_type: Option<String>,
    #[serde(default)]
    pub is_conjugated: bool,
    #[serde(default)]
    pub is_cyclic: bool,
    #[serde(default)]
    pub ring_count: u32,
}

impl EntryBond {
    pub fn new(a: usize, b: usize, bond_type: BondType) -> Self {
        Self {
            atoms: [a, b],
            bond_type,
            sybyl_type: None,
            is_conjugated: false,
            is_cyclic: false,
            ring_count: 0,
        }
    }
}

use super::atom::{Atom, AtomAttributes};
use super::graph::AttributedGraph;
use crate::core::chem::formula::ElementCounts;
use nalgebra::{Matrix3, Point3, Vector3};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CellError {
    #[error("Cell lengths must be positive, got {0:?}")]
    NonPositiveLength([f64; 3]),
    #[error("Cell angles {0:?} do not describe a valid parallelepiped")]
    DegenerateAngles([f64; 3]),
}

/// A periodic unit cell defined by its lengths (Angstroms) and angles (degrees).
///
/// The lattice matrix stores the cell vectors as columns with `a` along x and `b` in the
/// xy plane, so `cartesian = matrix * fractional`.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitCell {
    lengths: [f64; 3],
    angles: [f64; 3],
    matrix: Matrix3<f64>,
    inverse: Matrix3<f64>,
}

impl UnitCell {
    pub fn from_parameters(lengths: [f64; 3], angles: [f64; 3]) -> Result<Self, CellError> {
        if lengths.iter().any(|l| !(*l > 0.0) || !l.is_finite()) {
            return Err(CellError::NonPositiveLength(lengths));
        }
        let [a, b, c] = lengths;
        let [alpha, beta, gamma] = angles.map(f64::to_radians);

        let (cos_a, cos_b, cos_g) = (
            clean_trig(alpha.cos()),
            clean_trig(beta.cos()),
            clean_trig(gamma.cos()),
        );
        let sin_g = clean_trig(gamma.sin());
        if sin_g <= 0.0 {
            return Err(CellError::DegenerateAngles(angles));
        }

        let cx = cos_b;
        let cy = (cos_a - cos_b * cos_g) / sin_g;
        let cz_squared = 1.0 - cx * cx - cy * cy;
        if !(cz_squared > 0.0) {
            return Err(CellError::DegenerateAngles(angles));
        }

        let va = Vector3::new(a, 0.0, 0.0);
        let vb = Vector3::new(b * cos_g, b * sin_g, 0.0);
        let vc = Vector3::new(c * cx, c * cy, c * cz_squared.sqrt());
        let matrix = Matrix3::from_columns(&[va, vb, vc]);
        let inverse = matrix
            .try_inverse()
            .ok_or(CellError::DegenerateAngles(angles))?;

        Ok(Self {
            lengths,
            angles,
            matrix,
            inverse,
        })
    }

    pub fn lengths(&self) -> [f64; 3] {
        self.lengths
    }

    pub fn angles(&self) -> [f64; 3] {
        self.angles
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.matrix
    }

    /// The three lattice vectors `a`, `b`, `c`.
    pub fn vectors(&self) -> [Vector3<f64>; 3] {
        [
            self.matrix.column(0).into_owned(),
            self.matrix.column(1).into_owned(),
            self.matrix.column(2).into_owned(),
        ]
    }

    pub fn volume(&self) -> f64 {
        self.matrix.determinant().abs()
    }

    pub fn to_fractional(&self, position: &Point3<f64>) -> Vector3<f64> {
        self.inverse * position.coords
    }

    pub fn to_cartesian(&self, fractional: &Vector3<f64>) -> Point3<f64> {
        Point3::from(self.matrix * fractional)
    }
}

// Snaps values within rounding noise of 0 or +-1, so right angles give exact zeros.
fn clean_trig(value: f64) -> f64 {
    const EPS: f64 = 1e-12;
    if value.abs() < EPS {
        0.0
    } else if (value.abs() - 1.0).abs() < EPS {
        value.signum()
    } else {
        value
    }
}

/// A node of the crystal graph: the source atom's attributes plus its provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrystalNode {
    /// Name of the molecule this atom was copied from.
    pub molecule: usize,
    /// Index of the symmetry operator that produced the copy.
    pub symmetry_operator: usize,
    /// Local index of the atom inside its source molecule.
    pub source_index: usize,
    pub attributes: AtomAttributes,
    /// Number of bonded hydrogens without coordinates; present only before imputation.
    pub missing_hydrogens: Option<u32>,
}

pub type CrystalGraph = AttributedGraph<CrystalNode>;

/// The assembled periodic structure. `atoms[i]` corresponds to node `i` of `graph`.
#[derive(Debug, Clone, PartialEq)]
pub struct Crystal {
    pub cell: UnitCell,
    pub atoms: Vec<Atom>,
    pub graph: CrystalGraph,
}

impl Crystal {
    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn element_counts(&self) -> ElementCounts {
        ElementCounts::from_symbols(self.atoms.iter().map(|a| a.element.as_str()))
    }

    pub fn total_formal_charge(&self) -> f64 {
        self.atoms.iter().map(|a| a.formal_charge).sum()
    }

    pub fn total_magnetic_moment(&self) -> f64 {
        self.atoms.iter().map(|a| a.magnetic_moment).sum()
    }

    pub fn has_hydrogen_deficits(&self) -> bool {
        self.graph
            .nodes()
            .any(|(_, node)| node.missing_hydrogens.is_some())
    }

    /// Removes the transient missing-hydrogen counters from every node.
    /// Returns how many nodes carried one.
    pub fn strip_hydrogen_deficits(&mut self) -> usize {
        let mut stripped = 0;
        for node in self.graph.nodes_mut() {
            if node.missing_hydrogens.take().is_some() {
                stripped += 1;
            }
        }
        stripped
    }
}

use nalgebra::{Point3, Rotation3, Unit, Vector3};

/// Ideal angle between two bonds on an sp3 centre, in degrees.
pub const TETRAHEDRAL_ANGLE: f64 = 109.4712;

const NORM_EPS: f64 = 1e-8;

/// Ideal arrangement of bonds around a centre.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Geometry {
    Tetrahedral,
    Trigonal,
    Linear,
}

impl Geometry {
    /// The arrangement implied by a total number of bonded atoms.
    pub fn for_coordination(total: usize) -> Option<Self> {
        match total {
            4 => Some(Self::Tetrahedral),
            3 => Some(Self::Trigonal),
            2 => Some(Self::Linear),
            _ => None,
        }
    }

    fn max_coordination(&self) -> usize {
        match self {
            Self::Tetrahedral => 4,
            Self::Trigonal => 3,
            Self::Linear => 2,
        }
    }
}

/// Places `missing` hydrogens around `base_pos` given the positions of its bonded,
/// coordinated neighbours.
///
/// The free bond directions of `geometry` are filled in order, so a tetrahedral centre
/// with one neighbour and one missing hydrogen (a hydroxyl oxygen) gets a bent bond. An
/// atom without any coordinated neighbour gets hydrogens along canonical tetrahedral
/// directions whatever the geometry.
///
/// Returns `None` when the geometry has too few free directions or the neighbour
/// arrangement is degenerate (coincident atoms, collinear pairs where a plane is needed).
pub fn place_hydrogens(
    base_pos: &Point3<f64>,
    neighbors: &[Point3<f64>],
    missing: usize,
    geometry: Geometry,
    bond_length: f64,
) -> Option<Vec<Point3<f64>>> {
    if missing == 0 {
        return Some(Vec::new());
    }
    if neighbors.is_empty() {
        return isolated_hydrogens(base_pos, missing, bond_length);
    }
    if neighbors.len() + missing > geometry.max_coordination() {
        return None;
    }
    let mut free = match geometry {
        Geometry::Tetrahedral => tetrahedral_hydrogens(base_pos, neighbors, bond_length)?,
        Geometry::Trigonal => trigonal_hydrogens(base_pos, neighbors, bond_length)?,
        Geometry::Linear => vec![linear_hydrogen(base_pos, &neighbors[0], bond_length)?],
    };
    free.truncate(missing);
    Some(free)
}

/// Completes an sp3 centre with 1, 2 or 3 known neighbours.
pub fn tetrahedral_hydrogens(
    base_pos: &Point3<f64>,
    neighbors: &[Point3<f64>],
    bond_length: f64,
) -> Option<Vec<Point3<f64>>> {
    let neighbor_vecs = unit_directions(base_pos, neighbors)?;

    let directions = match neighbor_vecs.as_slice() {
        [n1] => {
            let perpendicular = any_perpendicular(n1);
            let tilt = Unit::new_normalize(n1.cross(&perpendicular));
            let h1 = Rotation3::from_axis_angle(&tilt, TETRAHEDRAL_ANGLE.to_radians()) * n1;
            let spin = Rotation3::from_axis_angle(&Unit::new_normalize(*n1), 120f64.to_radians());
            let h2 = spin * h1;
            let h3 = spin * h2;
            vec![h1, h2, h3]
        }
        [n1, n2] => {
            let bisector = (n1 + n2).try_normalize(NORM_EPS)?;
            let normal = n1.cross(n2).try_normalize(NORM_EPS)?;
            let half = (TETRAHEDRAL_ANGLE / 2.0).to_radians();
            let back = -bisector * half.cos();
            vec![back + normal * half.sin(), back - normal * half.sin()]
        }
        [n1, n2, n3] => {
            let direction = match (n1 + n2 + n3).try_normalize(NORM_EPS) {
                Some(sum) => -sum,
                // Planar neighbours: either side of the plane will do.
                None => (n2 - n1).cross(&(n3 - n1)).try_normalize(NORM_EPS)?,
            };
            vec![direction]
        }
        _ => return None,
    };

    Some(
        directions
            .into_iter()
            .map(|d| base_pos + d * bond_length)
            .collect(),
    )
}

/// Completes an sp2 centre with 1 or 2 known neighbours.
pub fn trigonal_hydrogens(
    base_pos: &Point3<f64>,
    neighbors: &[Point3<f64>],
    bond_length: f64,
) -> Option<Vec<Point3<f64>>> {
    let neighbor_vecs = unit_directions(base_pos, neighbors)?;

    let directions = match neighbor_vecs.as_slice() {
        [n1] => {
            let p = any_perpendicular(n1);
            let (sin, cos) = 120f64.to_radians().sin_cos();
            vec![n1 * cos + p * sin, n1 * cos - p * sin]
        }
        [n1, n2] => vec![-(n1 + n2).try_normalize(NORM_EPS)?],
        _ => return None,
    };

    Some(
        directions
            .into_iter()
            .map(|d| base_pos + d * bond_length)
            .collect(),
    )
}

/// Places one hydrogen opposite the single neighbour.
pub fn linear_hydrogen(
    base_pos: &Point3<f64>,
    neighbor: &Point3<f64>,
    bond_length: f64,
) -> Option<Point3<f64>> {
    let n1 = (neighbor - base_pos).try_normalize(NORM_EPS)?;
    Some(base_pos - n1 * bond_length)
}

/// Places up to four hydrogens on an atom with no coordinated neighbours, along the
/// vertices of a regular tetrahedron.
pub fn isolated_hydrogens(
    base_pos: &Point3<f64>,
    count: usize,
    bond_length: f64,
) -> Option<Vec<Point3<f64>>> {
    const VERTICES: [[f64; 3]; 4] = [
        [1.0, 1.0, 1.0],
        [1.0, -1.0, -1.0],
        [-1.0, 1.0, -1.0],
        [-1.0, -1.0, 1.0],
    ];
    if count > VERTICES.len() {
        return None;
    }
    Some(
        VERTICES[..count]
            .iter()
            .map(|v| base_pos + Vector3::from(*v).normalize() * bond_length)
            .collect(),
    )
}

fn unit_directions(base_pos: &Point3<f64>, neighbors: &[Point3<f64>]) -> Option<Vec<Vector3<f64>>> {
    neighbors
        .iter()
        .map(|p| (p - base_pos).try_normalize(NORM_EPS))
        .collect()
}

fn any_perpendicular(v: &Vector3<f64>) -> Vector3<f64> {
    let helper = if v.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    (helper - v * v.dot(&helper)).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-6;

    fn angle_deg(center: &Point3<f64>, a: &Point3<f64>, b: &Point3<f64>) -> f64 {
        (a - center).angle(&(b - center)).to_degrees()
    }

    fn assert_bond_lengths(center: &Point3<f64>, hydrogens: &[Point3<f64>], length: f64) {
        for h in hydrogens {
            assert!(((h - center).norm() - length).abs() < EPS);
        }
    }

    #[test]
    fn methyl_hydrogens_are_tetrahedral() {
        let base = Point3::origin();
        let neighbor = Point3::new(1.54, 0.0, 0.0);
        let hs = tetrahedral_hydrogens(&base, &[neighbor], 1.09).unwrap();

        assert_eq!(hs.len(), 3);
        assert_bond_lengths(&base, &hs, 1.09);
        for h in &hs {
            assert!((angle_deg(&base, h, &neighbor) - TETRAHEDRAL_ANGLE).abs() < 1e-3);
        }
        assert!((angle_deg(&base, &hs[0], &hs[1]) - TETRAHEDRAL_ANGLE).abs() < 1e-2);
    }

    #[test]
    fn methylene_hydrogens_straddle_the_heavy_atom_plane() {
        let base = Point3::origin();
        let n1 = Point3::new(1.5, 0.0, 0.0);
        let n2 = Point3::new(-0.5, 1.4, 0.0);
        let hs = tetrahedral_hydrogens(&base, &[n1, n2], 1.09).unwrap();

        assert_eq!(hs.len(), 2);
        assert_bond_lengths(&base, &hs, 1.09);
        assert!(hs[0].z > 0.0 && hs[1].z < 0.0);
        assert!((hs[0].z + hs[1].z).abs() < EPS);
        assert!((angle_deg(&base, &hs[0], &hs[1]) - TETRAHEDRAL_ANGLE).abs() < 1e-3);
    }

    #[test]
    fn methine_hydrogen_points_away_from_neighbours() {
        let base = Point3::origin();
        let neighbors = [
            Point3::new(1.0, 0.0, -0.3),
            Point3::new(-0.5, 0.87, -0.3),
            Point3::new(-0.5, -0.87, -0.3),
        ];
        let hs = tetrahedral_hydrogens(&base, &neighbors, 1.0).unwrap();
        assert_eq!(hs.len(), 1);
        assert!((hs[0] - Point3::new(0.0, 0.0, 1.0)).norm() < 1e-2);
    }

    #[test]
    fn coincident_neighbour_is_rejected() {
        let base = Point3::new(1.0, 1.0, 1.0);
        assert!(tetrahedral_hydrogens(&base, &[base], 1.0).is_none());
    }

    #[test]
    fn trigonal_hydrogens_are_120_degrees_apart() {
        let base = Point3::origin();
        let neighbor = Point3::new(0.0, 0.0, 1.34);
        let hs = trigonal_hydrogens(&base, &[neighbor], 1.09).unwrap();
        assert_eq!(hs.len(), 2);
        assert_bond_lengths(&base, &hs, 1.09);
        assert!((angle_deg(&base, &hs[0], &hs[1]) - 120.0).abs() < 1e-6);
        assert!((angle_deg(&base, &hs[0], &neighbor) - 120.0).abs() < 1e-6);
    }

    #[test]
    fn geometry_follows_total_coordination() {
        assert_eq!(Geometry::for_coordination(4), Some(Geometry::Tetrahedral));
        assert_eq!(Geometry::for_coordination(3), Some(Geometry::Trigonal));
        assert_eq!(Geometry::for_coordination(2), Some(Geometry::Linear));
        assert_eq!(Geometry::for_coordination(5), None);
    }

    #[test]
    fn place_hydrogens_fills_free_directions() {
        let base = Point3::origin();
        let n = Point3::new(1.2, 0.0, 0.0);

        let linear = place_hydrogens(&base, &[n], 1, Geometry::Linear, 1.0).unwrap();
        assert!((linear[0] - Point3::new(-1.0, 0.0, 0.0)).norm() < EPS);

        let bent = place_hydrogens(&base, &[n], 1, Geometry::Tetrahedral, 0.96).unwrap();
        assert_eq!(bent.len(), 1);
        assert!((angle_deg(&base, &bent[0], &n) - TETRAHEDRAL_ANGLE).abs() < 1e-3);

        let trigonal = Geometry::Trigonal;
        assert_eq!(place_hydrogens(&base, &[n], 2, trigonal, 1.0).unwrap().len(), 2);
        assert!(place_hydrogens(&base, &[n], 3, trigonal, 1.0).is_none());
        assert!(place_hydrogens(&base, &[n], 2, Geometry::Linear, 1.0).is_none());
        assert_eq!(
            place_hydrogens(&base, &[], 2, Geometry::Linear, 0.96).unwrap().len(),
            2
        );
        assert!(place_hydrogens(&base, &[], 5, Geometry::Tetrahedral, 1.0).is_none());
        assert!(place_hydrogens(&base, &[n], 0, trigonal, 1.0).unwrap().is_empty());
    }

    #[test]
    fn isolated_water_hydrogens_have_tetrahedral_angle() {
        let base = Point3::new(2.0, 2.0, 2.0);
        let hs = isolated_hydrogens(&base, 2, 0.96).unwrap();
        assert_bond_lengths(&base, &hs, 0.96);
        assert!((angle_deg(&base, &hs[0], &hs[1]) - TETRAHEDRAL_ANGLE).abs() < 1e-3);
    }
}

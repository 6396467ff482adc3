use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Hybridisation state reported by the database for an atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Hybridisation {
    #[default]
    Unknown,
    S,
    Sp,
    Sp2,
    Sp3,
    Sp3d,
    Sp3d2,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid hybridisation string: '{0}'")]
pub struct ParseHybridisationError(pub String);

impl FromStr for Hybridisation {
    type Err = ParseHybridisationError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "unknown" | "none" | "0" => Ok(Self::Unknown),
            "s" => Ok(Self::S),
            "sp" | "1" => Ok(Self::Sp),
            "sp2" | "2" => Ok(Self::Sp2),
            "sp3" | "3" => Ok(Self::Sp3),
            "sp3d" => Ok(Self::Sp3d),
            "sp3d2" => Ok(Self::Sp3d2),
            _ => Err(ParseHybridisationError(s.to_string())),
        }
    }
}

impl TryFrom<String> for Hybridisation {
    type Error = ParseHybridisationError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Hybridisation> for String {
    fn from(value: Hybridisation) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Hybridisation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Unknown => "unknown",
                Self::S => "s",
                Self::Sp => "sp",
                Self::Sp2 => "sp2",
                Self::Sp3 => "sp3",
                Self::Sp3d => "sp3d",
                Self::Sp3d2 => "sp3d2",
            }
        )
    }
}

/// A coordinated atom owned by a molecule.
///
/// Only atoms with known 3-D positions ever become an `Atom`; hydrogens without
/// coordinates are tracked as deficits on their bonded heavy atom instead.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// Element symbol. Deuterium and tritium are stored as `H`.
    pub element: String,
    /// Cartesian position in Angstroms.
    pub position: Point3<f64>,
    /// Initial formal charge in elementary charge units.
    pub formal_charge: f64,
    /// Initial magnetic moment in Bohr magnetons.
    pub magnetic_moment: f64,
    /// Isotope mass in Daltons for atoms that were deuterium or tritium.
    pub isotope_mass: Option<f64>,
}

impl Atom {
    pub fn new(element: &str, position: Point3<f64>) -> Self {
        Self {
            element: element.to_string(),
            position,
            formal_charge: 0.0,
            magnetic_moment: 0.0,
            isotope_mass: None,
        }
    }

    pub fn is_hydrogen(&self) -> bool {
        self.element == "H"
    }
}

/// Chemical attributes carried by every node of a molecule graph.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AtomAttributes {
    pub element: String,
    pub is_h_donor: bool,
    pub is_h_acceptor: bool,
    pub is_spiro_atom: bool,
    /// Number of rings this atom takes part in.
    pub ring_count: u32,
    pub hybridisation: Hybridisation,
    /// `true` for atoms created by hydrogen imputation.
    pub added_or_modified: bool,
}

impl AtomAttributes {
    pub fn is_hydrogen(&self) -> bool {
        self.element == "H"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hybridisation_from_str_is_case_insensitive() {
        assert_eq!("SP3".parse::<Hybridisation>().unwrap(), Hybridisation::Sp3);
        assert_eq!("sp2".parse::<Hybridisation>().unwrap(), Hybridisation::Sp2);
        assert_eq!("Sp".parse::<Hybridisation>().unwrap(), Hybridisation::Sp);
        assert_eq!("".parse::<Hybridisation>().unwrap(), Hybridisation::Unknown);
        assert_eq!("3".parse::<Hybridisation>().unwrap(), Hybridisation::Sp3);
    }

    #[test]
    fn hybridisation_from_str_rejects_unknown_labels() {
        assert!("sp4".parse::<Hybridisation>().is_err());
        assert!("tetrahedral".parse::<Hybridisation>().is_err());
    }

    #[test]
    fn hybridisation_display_matches_parse_input() {
        for h in [
            Hybridisation::Unknown,
            Hybridisation::S,
            Hybridisation::Sp,
            Hybridisation::Sp2,
            Hybridisation::Sp3,
            Hybridisation::Sp3d,
            Hybridisation::Sp3d2,
        ] {
            assert_eq!(h.to_string().parse::<Hybridisation>().unwrap(), h);
        }
    }

    #[test]
    fn hybridisation_deserializes_from_json_string() {
        let h: Hybridisation = serde_json::from_str("\"sp3\"").unwrap();
        assert_eq!(h, Hybridisation::Sp3);
        assert!(serde_json::from_str::<Hybridisation>("\"bogus\"").is_err());
    }

    #[test]
    fn new_atom_has_neutral_defaults() {
        let atom = Atom::new("C", Point3::new(1.0, 2.0, 3.0));
        assert_eq!(atom.formal_charge, 0.0);
        assert_eq!(atom.magnetic_moment, 0.0);
        assert!(atom.isotope_mass.is_none());
        assert!(!atom.is_hydrogen());
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Bond classification as reported by the crystallographic database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BondType {
    #[default]
    Single,
    Double,
    Triple,
    Quadruple,
    Aromatic,
    Delocalised,
    Pi,
    Unknown,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid bond type string: '{0}'")]
pub struct ParseBondTypeError(pub String);

impl FromStr for BondType {
    type Err = ParseBondTypeError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1" | "s" | "single" => Ok(Self::Single),
            "2" | "d" | "double" => Ok(Self::Double),
            "3" | "t" | "triple" => Ok(Self::Triple),
            "4" | "q" | "quadruple" => Ok(Self::Quadruple),
            "ar" | "5" | "aromatic" => Ok(Self::Aromatic),
            "7" | "delocalised" | "delocalized" => Ok(Self::Delocalised),
            "9" | "pi" => Ok(Self::Pi),
            "0" | "un" | "unknown" => Ok(Self::Unknown),
            _ => Err(ParseBondTypeError(s.to_string())),
        }
    }
}

impl TryFrom<String> for BondType {
    type Error = ParseBondTypeError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BondType> for String {
    fn from(value: BondType) -> Self {
        value.to_string()
    }
}

impl fmt::Display for BondType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Single => "Single",
                Self::Double => "Double",
                Self::Triple => "Triple",
                Self::Quadruple => "Quadruple",
                Self::Aromatic => "Aromatic",
                Self::Delocalised => "Delocalised",
                Self::Pi => "Pi",
                Self::Unknown => "Unknown",
            }
        )
    }
}

impl BondType {
    /// The SYBYL bond code derived from this classification.
    pub fn sybyl_code(&self) -> &'static str {
        match self {
            Self::Single => "1",
            Self::Double => "2",
            Self::Triple => "3",
            Self::Aromatic | Self::Delocalised => "ar",
            Self::Quadruple | Self::Pi | Self::Unknown => "un",
        }
    }
}

/// Attributes carried by every edge of a molecule or crystal graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BondAttributes {
    pub bond_type: BondType,
    /// SYBYL-style bond code, either supplied by the database or derived from `bond_type`.
    pub sybyl_type: String,
    pub is_conjugated: bool,
    pub is_cyclic: bool,
    pub ring_count: u32,
}

impl BondAttributes {
    pub fn new(bond_type: BondType) -> Self {
        Self {
            bond_type,
            sybyl_type: bond_type.sybyl_code().to_string(),
            is_conjugated: false,
            is_cyclic: false,
            ring_count: 0,
        }
    }
}

/// Orders an undirected pair with the lower index first.
#[inline]
pub fn canonical_pair(a: usize, b: usize) -> (usize, usize) {
    if a <= b { (a, b) } else { (b, a) }
}

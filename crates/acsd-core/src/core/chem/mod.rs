//! Chemistry helpers: static element data, declared-formula parsing, and a SMILES
//! reader sufficient for atom-environment comparison.

pub mod elements;
pub mod formula;
pub mod smiles;

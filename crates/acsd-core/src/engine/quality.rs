use super::smiles_compare::compare_with_smiles;
use crate::core::chem::formula::parse_formula;
use crate::core::models::crystal::Crystal;
use crate::core::models::entry::Entry;
use crate::core::models::molecule::{MoleculeSet, StructureError};
use crate::core::models::quality::QualityFlags;

/// The parts of an entry that the reconstructed crystal is checked against.
#[derive(Debug, Clone, Copy)]
pub struct DeclaredMetadata<'a> {
    pub identifier: &'a str,
    pub formula: &'a str,
    pub has_disorder: bool,
    /// Declared SMILES per component, in component order.
    pub smiles: &'a [Option<String>],
}

impl<'a> DeclaredMetadata<'a> {
    pub fn new(entry: &'a Entry, smiles: &'a [Option<String>]) -> Self {
        Self {
            identifier: &entry.identifier,
            formula: &entry.formula,
            has_disorder: entry.has_disorder,
            smiles,
        }
    }
}

/// Computes the quality flags of an assembled crystal.
///
/// The declared formula is compared with the element counts of every atom in the
/// crystal, once as is and once with hydrogen removed from both sides. An unreadable
/// formula sets both mismatch flags and keeps the parse error in
/// [`QualityFlags::formula_error`]. Net charge and spin are exact comparisons with zero.
///
/// # Errors
///
/// Returns [`StructureError`] when `molecules` violates the naming invariants.
pub fn evaluate(
    crystal: &Crystal,
    molecules: &MoleculeSet,
    declared: &DeclaredMetadata<'_>,
) -> Result<QualityFlags, StructureError> {
    let (differs_with_hydrogens, differs_without_hydrogens, formula_error) =
        match parse_formula(declared.formula) {
            Ok(expected) => {
                let actual = crystal.element_counts();
                (
                    expected != actual,
                    expected.without("H") != actual.without("H"),
                    None,
                )
            }
            Err(e) => (true, true, Some(e)),
        };

    let smiles = compare_with_smiles(molecules, declared.smiles)?;

    Ok(QualityFlags {
        identifier: declared.identifier.to_string(),
        has_disorder: declared.has_disorder,
        differs_with_hydrogens,
        differs_without_hydrogens,
        is_charge_zero: crystal.total_formal_charge() == 0.0,
        is_multiplicity_one: crystal.total_magnetic_moment() + 1.0 == 1.0,
        smiles,
        formula_error,
    })
}

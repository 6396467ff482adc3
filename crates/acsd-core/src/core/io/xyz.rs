use super::traits::CrystalFile;
use crate::core::chem::elements::atomic_weight;
use crate::core::models::crystal::Crystal;
use std::io::{self, Write};
use thiserror::Error;

const PROPERTIES: &str = "species:S:1:pos:R:3:initial_charges:R:1:magmoms:R:1:masses:R:1:\
molecule:I:1:is_H_donor:L:1:is_H_acceptor:L:1:is_spiro_atom:L:1:\
involved_in_no_of_rings:I:1:hybridisation:S:1:added_or_modified:L:1";

#[derive(Debug, Error)]
pub enum XyzError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Inconsistent data: {0}")]
    Inconsistency(String),
}

/// Information written to the comment line next to the lattice and properties.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XyzMetadata {
    pub identifier: String,
}

impl XyzMetadata {
    pub fn new(identifier: &str) -> Self {
        Self {
            identifier: identifier.to_string(),
        }
    }
}

/// Extended XYZ writer that embeds per-atom graph attributes as property columns and the
/// bond list as a `bonds` key on the comment line.
pub struct ExtendedXyzFile;

impl CrystalFile for ExtendedXyzFile {
    type Metadata = XyzMetadata;
    type Error = XyzError;

    fn write_to(
        crystal: &Crystal,
        metadata: &Self::Metadata,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        if crystal.graph.node_count() != crystal.len() {
            return Err(XyzError::Inconsistency(format!(
                "{} atoms but {} graph nodes",
                crystal.len(),
                crystal.graph.node_count()
            )));
        }

        writeln!(writer, "{}", crystal.len())?;

        let lattice = crystal
            .cell
            .vectors()
            .iter()
            .flat_map(|v| v.iter().copied())
            .map(|x| format!("{:.8}", x))
            .collect::<Vec<_>>()
            .join(" ");
        let bonds = crystal
            .graph
            .edges()
            .map(|((a, b), bond)| {
                format!(
                    "{}-{}:{}:{}:{}:{}:{}",
                    a,
                    b,
                    bond.bond_type,
                    bond.sybyl_type,
                    flag(bond.is_conjugated),
                    flag(bond.is_cyclic),
                    bond.ring_count
                )
            })
            .collect::<Vec<_>>()
            .join(";");
        writeln!(
            writer,
            "Lattice=\"{}\" Properties={} identifier={} bonds=\"{}\" pbc=\"T T T\"",
            lattice, PROPERTIES, metadata.identifier, bonds
        )?;

        for (index, atom) in crystal.atoms.iter().enumerate() {
            let node = crystal.graph.node(index).ok_or_else(|| {
                XyzError::Inconsistency(format!("No graph node for atom {}", index))
            })?;
            let mass = match atom.isotope_mass {
                Some(mass) => mass,
                None => atomic_weight(&atom.element).ok_or_else(|| {
                    XyzError::Inconsistency(format!(
                        "No atomic weight for element '{}' (atom {})",
                        atom.element, index
                    ))
                })?,
            };
            let attrs = &node.attributes;
            writeln!(
                writer,
                "{:<2} {:>14.8} {:>14.8} {:>14.8} {:>8.4} {:>8.4} {:>12.6} {:>4} {} {} {} {:>2} {} {}",
                atom.element,
                atom.position.x,
                atom.position.y,
                atom.position.z,
                atom.formal_charge,
                atom.magnetic_moment,
                mass,
                node.molecule,
                flag(attrs.is_h_donor),
                flag(attrs.is_h_acceptor),
                flag(attrs.is_spiro_atom),
                attrs.ring_count,
                attrs.hybridisation,
                flag(attrs.added_or_modified)
            )?;
        }
        Ok(())
    }
}

fn flag(value: bool) -> char {
    if value { 'T' } else { 'F' }
}

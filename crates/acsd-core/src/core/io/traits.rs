use crate::core::models::crystal::Crystal;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Defines the interface for serializing an assembled crystal to a structure format.
pub trait CrystalFile {
    /// Format-specific information written alongside the structure.
    type Metadata;

    /// The error type for serialization.
    type Error: Error + From<io::Error>;

    /// Writes a crystal and its metadata to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if the crystal cannot be represented in this format or the
    /// writer fails.
    fn write_to(
        crystal: &Crystal,
        metadata: &Self::Metadata,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error>;

    /// Writes a crystal and its metadata to a file, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or writing fails.
    fn write_to_path<P: AsRef<Path>>(
        crystal: &Crystal,
        metadata: &Self::Metadata,
        path: P,
    ) -> Result<(), Self::Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(crystal, metadata, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

use crate::core::models::structure::Structure;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Common interface for structure file formats.
///
/// Implementors parse a [`Structure`] plus format-specific metadata from a reader
/// and serialize it back. The path-based helpers are provided.
pub trait StructureFile {
    /// Format-specific data that does not fit the structure model.
    type Metadata: Default;

    /// The error type for I/O and parse failures.
    type Error: Error + From<io::Error>;

    /// Reads a structure from a buffered reader.
    ///
    /// # Errors
    ///
    /// Returns an error if a record cannot be parsed or the reader fails.
    fn read_from(reader: &mut impl BufRead) -> Result<(Structure, Self::Metadata), Self::Error>;

    /// Writes a structure and its metadata to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_to(
        structure: &Structure,
        metadata: &Self::Metadata,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error>;

    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<(Structure, Self::Metadata), Self::Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }

    fn write_to_path<P: AsRef<Path>>(
        structure: &Structure,
        metadata: &Self::Metadata,
        path: P,
    ) -> Result<(), Self::Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(structure, metadata, &mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Writes a structure without metadata.
    fn write_structure_to_path<P: AsRef<Path>>(
        structure: &Structure,
        path: P,
    ) -> Result<(), Self::Error> {
        Self::write_to_path(structure, &Self::Metadata::default(), path)
    }
}

//! # Core Models Module
//!
//! Data structures for the structural objects handled by the pipeline.
//!
//! - [`atom`] - Individual atoms with coordinates and the confidence-carrying B-factor slot
//! - [`residue`] - Residues with source numbering and applied chemical patches
//! - [`chain`] - Contiguous residue runs sharing a chain identifier
//! - [`structure`] - Whole structures addressable by 1-based internal residue index
//!
//! ```ignore
//! use foldpost::core::models::structure::StructureBuilder;
//!
//! let mut builder = StructureBuilder::new();
//! builder.start_chain('A');
//! builder.start_residue("SER", 45, None);
//! builder.add_atom(Atom::new(1, "CA", Point3::new(0.0, 0.0, 0.0)));
//! let structure = builder.build();
//! assert_eq!(structure.pdb_to_internal(45, 'A'), Some(1));
//! ```

pub mod atom;
pub mod chain;
pub mod residue;
pub mod structure;

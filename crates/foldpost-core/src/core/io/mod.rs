//! Input/output for the files a prediction run leaves behind.
//!
//! Structures are read and written through the [`traits::StructureFile`] interface
//! ([`pdb`] is the only format needed here); pairwise error matrices live in JSON
//! files next to each structure ([`error_matrix`]); model-level scores come from
//! the run's settings text ([`settings`]).

pub mod error_matrix;
pub mod pdb;
pub mod settings;
pub mod traits;

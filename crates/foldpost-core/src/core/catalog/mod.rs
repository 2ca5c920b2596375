//! # Model Catalog
//!
//! One row per rank of a prediction run, in the order the files were found.
//!
//! - [`record`] - File-name parsing and folder scanning with relaxed-first deduplication
//! - [`table`] - The [`table::Catalog`] itself, its rank-aligned columns and CSV persistence
//! - [`enrich`] - Joining model-level scores from the run's settings file
//!
//! Rows are never reordered or removed after the scan; later pipeline steps only
//! append columns, always aligned by explicit rank lookup.

pub mod enrich;
pub mod record;
pub mod table;

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Model ranking assigned by the prediction pipeline; the join key everywhere.
pub type Rank = u32;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("I/O error for '{path}': {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("CSV error for '{path}': {source}")]
    Csv { path: PathBuf, source: csv::Error },

    #[error("Catalog file is missing the '{0}' column")]
    MissingColumn(String),

    #[error("Invalid value '{value}' in column '{column}' (row {row})")]
    InvalidValue {
        column: String,
        row: usize,
        value: String,
    },

    #[error("Duplicate rank {0} in catalog file")]
    DuplicateRank(Rank),
}

use thiserror::Error;

use super::config::ConfigError;
use super::registry::PoseGroup;
use crate::core::catalog::{CatalogError, Rank};
use crate::core::ptm::AnnotationError;
use std::path::PathBuf;

#[derive(Debug, Error)]
pub enum EngineError {
    /// A structure, error matrix or catalog file is missing or malformed.
    #[error("Failed to load '{path}': {message}")]
    Load { path: PathBuf, message: String },

    #[error("Malformed input: {0}")]
    Format(String),

    /// An operation ran before the data it depends on was produced.
    #[error("Invalid state: {0}")]
    State(String),

    #[error("The group '{0}' is not loaded")]
    GroupNotLoaded(PoseGroup),

    #[error("Rank {rank} not found in group '{group}'")]
    KeyNotFound { group: PoseGroup, rank: Rank },

    #[error("Physics engine failure: {0}")]
    Engine(String),

    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("I/O error for '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl From<AnnotationError> for EngineError {
    fn from(err: AnnotationError) -> Self {
        EngineError::Format(err.to_string())
    }
}

impl From<CatalogError> for EngineError {
    fn from(err: CatalogError) -> Self {
        let path = match &err {
            CatalogError::Io { path, .. } | CatalogError::Csv { path, .. } => path.clone(),
            _ => PathBuf::new(),
        };
        EngineError::Load {
            path,
            message: err.to_string(),
        }
    }
}

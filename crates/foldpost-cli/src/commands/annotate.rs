use crate::cli::AnnotateArgs;
use crate::error::{CliError, Result};
use foldpost::core::ptm::{Annotation, parse_annotation};
use foldpost::engine::error::EngineError;
use std::path::Path;
use tracing::info;

/// Reads and parses an annotation file, keeping sites in `[minimum, maximum]`.
pub fn read_annotation(path: &Path, minimum: isize, maximum: isize) -> Result<Annotation> {
    let raw = std::fs::read_to_string(path)?;
    let annotation = parse_annotation(&raw, minimum, maximum).map_err(EngineError::from)?;
    info!(sites = annotation.len(), "Parsed annotation from {:?}", path);
    Ok(annotation)
}

pub fn run(args: AnnotateArgs) -> Result<()> {
    let annotation = read_annotation(&args.input, args.min, args.max)?;
    let json = serde_json::to_string_pretty(&annotation).map_err(|e| CliError::Other(e.into()))?;
    println!("{json}");
    Ok(())
}

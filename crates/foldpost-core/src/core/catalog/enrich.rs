use super::table::Catalog;
use super::{CatalogError, Rank};
use crate::core::io::settings::{SETTINGS_FILE_NAME, parse_settings};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::warn;

pub const CONFIDENCE_COLUMN: &str = "confidence";
pub const PTM_SCORE_COLUMN: &str = "ptm_score";

/// Value used for both score columns when the settings file is absent.
pub const MISSING_SETTINGS_SENTINEL: f64 = 100.0;

/// Joins the run's model-level scores onto the catalog by rank.
///
/// Without a settings file both columns are filled with
/// [`MISSING_SETTINGS_SENTINEL`] and a warning is logged. Ranks the file does
/// not mention stay null.
pub fn enrich(catalog: &mut Catalog, folder: &Path) -> Result<(), CatalogError> {
    let path = folder.join(SETTINGS_FILE_NAME);
    if !path.exists() {
        warn!(
            path = %path.display(),
            "Settings file missing; using {MISSING_SETTINGS_SENTINEL} for confidence and pTM scores"
        );
        catalog.set_column_by_rank(CONFIDENCE_COLUMN, |_| Some(MISSING_SETTINGS_SENTINEL));
        catalog.set_column_by_rank(PTM_SCORE_COLUMN, |_| Some(MISSING_SETTINGS_SENTINEL));
        return Ok(());
    }

    let text = fs::read_to_string(&path).map_err(|source| CatalogError::Io {
        path: path.clone(),
        source,
    })?;
    let scores = parse_settings(&text);
    let confidence: BTreeMap<Rank, f64> = scores.iter().map(|(r, s)| (*r, s.confidence)).collect();
    let ptm: BTreeMap<Rank, f64> = scores.iter().map(|(r, s)| (*r, s.ptm_score)).collect();
    catalog.join_by_rank(CONFIDENCE_COLUMN, &confidence);
    catalog.join_by_rank(PTM_SCORE_COLUMN, &ptm);
    Ok(())
}

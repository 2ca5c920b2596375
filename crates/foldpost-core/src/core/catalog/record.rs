use super::table::Catalog;
use super::{CatalogError, Rank};
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;

static CANDIDATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"rank_\d+.*\.pdb").expect("static pattern is valid"));

static MODEL_FILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?P<name>.*)_(?P<seed>\d+)_(?P<state>\w+)_rank_(?P<rank>\d+)_model_(?P<model>\d+)\.pdb",
    )
    .expect("static pattern is valid")
});

/// One predicted model file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRecord {
    /// File name, without the folder.
    pub name: String,
    pub path: PathBuf,
    pub rank: Rank,
    pub model: u32,
    pub seed: u64,
    pub relaxed: bool,
}

/// Outcome of matching a file name against the model naming convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileMatch {
    /// Not a ranked structure file.
    Unrelated,
    /// Looks ranked but does not follow the full convention.
    Malformed,
    Model(ModelRecord),
}

/// Parses `<name>_<seed>_<state>_rank_<rank>_model_<model>.pdb`.
///
/// The model counts as relaxed unless its state token contains `unrelaxed`.
pub fn parse_file_name(file_name: &str, folder: &Path) -> FileMatch {
    if !CANDIDATE.is_match(file_name) {
        return FileMatch::Unrelated;
    }
    let Some(caps) = MODEL_FILE.captures(file_name) else {
        return FileMatch::Malformed;
    };
    let (Ok(rank), Ok(model), Ok(seed)) = (
        caps["rank"].parse(),
        caps["model"].parse(),
        caps["seed"].parse(),
    ) else {
        return FileMatch::Malformed;
    };
    FileMatch::Model(ModelRecord {
        name: file_name.to_string(),
        path: folder.join(file_name),
        rank,
        model,
        seed,
        relaxed: !caps["state"].contains("unrelaxed"),
    })
}

/// Deduplicates records by rank in the given order.
///
/// A later record replaces the stored one for its rank unless the stored one is
/// relaxed. Each rank keeps the position of its first appearance.
pub fn deduplicate(records: impl IntoIterator<Item = ModelRecord>) -> Vec<ModelRecord> {
    let mut rows: Vec<ModelRecord> = Vec::new();
    let mut positions: HashMap<Rank, usize> = HashMap::new();
    for record in records {
        match positions.get(&record.rank) {
            Some(&i) if rows[i].relaxed => {
                debug!(file = %record.name, rank = record.rank, "Keeping relaxed model for rank");
            }
            Some(&i) => rows[i] = record,
            None => {
                positions.insert(record.rank, rows.len());
                rows.push(record);
            }
        }
    }
    rows
}

/// Scans a result folder and builds the catalog, in directory enumeration order.
///
/// A folder without matching files yields an empty catalog.
pub fn build_catalog(folder: &Path) -> Result<Catalog, CatalogError> {
    let io_error = |source| CatalogError::Io {
        path: folder.to_path_buf(),
        source,
    };
    let mut records = Vec::new();
    for entry in fs::read_dir(folder).map_err(io_error)? {
        let entry = entry.map_err(io_error)?;
        let file_name = entry.file_name().to_string_lossy().to_string();
        match parse_file_name(&file_name, folder) {
            FileMatch::Model(record) => records.push(record),
            FileMatch::Malformed => {
                debug!(file = %file_name, "Ignoring ranked file that does not follow the naming convention");
            }
            FileMatch::Unrelated => {}
        }
    }
    let catalog = Catalog::new(deduplicate(records));
    debug!(rows = catalog.len(), folder = %folder.display(), "Built model catalog");
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;

    fn record(name: &str) -> ModelRecord {
        match parse_file_name(name, Path::new("/run")) {
            FileMatch::Model(record) => record,
            other => panic!("{name} did not parse: {other:?}"),
        }
    }

    #[test]
    fn parse_file_name_extracts_all_fields() {
        let r = record("kcc2dimer_42460_unrelaxed_rank_1_model_5.pdb");
        assert_eq!(r.rank, 1);
        assert_eq!(r.model, 5);
        assert_eq!(r.seed, 42460);
        assert!(!r.relaxed);
        assert_eq!(r.path, PathBuf::from("/run/kcc2dimer_42460_unrelaxed_rank_1_model_5.pdb"));
        assert!(record("kcc2dimer_42460_relaxed_rank_1_model_5.pdb").relaxed);
    }

    #[test]
    fn parse_file_name_separates_unrelated_and_malformed_files() {
        let folder = Path::new("/run");
        assert_eq!(parse_file_name("settings.txt", folder), FileMatch::Unrelated);
        assert_eq!(
            parse_file_name("x_1_unrelaxed_rank_1_model_1_scores.json", folder),
            FileMatch::Unrelated
        );
        assert_eq!(parse_file_name("rank_1_relaxed.pdb", folder), FileMatch::Malformed);
    }

    #[test]
    fn relaxed_model_wins_regardless_of_order() {
        let unrelaxed = record("d_7_unrelaxed_rank_2_model_1.pdb");
        let relaxed = record("d_7_relaxed_rank_2_model_1.pdb");

        let rows = deduplicate([unrelaxed.clone(), relaxed.clone()]);
        assert_eq!(rows, vec![relaxed.clone()]);
        let rows = deduplicate([relaxed.clone(), unrelaxed]);
        assert_eq!(rows, vec![relaxed]);
    }

    #[test]
    fn deduplicate_keeps_first_appearance_order() {
        let rows = deduplicate([
            record("d_7_unrelaxed_rank_3_model_2.pdb"),
            record("d_7_unrelaxed_rank_1_model_4.pdb"),
            record("d_7_relaxed_rank_3_model_2.pdb"),
        ]);
        let ranks: Vec<Rank> = rows.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![3, 1]);
        assert!(rows[0].relaxed);
    }

    #[test]
    fn build_catalog_of_folder_without_models_is_empty() {
        let dir = tempdir().unwrap();
        File::create(dir.path().join("notes.txt")).unwrap();
        let catalog = build_catalog(dir.path()).unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn build_catalog_has_unique_ranks() {
        let dir = tempdir().unwrap();
        for name in [
            "d_7_unrelaxed_rank_1_model_3.pdb",
            "d_7_unrelaxed_rank_2_model_1.pdb",
            "d_7_relaxed_rank_2_model_1.pdb",
            "d_7_unrelaxed_rank_3_model_2.pdb",
        ] {
            File::create(dir.path().join(name)).unwrap();
        }
        let catalog = build_catalog(dir.path()).unwrap();
        let mut ranks = catalog.ranks();
        assert_eq!(ranks.len(), 3);
        ranks.sort();
        ranks.dedup();
        assert_eq!(ranks, vec![1, 2, 3]);
        assert!(catalog.record(2).unwrap().relaxed);
    }

    #[test]
    fn build_catalog_of_missing_folder_fails() {
        assert!(matches!(
            build_catalog(Path::new("/definitely/not/here")),
            Err(CatalogError::Io { .. })
        ));
    }
}

use super::analyser::{Analyser, load_structure};
use crate::core::catalog::Rank;
use crate::core::catalog::table::Catalog;
use crate::core::io::error_matrix::ErrorMatrix;
use crate::core::io::pdb::PdbFile;
use crate::core::io::traits::StructureFile;
use crate::engine::config::AnalysisConfig;
use crate::engine::error::EngineError;
use crate::engine::reference::ReferenceEngine;
use crate::engine::registry::{ErrorTable, PoseGroup, PoseRegistry};
use crate::engine::traits::Engine;
use regex::Regex;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, info, instrument};

pub const CATALOG_FILE_NAME: &str = "scores.csv";
pub const ERRORS_FILE_NAME: &str = "errors.json";

static DUMPED_STRUCTURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"rank_(?P<rank>\d+)_(?P<group>original|relaxed|phospho)\.pdb$")
        .expect("static pattern is valid")
});

/// File name of a dumped structure.
pub fn dump_file_name(prefix: &str, rank: Rank, group: PoseGroup) -> String {
    format!("{prefix}rank_{rank}_{group}.pdb")
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> EngineError + '_ {
    move |source| EngineError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn create_folder(folder: &Path) -> Result<(), EngineError> {
    fs::create_dir_all(folder).map_err(io_error(folder))
}

impl<E: Engine> Analyser<E> {
    /// Writes every structure of `group` as `{prefix}rank_{rank}_{group}.pdb`.
    ///
    /// Returns the written paths in error-table order.
    pub fn dump_structures(
        &self,
        group: PoseGroup,
        folder: &Path,
        prefix: &str,
    ) -> Result<Vec<PathBuf>, EngineError> {
        let entries = self.registry.iter(group, &self.errors)?;
        create_folder(folder)?;
        let mut written = Vec::new();
        for entry in entries {
            let entry = entry?;
            let path = folder.join(dump_file_name(prefix, entry.rank, group));
            PdbFile::write_structure_to_path(entry.structure, &path).map_err(|e| {
                EngineError::Load {
                    path: path.clone(),
                    message: e.to_string(),
                }
            })?;
            written.push(path);
        }
        debug!(group = %group, count = written.len(), "Structures written");
        Ok(written)
    }

    /// Saves the catalog, the error matrices and every non-empty pose group.
    #[instrument(skip_all, name = "dump", fields(folder = %folder.display()))]
    pub fn dump(&self, folder: &Path) -> Result<(), EngineError> {
        create_folder(folder)?;
        self.catalog.write_csv_to_path(&folder.join(CATALOG_FILE_NAME))?;

        let matrices: BTreeMap<Rank, Vec<Vec<f64>>> = self
            .errors
            .iter()
            .map(|(rank, matrix)| (rank, matrix.rows()))
            .collect();
        let path = folder.join(ERRORS_FILE_NAME);
        let file = File::create(&path).map_err(io_error(&path))?;
        serde_json::to_writer(BufWriter::new(file), &matrices).map_err(|e| EngineError::Load {
            path: path.clone(),
            message: e.to_string(),
        })?;

        for group in self.registry.loaded_groups() {
            self.dump_structures(group, folder, "")?;
        }
        info!(groups = ?self.registry.loaded_groups(), "Analysis saved");
        Ok(())
    }
}

impl Analyser<ReferenceEngine> {
    /// Reloads a folder written by [`Analyser::dump`] with the bundled engine.
    pub fn load(folder: impl AsRef<Path>, config: AnalysisConfig) -> Result<Self, EngineError> {
        Self::load_with_engine(folder, config, ReferenceEngine::new())
    }
}

impl<E: Engine> Analyser<E> {
    /// Reloads a folder written by [`Analyser::dump`]: the catalog, the error
    /// matrices and each dumped structure, put back into the group named in its
    /// file name.
    #[instrument(skip_all, name = "load", fields(folder = %folder.as_ref().display()))]
    pub fn load_with_engine(
        folder: impl AsRef<Path>,
        config: AnalysisConfig,
        engine: E,
    ) -> Result<Self, EngineError> {
        let folder = folder.as_ref().to_path_buf();
        let catalog = Catalog::read_csv_from_path(&folder.join(CATALOG_FILE_NAME))?;
        let errors = read_errors(&folder.join(ERRORS_FILE_NAME), &catalog)?;

        let mut registry = PoseRegistry::new();
        let listing = fs::read_dir(&folder).map_err(io_error(&folder))?;
        for entry in listing {
            let entry = entry.map_err(io_error(&folder))?;
            let file_name = entry.file_name().to_string_lossy().to_string();
            let Some(caps) = DUMPED_STRUCTURE.captures(&file_name) else {
                continue;
            };
            let (Ok(rank), Ok(group)) = (caps["rank"].parse::<Rank>(), caps["group"].parse::<PoseGroup>())
            else {
                continue;
            };
            registry.restore(group, rank, load_structure(&entry.path())?);
            debug!(rank, group = %group, "Structure restored");
        }
        info!(
            models = catalog.len(),
            groups = ?registry.loaded_groups(),
            "Analysis reloaded"
        );
        Ok(Self::from_parts(folder, catalog, registry, errors, config, engine))
    }
}

/// Error matrices in catalog order, followed by any ranks the catalog lacks.
fn read_errors(path: &Path, catalog: &Catalog) -> Result<ErrorTable, EngineError> {
    let file = File::open(path).map_err(io_error(path))?;
    let load_error = |message: String| EngineError::Load {
        path: path.to_path_buf(),
        message,
    };
    let mut rows: BTreeMap<Rank, Vec<Vec<f64>>> =
        serde_json::from_reader(BufReader::new(file)).map_err(|e| load_error(e.to_string()))?;

    let mut table = ErrorTable::new();
    let ordered: Vec<Rank> = catalog
        .ranks()
        .into_iter()
        .chain(rows.keys().copied())
        .collect();
    for rank in ordered {
        if let Some(matrix) = rows.remove(&rank) {
            let matrix = ErrorMatrix::from_rows(&matrix).map_err(|e| load_error(e.to_string()))?;
            table.insert(rank, matrix);
        }
    }
    Ok(table)
}

use crate::core::catalog::Rank;
use crate::core::catalog::enrich::enrich;
use crate::core::catalog::record::build_catalog;
use crate::core::catalog::table::Catalog;
use crate::core::io::error_matrix::{ErrorMatrix, read_sibling, sibling_path};
use crate::core::io::pdb::PdbFile;
use crate::core::io::traits::StructureFile;
use crate::core::models::structure::Structure;
use crate::engine::config::AnalysisConfig;
use crate::engine::error::EngineError;
use crate::engine::reference::ReferenceEngine;
use crate::engine::registry::{ErrorTable, PoseGroup, PoseRegistry};
use crate::engine::traits::Engine;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Reads a structure file.
///
/// # Errors
///
/// Any read or parse failure becomes [`EngineError::Load`].
pub fn load_structure(path: &Path) -> Result<Structure, EngineError> {
    PdbFile::read_from_path(path)
        .map(|(structure, _)| structure)
        .map_err(|e| EngineError::Load {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

/// Reads the error matrix stored next to a structure file.
///
/// With `expected_residues`, the matrix must cover exactly that many residues.
pub fn load_error_matrix(
    structure_path: &Path,
    expected_residues: Option<usize>,
) -> Result<ErrorMatrix, EngineError> {
    read_sibling(structure_path, expected_residues).map_err(|e| EngineError::Load {
        path: sibling_path(structure_path),
        message: e.to_string(),
    })
}

/// A prediction run under analysis: its catalog, the structures of every pose
/// group and the per-rank error matrices.
///
/// The workflows in this module are methods on the analyser; each takes the
/// parameters it needs explicitly and reads the rest from its
/// [`AnalysisConfig`].
#[derive(Debug)]
pub struct Analyser<E: Engine = ReferenceEngine> {
    pub(super) folder: PathBuf,
    pub(super) catalog: Catalog,
    pub(super) registry: PoseRegistry,
    pub(super) errors: ErrorTable,
    pub(super) config: AnalysisConfig,
    pub(super) engine: E,
}

impl Analyser<ReferenceEngine> {
    /// Scans `folder` with the bundled [`ReferenceEngine`].
    pub fn new(
        folder: impl AsRef<Path>,
        load_structures: bool,
        config: AnalysisConfig,
    ) -> Result<Self, EngineError> {
        Self::with_engine(folder, load_structures, config, ReferenceEngine::new())
    }
}

impl<E: Engine> Analyser<E> {
    /// Catalogs a prediction folder, joins the run's scores and loads the error
    /// matrix of every rank; with `load_structures` the structures are read into
    /// the original group as well.
    ///
    /// An empty folder gives an empty analyser rather than an error.
    #[instrument(skip_all, name = "analyser_setup", fields(folder = %folder.as_ref().display()))]
    pub fn with_engine(
        folder: impl AsRef<Path>,
        load_structures: bool,
        config: AnalysisConfig,
        engine: E,
    ) -> Result<Self, EngineError> {
        let folder = folder.as_ref().to_path_buf();
        let mut catalog = build_catalog(&folder)?;
        enrich(&mut catalog, &folder)?;
        info!(models = catalog.len(), "Catalogued prediction folder");

        let mut registry = PoseRegistry::new();
        let mut errors = ErrorTable::new();
        for record in catalog.records() {
            let expected = if load_structures {
                let structure = load_structure(&record.path)?;
                let residues = structure.total_residue();
                registry.insert_original(record.rank, structure);
                Some(residues)
            } else {
                None
            };
            errors.insert(record.rank, load_error_matrix(&record.path, expected)?);
            debug!(rank = record.rank, file = %record.name, "Loaded model");
        }

        Ok(Self {
            folder,
            catalog,
            registry,
            errors,
            config,
            engine,
        })
    }

    pub(super) fn from_parts(
        folder: PathBuf,
        catalog: Catalog,
        registry: PoseRegistry,
        errors: ErrorTable,
        config: AnalysisConfig,
        engine: E,
    ) -> Self {
        Self {
            folder,
            catalog,
            registry,
            errors,
            config,
            engine,
        }
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn registry(&self) -> &PoseRegistry {
        &self.registry
    }

    pub fn errors(&self) -> &ErrorTable {
        &self.errors
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn structure(&self, group: PoseGroup, rank: Rank) -> Result<&Structure, EngineError> {
        self.registry.get(group, rank)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::enrich::{CONFIDENCE_COLUMN, PTM_SCORE_COLUMN};
    use crate::test_utils::{write_result_folder, write_settings};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn new_loads_catalog_structures_and_errors() {
        let dir = tempdir().unwrap();
        write_result_folder(dir.path(), &[1, 2, 3], 3, 2);
        write_settings(dir.path(), &[1, 2]);

        let analyser = Analyser::new(dir.path(), true, AnalysisConfig::default()).unwrap();

        assert_eq!(analyser.catalog().len(), 3);
        assert_eq!(analyser.registry().len(PoseGroup::Original), 3);
        assert_eq!(analyser.errors().len(), 3);
        assert_eq!(analyser.errors().get(2).unwrap().size(), 5);
        assert_eq!(analyser.catalog().float(CONFIDENCE_COLUMN, 1), Some(89.0));
        assert_eq!(analyser.catalog().float(PTM_SCORE_COLUMN, 3), None);
        assert_eq!(
            analyser.structure(PoseGroup::Original, 3).unwrap().num_chains(),
            2
        );
    }

    #[test]
    fn without_structures_only_errors_are_loaded() {
        let dir = tempdir().unwrap();
        write_result_folder(dir.path(), &[1, 2], 3, 2);

        let analyser = Analyser::new(dir.path(), false, AnalysisConfig::default()).unwrap();

        assert!(analyser.registry().is_empty(PoseGroup::Original));
        assert_eq!(analyser.errors().ranks(), analyser.catalog().ranks().as_slice());
        let mut ranks = analyser.errors().ranks().to_vec();
        ranks.sort_unstable();
        assert_eq!(ranks, vec![1, 2]);
    }

    #[test]
    fn empty_folder_gives_empty_analyser() {
        let dir = tempdir().unwrap();
        let analyser = Analyser::new(dir.path(), true, AnalysisConfig::default()).unwrap();
        assert!(analyser.catalog().is_empty());
        assert!(analyser.errors().is_empty());
    }

    #[test]
    fn missing_error_sibling_is_a_load_error() {
        let dir = tempdir().unwrap();
        let names = write_result_folder(dir.path(), &[1], 3, 2);
        fs::remove_file(dir.path().join(names[0].replace(".pdb", "_scores.json"))).unwrap();

        let err = Analyser::new(dir.path(), true, AnalysisConfig::default()).unwrap_err();
        match err {
            EngineError::Load { path, .. } => {
                assert!(path.to_string_lossy().ends_with("_scores.json"));
            }
            other => panic!("expected a load error, got {other:?}"),
        }
    }

    #[test]
    fn error_matrix_of_wrong_size_is_a_load_error() {
        let dir = tempdir().unwrap();
        let names = write_result_folder(dir.path(), &[1], 3, 2);
        let sibling = dir.path().join(names[0].replace(".pdb", "_scores.json"));
        fs::write(&sibling, r#"{"pae": [[0.0, 1.0], [1.0, 0.0]]}"#).unwrap();

        let err = Analyser::new(dir.path(), true, AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, EngineError::Load { .. }));
    }

    #[test]
    fn unparsable_structure_is_a_load_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.pdb");
        fs::write(&path, "ATOM      1  CA  SER A   x       nonsense\n").unwrap();
        assert!(matches!(
            load_structure(&path),
            Err(EngineError::Load { .. })
        ));
        assert!(matches!(
            load_structure(&dir.path().join("absent.pdb")),
            Err(EngineError::Load { .. })
        ));
    }
}

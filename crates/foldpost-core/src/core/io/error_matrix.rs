use nalgebra::DMatrix;
use serde_json::Value;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// JSON key under which prediction pipelines store the pairwise error matrix.
pub const ERROR_MATRIX_KEY: &str = "pae";
const SIBLING_SUFFIX: &str = "_scores.json";

/// Square matrix of pairwise residue distance-error estimates, 0-based.
///
/// Row `i`, column `j` is the expected positional error of residue `j + 1` when
/// the structure is aligned on residue `i + 1`. Immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorMatrix {
    values: DMatrix<f64>,
}

#[derive(Debug, Error)]
pub enum ErrorMatrixError {
    #[error("I/O error for '{path}': {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("JSON parsing error for '{path}': {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Key 'pae' missing or not an array")]
    MissingKey,
    #[error("Non-numeric value at row {row}, column {column}")]
    NotNumeric { row: usize, column: usize },
    #[error("Matrix is not square: {rows} rows, row {row} has {columns} columns")]
    NotSquare {
        rows: usize,
        row: usize,
        columns: usize,
    },
    #[error("Flat array of {0} values cannot be reshaped into a square matrix")]
    NotReshapable(usize),
    #[error("Matrix size {found} does not match the structure's {expected} residues")]
    SizeMismatch { expected: usize, found: usize },
}

impl ErrorMatrix {
    /// Builds a matrix from row-major rows. All rows must have the row count as length.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, ErrorMatrixError> {
        let n = rows.len();
        for (row, values) in rows.iter().enumerate() {
            if values.len() != n {
                return Err(ErrorMatrixError::NotSquare {
                    rows: n,
                    row,
                    columns: values.len(),
                });
            }
        }
        Ok(Self {
            values: DMatrix::from_fn(n, n, |i, j| rows[i][j]),
        })
    }

    /// Reshapes a flat row-major array of n² values.
    pub fn from_flat(values: &[f64]) -> Result<Self, ErrorMatrixError> {
        let n = (values.len() as f64).sqrt().round() as usize;
        if n * n != values.len() {
            return Err(ErrorMatrixError::NotReshapable(values.len()));
        }
        Ok(Self {
            values: DMatrix::from_row_slice(n, n, values),
        })
    }

    /// Number of residues covered.
    pub fn size(&self) -> usize {
        self.values.nrows()
    }

    /// Error between two residues given by 1-based internal index.
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        if i == 0 || j == 0 || i > self.size() || j > self.size() {
            return None;
        }
        Some(self.values[(i - 1, j - 1)])
    }

    pub fn rows(&self) -> Vec<Vec<f64>> {
        self.values
            .row_iter()
            .map(|row| row.iter().copied().collect())
            .collect()
    }

    /// Parses the JSON document of a sibling error file.
    pub fn from_json(value: &Value) -> Result<Self, ErrorMatrixError> {
        let data = value
            .get(ERROR_MATRIX_KEY)
            .and_then(Value::as_array)
            .ok_or(ErrorMatrixError::MissingKey)?;

        if data.iter().all(Value::is_number) {
            let flat = data
                .iter()
                .enumerate()
                .map(|(i, v)| {
                    v.as_f64()
                        .ok_or(ErrorMatrixError::NotNumeric { row: 0, column: i })
                })
                .collect::<Result<Vec<_>, _>>()?;
            return Self::from_flat(&flat);
        }

        let rows = data
            .iter()
            .enumerate()
            .map(|(row, values)| {
                values
                    .as_array()
                    .ok_or(ErrorMatrixError::NotNumeric { row, column: 0 })?
                    .iter()
                    .enumerate()
                    .map(|(column, v)| v.as_f64().ok_or(ErrorMatrixError::NotNumeric { row, column }))
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_rows(&rows)
    }
}

/// Path of the error file that sits next to a structure file:
/// `model.pdb` becomes `model_scores.json`.
pub fn sibling_path(structure_path: &Path) -> PathBuf {
    let stem = structure_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    structure_path.with_file_name(format!("{stem}{SIBLING_SUFFIX}"))
}

/// Loads the sibling error matrix of a structure file.
///
/// When `expected_size` is given, the matrix must cover exactly that many residues.
pub fn read_sibling(
    structure_path: &Path,
    expected_size: Option<usize>,
) -> Result<ErrorMatrix, ErrorMatrixError> {
    let path = sibling_path(structure_path);
    let content = fs::read_to_string(&path).map_err(|source| ErrorMatrixError::Io {
        path: path.clone(),
        source,
    })?;
    let value: Value = serde_json::from_str(&content).map_err(|source| ErrorMatrixError::Json {
        path: path.clone(),
        source,
    })?;
    let matrix = ErrorMatrix::from_json(&value)?;
    if let Some(expected) = expected_size {
        if matrix.size() != expected {
            return Err(ErrorMatrixError::SizeMismatch {
                expected,
                found: matrix.size(),
            });
        }
    }
    Ok(matrix)
}

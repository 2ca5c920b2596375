use super::record::ModelRecord;
use super::{CatalogError, Rank};
use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

const FIXED_COLUMNS: [&str; 6] = ["name", "path", "rank", "model", "seed", "relaxed"];

/// A typed, appended catalog column; one cell per row.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Float(Vec<Option<f64>>),
    Count(Vec<Option<usize>>),
    /// Residue index lists; a missing value is an empty list.
    Residues(Vec<Vec<usize>>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Float(v) => v.len(),
            Column::Count(v) => v.len(),
            Column::Residues(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn cell(&self, row: usize) -> String {
        match self {
            Column::Float(v) => v[row].map(|x| format!("{x:?}")).unwrap_or_default(),
            Column::Count(v) => v[row].map(|x| x.to_string()).unwrap_or_default(),
            Column::Residues(v) => {
                let items: Vec<String> = v[row].iter().map(usize::to_string).collect();
                format!("[{}]", items.join(" "))
            }
        }
    }
}

/// Types that can fill a catalog column.
pub trait ColumnValue: Sized {
    fn into_column(values: Vec<Option<Self>>) -> Column;
}

impl ColumnValue for f64 {
    fn into_column(values: Vec<Option<Self>>) -> Column {
        Column::Float(values)
    }
}

impl ColumnValue for usize {
    fn into_column(values: Vec<Option<Self>>) -> Column {
        Column::Count(values)
    }
}

impl ColumnValue for Vec<usize> {
    fn into_column(values: Vec<Option<Self>>) -> Column {
        Column::Residues(values.into_iter().map(Option::unwrap_or_default).collect())
    }
}

/// Ordered table of predicted models, one row per rank.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    records: Vec<ModelRecord>,
    columns: Vec<(String, Column)>,
}

impl Catalog {
    pub fn new(records: Vec<ModelRecord>) -> Self {
        Self {
            records,
            columns: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ModelRecord] {
        &self.records
    }

    /// Ranks in row order.
    pub fn ranks(&self) -> Vec<Rank> {
        self.records.iter().map(|r| r.rank).collect()
    }

    pub fn record(&self, rank: Rank) -> Option<&ModelRecord> {
        self.records.iter().find(|r| r.rank == rank)
    }

    fn row_of(&self, rank: Rank) -> Option<usize> {
        self.records.iter().position(|r| r.rank == rank)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|(n, _)| n == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, c)| c)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    pub fn float(&self, name: &str, rank: Rank) -> Option<f64> {
        let row = self.row_of(rank)?;
        match self.column(name)? {
            Column::Float(v) => v[row],
            _ => None,
        }
    }

    pub fn count(&self, name: &str, rank: Rank) -> Option<usize> {
        let row = self.row_of(rank)?;
        match self.column(name)? {
            Column::Count(v) => v[row],
            _ => None,
        }
    }

    pub fn residues(&self, name: &str, rank: Rank) -> Option<&[usize]> {
        let row = self.row_of(rank)?;
        match self.column(name)? {
            Column::Residues(v) => Some(&v[row]),
            _ => None,
        }
    }

    fn put(&mut self, name: &str, column: Column) {
        debug_assert_eq!(column.len(), self.records.len());
        match self.columns.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = column,
            None => self.columns.push((name.to_string(), column)),
        }
    }

    /// Sets a column by asking for the value of each row's rank, in row order.
    ///
    /// An existing column of the same name is replaced in place.
    pub fn set_column_by_rank<T: ColumnValue>(
        &mut self,
        name: &str,
        mut value_for: impl FnMut(Rank) -> Option<T>,
    ) {
        let values = self.records.iter().map(|r| value_for(r.rank)).collect();
        self.put(name, T::into_column(values));
    }

    /// Fallible variant of [`Catalog::set_column_by_rank`]; the column is left
    /// untouched when any lookup fails.
    pub fn try_set_column_by_rank<T: ColumnValue, E>(
        &mut self,
        name: &str,
        mut value_for: impl FnMut(Rank) -> Result<Option<T>, E>,
    ) -> Result<(), E> {
        let values = self
            .records
            .iter()
            .map(|r| value_for(r.rank))
            .collect::<Result<Vec<_>, E>>()?;
        self.put(name, T::into_column(values));
        Ok(())
    }

    /// Left-joins a rank-keyed map as a column; ranks absent from the map are null.
    pub fn join_by_rank<T: ColumnValue + Clone>(&mut self, name: &str, values: &BTreeMap<Rank, T>) {
        self.set_column_by_rank(name, |rank| values.get(&rank).cloned());
    }

    /// Writes the catalog as CSV: fixed record columns, then appended columns.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut out = csv::Writer::from_writer(writer);
        let header: Vec<&str> = FIXED_COLUMNS
            .iter()
            .copied()
            .chain(self.column_names())
            .collect();
        out.write_record(&header)?;
        for (row, record) in self.records.iter().enumerate() {
            let mut cells = vec![
                record.name.clone(),
                record.path.display().to_string(),
                record.rank.to_string(),
                record.model.to_string(),
                record.seed.to_string(),
                record.relaxed.to_string(),
            ];
            cells.extend(self.columns.iter().map(|(_, c)| c.cell(row)));
            out.write_record(&cells)?;
        }
        out.flush()?;
        Ok(())
    }

    pub fn write_csv_to_path(&self, path: &Path) -> Result<(), CatalogError> {
        let file = File::create(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.write_csv(file).map_err(|source| CatalogError::Csv {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reads a catalog written by [`Catalog::write_csv`].
    ///
    /// Column types are inferred from the cells: bracketed lists are residue
    /// columns, all-integer columns are counts, anything else is a float column.
    pub fn read_csv<R: Read>(reader: R, origin: &Path) -> Result<Self, CatalogError> {
        let csv_error = |source| CatalogError::Csv {
            path: origin.to_path_buf(),
            source,
        };
        let mut input = csv::Reader::from_reader(reader);
        let headers = input.headers().map_err(csv_error)?.clone();
        let index_of = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| CatalogError::MissingColumn(name.to_string()))
        };
        let fixed = FIXED_COLUMNS
            .iter()
            .map(|name| index_of(name))
            .collect::<Result<Vec<_>, _>>()?;
        let extra: Vec<(usize, String)> = headers
            .iter()
            .enumerate()
            .filter(|(_, h)| !FIXED_COLUMNS.contains(h))
            .map(|(i, h)| (i, h.to_string()))
            .collect();

        let mut records = Vec::new();
        let mut raw_columns: Vec<Vec<String>> = vec![Vec::new(); extra.len()];
        let mut seen = HashSet::new();
        for (row, result) in input.records().enumerate() {
            let fields = result.map_err(csv_error)?;
            let field = |k: usize| fields.get(fixed[k]).unwrap_or_default();
            let invalid = |k: usize| CatalogError::InvalidValue {
                column: FIXED_COLUMNS[k].to_string(),
                row,
                value: field(k).to_string(),
            };
            let record = ModelRecord {
                name: field(0).to_string(),
                path: PathBuf::from(field(1)),
                rank: field(2).parse().map_err(|_| invalid(2))?,
                model: field(3).parse().map_err(|_| invalid(3))?,
                seed: field(4).parse().map_err(|_| invalid(4))?,
                relaxed: field(5).parse().map_err(|_| invalid(5))?,
            };
            if !seen.insert(record.rank) {
                return Err(CatalogError::DuplicateRank(record.rank));
            }
            records.push(record);
            for (slot, (i, _)) in raw_columns.iter_mut().zip(&extra) {
                slot.push(fields.get(*i).unwrap_or_default().to_string());
            }
        }

        let mut catalog = Catalog::new(records);
        for ((_, name), cells) in extra.into_iter().zip(raw_columns) {
            let column = parse_column(&name, &cells)?;
            catalog.put(&name, column);
        }
        Ok(catalog)
    }

    pub fn read_csv_from_path(path: &Path) -> Result<Self, CatalogError> {
        let file = File::open(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::read_csv(file, path)
    }
}

fn parse_column(name: &str, cells: &[String]) -> Result<Column, CatalogError> {
    let invalid = |row: usize| CatalogError::InvalidValue {
        column: name.to_string(),
        row,
        value: cells[row].clone(),
    };
    let filled: Vec<&String> = cells.iter().filter(|c| !c.is_empty()).collect();

    if !filled.is_empty() && filled.iter().all(|c| c.starts_with('[')) {
        return cells
            .iter()
            .enumerate()
            .map(|(row, cell)| {
                cell.trim_start_matches('[')
                    .trim_end_matches(']')
                    .split_whitespace()
                    .map(|item| item.parse::<usize>().map_err(|_| invalid(row)))
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Column::Residues);
    }

    if !filled.is_empty() && filled.iter().all(|c| c.parse::<usize>().is_ok()) {
        return Ok(Column::Count(
            cells.iter().map(|c| c.parse::<usize>().ok()).collect(),
        ));
    }

    cells
        .iter()
        .enumerate()
        .map(|(row, cell)| {
            if cell.is_empty() {
                Ok(None)
            } else {
                cell.parse::<f64>().map(Some).map_err(|_| invalid(row))
            }
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Column::Float)
}

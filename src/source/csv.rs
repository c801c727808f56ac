//! Streaming CSV source

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use log::debug;
use rustc_hash::FxHashMap;

use super::Source;
use crate::diff::RunContext;
use crate::error::{DiffError, Result};
use crate::model::convert::parse_cell;
use crate::model::{CellValue, ColumnModel, ColumnType, Row, TableModel};

/// How a CSV file maps onto a table model
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Key columns; empty keys on a synthetic `<ROW_NUM>` column
    pub key_columns: Vec<String>,
    /// Declared column types; undeclared columns infer per cell
    pub column_types: FxHashMap<String, ColumnType>,
    /// chrono patterns for temporal columns
    pub column_formats: FxHashMap<String, String>,
    pub delimiter: u8,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            key_columns: Vec::new(),
            column_types: FxHashMap::default(),
            column_formats: FxHashMap::default(),
            delimiter: b',',
        }
    }
}

/// Reads one record at a time from a CSV file already sorted by key
pub struct CsvSource {
    path: PathBuf,
    model: TableModel,
    delimiter: u8,
    reader: Option<csv::Reader<BufReader<File>>>,
    record: csv::StringRecord,
    last_index: u64,
    exhausted: bool,
}

impl CsvSource {
    /// Read the header of `path` and build the table model from it
    pub fn new(path: impl AsRef<Path>, options: &CsvOptions) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut reader = Self::reader(&path, options.delimiter)?;
        let headers = reader.headers()?.clone();

        let columns: Vec<ColumnModel> = headers
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let column_type = options.column_types.get(name).copied().unwrap_or_default();
                let column = ColumnModel::new(i, name, column_type);
                match options.column_formats.get(name) {
                    Some(format) => column.with_format(format.clone()),
                    None => column,
                }
            })
            .collect();

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let model = if options.key_columns.is_empty() {
            TableModel::with_row_num(name, columns)?
        } else {
            let keys: Vec<&str> = options.key_columns.iter().map(String::as_str).collect();
            TableModel::with_key_names(name, columns, &keys)?
        };
        debug!("CSV source {} keyed on {:?}", path.display(), model.key_column_names());

        Ok(Self {
            path,
            model,
            delimiter: options.delimiter,
            reader: None,
            record: csv::StringRecord::new(),
            last_index: 0,
            exhausted: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn reader(path: &Path, delimiter: u8) -> Result<csv::Reader<BufReader<File>>> {
        let file = File::open(path)?;
        Ok(csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .delimiter(delimiter)
            .from_reader(BufReader::new(file)))
    }

    fn has_row_num(&self) -> bool {
        self.model.column_at(0).is_some_and(|c| c.is_row_num())
    }

    fn to_row(&self) -> Result<Row> {
        let offset = usize::from(self.has_row_num());
        let mut row = Vec::with_capacity(self.model.column_count());
        if offset == 1 {
            row.push(CellValue::Int(self.last_index as i64));
        }
        for column in &self.model.columns()[offset..] {
            // Short records pad with nulls
            let raw = self.record.get(column.index() - offset).unwrap_or("");
            let value = parse_cell(raw, column.column_type(), column.format()).map_err(|e| {
                DiffError::conversion(
                    raw,
                    column.column_type().to_string(),
                    format!(
                        "{}:{} column {}: {}",
                        self.path.display(),
                        self.last_index + 1,
                        column.name(),
                        e
                    ),
                )
            })?;
            row.push(value);
        }
        Ok(row)
    }
}

impl Source for CsvSource {
    fn open(&mut self, _run: &RunContext) -> Result<()> {
        self.reader = Some(Self::reader(&self.path, self.delimiter)?);
        self.last_index = 0;
        self.exhausted = false;
        Ok(())
    }

    fn close(&mut self, _run: &RunContext) -> Result<()> {
        self.reader = None;
        Ok(())
    }

    fn model(&self) -> &TableModel {
        &self.model
    }

    fn next_row(&mut self) -> Result<Option<Row>> {
        if self.exhausted {
            return Ok(None);
        }
        let reader = self.reader.as_mut().ok_or_else(|| {
            DiffError::invalid_argument(format!("source {} read before open", self.path.display()))
        })?;
        if !reader.read_record(&mut self.record)? {
            self.exhausted = true;
            return Ok(None);
        }
        self.last_index += 1;
        self.to_row().map(Some)
    }

    fn last_index(&self) -> u64 {
        self.last_index
    }
}

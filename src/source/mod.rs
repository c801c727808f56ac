//! Row sources feeding the diff engine

mod csv;

use crate::diff::RunContext;
use crate::error::{DiffError, Result};
use crate::model::{Row, TableModel};

pub use self::csv::{CsvOptions, CsvSource};

/// A key-sorted stream of rows for one side of a comparison
pub trait Source {
    fn open(&mut self, run: &RunContext) -> Result<()>;

    fn close(&mut self, run: &RunContext) -> Result<()>;

    /// Shape of the rows this source yields
    fn model(&self) -> &TableModel;

    /// Next row in key order, `None` once exhausted (and every call after)
    fn next_row(&mut self) -> Result<Option<Row>>;

    /// 1-based index of the last row handed out, 0 before the first
    fn last_index(&self) -> u64;
}

/// Source over rows already held in memory
#[derive(Debug, Clone)]
pub struct MemorySource {
    model: TableModel,
    rows: Vec<Row>,
    position: usize,
    is_open: bool,
}

impl MemorySource {
    pub fn new(model: TableModel, rows: Vec<Row>) -> Self {
        Self {
            model,
            rows,
            position: 0,
            is_open: false,
        }
    }
}

impl Source for MemorySource {
    fn open(&mut self, _run: &RunContext) -> Result<()> {
        self.position = 0;
        self.is_open = true;
        Ok(())
    }

    fn close(&mut self, _run: &RunContext) -> Result<()> {
        self.is_open = false;
        Ok(())
    }

    fn model(&self) -> &TableModel {
        &self.model
    }

    fn next_row(&mut self) -> Result<Option<Row>> {
        if !self.is_open {
            return Err(DiffError::invalid_argument(format!(
                "source {} read before open",
                self.model.name()
            )));
        }
        let row = self.rows.get(self.position).cloned();
        if row.is_some() {
            self.position += 1;
        }
        Ok(row)
    }

    fn last_index(&self) -> u64 {
        self.position as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CellValue, ColumnModel, ColumnType};

    #[test]
    fn test_memory_source_exhaustion_is_idempotent() {
        let columns = vec![ColumnModel::new(0, "id", ColumnType::Integer)];
        let model = TableModel::new("t", columns, vec![0]).unwrap();
        let mut source = MemorySource::new(model, vec![vec![CellValue::Int(1)]]);
        let run = RunContext::new();

        assert!(source.next_row().is_err());
        source.open(&run).unwrap();
        assert_eq!(source.next_row().unwrap(), Some(vec![CellValue::Int(1)]));
        assert_eq!(source.last_index(), 1);
        assert_eq!(source.next_row().unwrap(), None);
        assert_eq!(source.next_row().unwrap(), None);
        assert_eq!(source.last_index(), 1);
        source.close(&run).unwrap();
    }
}

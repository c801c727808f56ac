//! Sinks receiving the diffs a run emits

mod json;
mod report;

use crate::diff::{Diff, RunContext};
use crate::error::{DiffError, Result};

pub use json::JsonSink;
pub use report::{ReportOptions, ReportSink};

/// Which sink implementation is in use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkKind {
    Memory,
    Json,
    Report,
}

/// Destination for diffs, called strictly sequentially by the engine
pub trait Sink {
    fn open(&mut self, run: &RunContext) -> Result<()>;

    fn close(&mut self, run: &RunContext) -> Result<()>;

    /// Take ownership of one diff; fails before `open` and after `close`
    fn record(&mut self, diff: Diff, run: &RunContext) -> Result<()>;

    fn row_diff_count(&self) -> u64;

    fn column_diff_count(&self) -> u64;

    fn diff_count(&self) -> u64 {
        self.row_diff_count() + self.column_diff_count()
    }

    fn kind(&self) -> SinkKind;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Lifecycle {
    #[default]
    Created,
    Open,
    Closed,
}

/// Lifecycle and counters shared by sink implementations
#[derive(Debug, Clone, Default)]
pub struct SinkState {
    lifecycle: Lifecycle,
    row_diffs: u64,
    column_diffs: u64,
}

impl SinkState {
    pub fn open(&mut self) -> Result<()> {
        if self.lifecycle != Lifecycle::Created {
            return Err(DiffError::sink_state("sink opened twice"));
        }
        self.lifecycle = Lifecycle::Open;
        Ok(())
    }

    pub fn close(&mut self) -> Result<()> {
        if self.lifecycle != Lifecycle::Open {
            return Err(DiffError::sink_state("sink closed while not open"));
        }
        self.lifecycle = Lifecycle::Closed;
        Ok(())
    }

    /// Check the sink accepts records and count `diff`
    pub fn count(&mut self, diff: &Diff) -> Result<()> {
        match self.lifecycle {
            Lifecycle::Created => return Err(DiffError::sink_state("record called before open")),
            Lifecycle::Closed => return Err(DiffError::sink_state("record called after close")),
            Lifecycle::Open => {}
        }
        if diff.is_row_diff() {
            self.row_diffs += 1;
        } else {
            self.column_diffs += 1;
        }
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.lifecycle == Lifecycle::Open
    }

    pub fn row_diffs(&self) -> u64 {
        self.row_diffs
    }

    pub fn column_diffs(&self) -> u64 {
        self.column_diffs
    }
}

/// Keeps every diff in emission order
#[derive(Debug, Default)]
pub struct MemorySink {
    state: SinkState,
    diffs: Vec<Diff>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diffs(&self) -> &[Diff] {
        &self.diffs
    }

    pub fn into_diffs(self) -> Vec<Diff> {
        self.diffs
    }
}

impl Sink for MemorySink {
    fn open(&mut self, _run: &RunContext) -> Result<()> {
        self.state.open()
    }

    fn close(&mut self, _run: &RunContext) -> Result<()> {
        self.state.close()
    }

    fn record(&mut self, diff: Diff, _run: &RunContext) -> Result<()> {
        self.state.count(&diff)?;
        self.diffs.push(diff);
        Ok(())
    }

    fn row_diff_count(&self) -> u64 {
        self.state.row_diffs()
    }

    fn column_diff_count(&self) -> u64 {
        self.state.column_diffs()
    }

    fn kind(&self) -> SinkKind {
        SinkKind::Memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{DiffKind, RowDiff, Side, TableComparison};
    use crate::model::{CellValue, ColumnModel, ColumnType, TableModel};
    use std::sync::Arc;

    fn row_diff() -> Diff {
        let columns = vec![ColumnModel::new(0, "id", ColumnType::Integer)];
        let model = TableModel::new("t", columns, vec![0]).unwrap();
        let plan = TableComparison::new(
            model.clone(),
            model,
            DiffKind::Both,
            Vec::new(),
            Vec::new(),
            [vec![0], vec![0]],
            10,
        )
        .unwrap();
        RowDiff::new(1, &[CellValue::Int(1)], Side::Left, Arc::new(plan)).into()
    }

    #[test]
    fn test_record_requires_open() {
        let run = RunContext::new();
        let mut sink = MemorySink::new();
        assert!(matches!(sink.record(row_diff(), &run), Err(DiffError::SinkState { .. })));

        sink.open(&run).unwrap();
        sink.record(row_diff(), &run).unwrap();
        assert_eq!(sink.row_diff_count(), 1);
        assert_eq!(sink.diff_count(), 1);

        sink.close(&run).unwrap();
        assert!(sink.record(row_diff(), &run).is_err());
        assert_eq!(sink.diffs().len(), 1);
    }

    #[test]
    fn test_lifecycle_misuse() {
        let mut state = SinkState::default();
        assert!(state.close().is_err());
        state.open().unwrap();
        assert!(state.open().is_err());
    }
}

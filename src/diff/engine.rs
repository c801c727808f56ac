//! Streaming merge diff over two key-sorted row sources

use std::cmp::Ordering;
use std::sync::Arc;

use chrono::{DateTime, Local};
use log::{debug, info, warn};

use super::entity::{ColumnDiff, ColumnDiffRow, Diff, RowDiff};
use super::plan::TableComparison;
use super::side::{DiffKind, Side};
use crate::error::{DiffError, Result};
use crate::model::{compare_keys, CellValue, Row};
use crate::sink::Sink;
use crate::source::Source;

/// State of a single diff run.
///
/// Created fresh for every run and handed back by [`DiffEngine::diff`].
#[derive(Debug, Clone)]
pub struct RunContext {
    lhs_name: String,
    rhs_name: String,
    kind: DiffKind,
    row_step: u64,
    column_step: u32,
    started_at: DateTime<Local>,
    finished_at: Option<DateTime<Local>>,
    row_diff_count: u64,
    column_diff_count: u64,
}

impl RunContext {
    pub fn new() -> Self {
        Self {
            lhs_name: String::new(),
            rhs_name: String::new(),
            kind: DiffKind::default(),
            row_step: 0,
            column_step: 0,
            started_at: Local::now(),
            finished_at: None,
            row_diff_count: 0,
            column_diff_count: 0,
        }
    }

    fn for_plan(plan: &TableComparison) -> Self {
        Self {
            lhs_name: plan.lhs_model().name().to_string(),
            rhs_name: plan.rhs_model().name().to_string(),
            kind: plan.kind(),
            ..Self::new()
        }
    }

    pub fn lhs_name(&self) -> &str {
        &self.lhs_name
    }

    pub fn rhs_name(&self) -> &str {
        &self.rhs_name
    }

    pub fn kind(&self) -> DiffKind {
        self.kind
    }

    /// Current (or, after the run, final) row step
    pub fn row_step(&self) -> u64 {
        self.row_step
    }

    /// Column step within the current row pair
    pub fn column_step(&self) -> u32 {
        self.column_step
    }

    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Local>> {
        self.finished_at
    }

    pub fn row_diff_count(&self) -> u64 {
        self.row_diff_count
    }

    pub fn column_diff_count(&self) -> u64 {
        self.column_diff_count
    }

    pub fn diff_count(&self) -> u64 {
        self.row_diff_count + self.column_diff_count
    }

    fn finish(&mut self, sink: &dyn Sink) {
        self.row_diff_count = sink.row_diff_count();
        self.column_diff_count = sink.column_diff_count();
        self.finished_at = Some(Local::now());
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default)]
struct Opened {
    lhs: bool,
    rhs: bool,
    sink: bool,
}

/// Pending row and ordering state for one side
#[derive(Default)]
struct Cursor {
    buffered: Option<Row>,
    exhausted: bool,
    last_key: Option<Vec<CellValue>>,
}

impl Cursor {
    /// Pull a row unless one is already buffered or the source is done
    fn fill(&mut self, source: &mut dyn Source, plan: &TableComparison, side: Side) -> Result<()> {
        if self.buffered.is_some() || self.exhausted {
            return Ok(());
        }
        match source.next_row()? {
            Some(row) => {
                let key = plan.row_key_values(&row, side);
                if let Some(last) = &self.last_key {
                    if compare_keys(&key, last) == Ordering::Less {
                        return Err(DiffError::OutOfOrder {
                            side,
                            row: source.last_index(),
                        });
                    }
                }
                self.last_key = Some(key);
                self.buffered = Some(row);
            }
            None => self.exhausted = true,
        }
        Ok(())
    }
}

/// Merge-join driver. Stateless; every call to [`diff`](Self::diff) is an
/// independent run.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiffEngine;

impl DiffEngine {
    pub fn new() -> Self {
        Self
    }

    /// Walk both sources once in key order and send every difference to `sink`.
    ///
    /// Both sources must be sorted ascending by the plan's key. The run stops
    /// when both sources are exhausted or once the sink holds `max_diffs`
    /// diffs (checked between row steps). Sources and sink are closed on the
    /// way out whether or not the run failed.
    pub fn diff(
        &self,
        lhs: &mut dyn Source,
        rhs: &mut dyn Source,
        sink: &mut dyn Sink,
        plan: Arc<TableComparison>,
    ) -> Result<RunContext> {
        let mut run = RunContext::for_plan(&plan);
        debug!(
            "diff run started: {} vs {} ({} diff, max {})",
            run.lhs_name,
            run.rhs_name,
            plan.kind(),
            plan.max_diffs()
        );

        let mut opened = Opened::default();
        let outcome = self.open_and_merge(lhs, rhs, sink, &plan, &mut run, &mut opened);
        let closed = close_all(lhs, rhs, sink, &run, &opened);
        run.finish(sink);

        match outcome {
            Ok(()) => {
                closed?;
                info!(
                    "diff run finished after {} row steps: {} row diffs, {} column diffs",
                    run.row_step, run.row_diff_count, run.column_diff_count
                );
                Ok(run)
            }
            Err(e) => {
                if let Err(close_error) = closed {
                    warn!("close after failed run also failed: {}", close_error);
                }
                Err(e)
            }
        }
    }

    fn open_and_merge(
        &self,
        lhs: &mut dyn Source,
        rhs: &mut dyn Source,
        sink: &mut dyn Sink,
        plan: &Arc<TableComparison>,
        run: &mut RunContext,
        opened: &mut Opened,
    ) -> Result<()> {
        lhs.open(run)?;
        opened.lhs = true;
        rhs.open(run)?;
        opened.rhs = true;
        sink.open(run)?;
        opened.sink = true;

        let mut left = Cursor::default();
        let mut right = Cursor::default();

        while sink.diff_count() < plan.max_diffs() {
            run.row_step += 1;
            run.column_step = 0;

            left.fill(lhs, plan, Side::Left)?;
            right.fill(rhs, plan, Side::Right)?;

            match (left.buffered.take(), right.buffered.take()) {
                (None, None) => break,
                (Some(row), None) => self.record_row(&row, Side::Left, sink, plan, run)?,
                (None, Some(row)) => self.record_row(&row, Side::Right, sink, plan, run)?,
                (Some(l), Some(r)) => match plan.row_comparator().compare(&l, &r) {
                    Ordering::Less => {
                        self.record_row(&l, Side::Left, sink, plan, run)?;
                        right.buffered = Some(r);
                    }
                    Ordering::Greater => {
                        self.record_row(&r, Side::Right, sink, plan, run)?;
                        left.buffered = Some(l);
                    }
                    Ordering::Equal => self.diff_columns(l, r, sink, plan, run)?,
                },
            }
        }

        if sink.diff_count() >= plan.max_diffs() {
            debug!("max diffs {} reached at row step {}", plan.max_diffs(), run.row_step);
        }
        Ok(())
    }

    fn record_row(
        &self,
        row: &[CellValue],
        side: Side,
        sink: &mut dyn Sink,
        plan: &Arc<TableComparison>,
        run: &RunContext,
    ) -> Result<()> {
        if !plan.kind().includes_rows() {
            return Ok(());
        }
        let diff = RowDiff::new(run.row_step, row, side, Arc::clone(plan));
        sink.record(Diff::Row(diff), run)
    }

    fn diff_columns(
        &self,
        lhs_row: Row,
        rhs_row: Row,
        sink: &mut dyn Sink,
        plan: &Arc<TableComparison>,
        run: &mut RunContext,
    ) -> Result<()> {
        if !plan.kind().includes_columns() {
            return Ok(());
        }

        let mut found = Vec::new();
        for &index in plan.diff_indexes() {
            run.column_step += 1;
            let comparison = &plan.map()[index];
            if comparison.is_diff(&lhs_row, &rhs_row, run)? {
                found.push((
                    run.column_step,
                    comparison.lhs_value(&lhs_row).clone(),
                    comparison.rhs_value(&rhs_row).clone(),
                ));
            }
        }
        if found.is_empty() {
            return Ok(());
        }

        let row = Arc::new(ColumnDiffRow::new(run.row_step, lhs_row, rhs_row, Arc::clone(plan)));
        for (column_step, lhs_value, rhs_value) in found {
            let diff = ColumnDiff::new(Arc::clone(&row), column_step, lhs_value, rhs_value);
            sink.record(Diff::Column(diff), run)?;
        }
        Ok(())
    }
}

/// Close whatever was opened; the first failure is returned, later ones logged
fn close_all(
    lhs: &mut dyn Source,
    rhs: &mut dyn Source,
    sink: &mut dyn Sink,
    run: &RunContext,
    opened: &Opened,
) -> Result<()> {
    let mut first: Option<DiffError> = None;
    let mut keep = |result: Result<()>, what: &str| {
        if let Err(e) = result {
            if first.is_none() {
                first = Some(e);
            } else {
                warn!("failed to close {}: {}", what, e);
            }
        }
    };

    if opened.sink {
        keep(sink.close(run), "sink");
    }
    if opened.rhs {
        keep(rhs.close(run), "rhs source");
    }
    if opened.lhs {
        keep(lhs.close(run), "lhs source");
    }

    match first {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Convenience function to run a diff with a fresh engine
pub fn run_diff(
    lhs: &mut dyn Source,
    rhs: &mut dyn Source,
    sink: &mut dyn Sink,
    plan: Arc<TableComparison>,
) -> Result<RunContext> {
    DiffEngine::new().diff(lhs, rhs, sink, plan)
}

//! Records of detected differences

use std::cmp::Ordering;
use std::sync::{Arc, OnceLock};

use super::plan::{DisplayValues, TableComparison};
use super::side::Side;
use crate::model::{CellValue, Row};

/// One detected difference.
///
/// Diffs order by row step, then column step. A row diff carries column
/// step -1 and so sorts before any column diff of the same row step.
#[derive(Debug, Clone)]
pub enum Diff {
    Row(RowDiff),
    Column(ColumnDiff),
}

impl Diff {
    pub fn row_step(&self) -> u64 {
        match self {
            Diff::Row(d) => d.row_step,
            Diff::Column(d) => d.row.row_step,
        }
    }

    pub fn column_step(&self) -> i64 {
        match self {
            Diff::Row(_) => -1,
            Diff::Column(d) => i64::from(d.column_step),
        }
    }

    pub fn is_row_diff(&self) -> bool {
        matches!(self, Diff::Row(_))
    }

    pub fn key_values(&self) -> &[CellValue] {
        match self {
            Diff::Row(d) => d.key_values(),
            Diff::Column(d) => d.row.key_values(),
        }
    }

    pub fn table_comparison(&self) -> &Arc<TableComparison> {
        match self {
            Diff::Row(d) => &d.plan,
            Diff::Column(d) => &d.row.plan,
        }
    }

    fn order_key(&self) -> (u64, i64) {
        (self.row_step(), self.column_step())
    }
}

impl PartialEq for Diff {
    fn eq(&self, other: &Self) -> bool {
        self.order_key() == other.order_key()
    }
}

impl Eq for Diff {}

impl PartialOrd for Diff {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Diff {
    fn cmp(&self, other: &Self) -> Ordering {
        self.order_key().cmp(&other.order_key())
    }
}

impl From<RowDiff> for Diff {
    fn from(d: RowDiff) -> Self {
        Diff::Row(d)
    }
}

impl From<ColumnDiff> for Diff {
    fn from(d: ColumnDiff) -> Self {
        Diff::Column(d)
    }
}

/// A row present on `side` with no key-aligned counterpart on the other side
#[derive(Debug, Clone)]
pub struct RowDiff {
    row_step: u64,
    key_values: Vec<CellValue>,
    display_values: DisplayValues,
    side: Side,
    plan: Arc<TableComparison>,
}

impl RowDiff {
    pub fn new(row_step: u64, row: &[CellValue], side: Side, plan: Arc<TableComparison>) -> Self {
        Self {
            row_step,
            key_values: plan.row_key_values(row, side),
            display_values: plan.row_display_values(row, side),
            side,
            plan,
        }
    }

    pub fn row_step(&self) -> u64 {
        self.row_step
    }

    pub fn key_values(&self) -> &[CellValue] {
        &self.key_values
    }

    pub fn display_values(&self) -> &DisplayValues {
        &self.display_values
    }

    /// Side that holds the row
    pub fn side(&self) -> Side {
        self.side
    }

    pub fn table_comparison(&self) -> &Arc<TableComparison> {
        &self.plan
    }
}

/// A key-aligned row pair with at least one column difference.
///
/// Shared by every [`ColumnDiff`] found in the pair.
#[derive(Debug)]
pub struct ColumnDiffRow {
    row_step: u64,
    lhs_row: Row,
    rhs_row: Row,
    plan: Arc<TableComparison>,
    key_values: OnceLock<Vec<CellValue>>,
    display_values: OnceLock<DisplayValues>,
}

impl ColumnDiffRow {
    pub fn new(row_step: u64, lhs_row: Row, rhs_row: Row, plan: Arc<TableComparison>) -> Self {
        Self {
            row_step,
            lhs_row,
            rhs_row,
            plan,
            key_values: OnceLock::new(),
            display_values: OnceLock::new(),
        }
    }

    pub fn row_step(&self) -> u64 {
        self.row_step
    }

    pub fn lhs_row(&self) -> &[CellValue] {
        &self.lhs_row
    }

    pub fn rhs_row(&self) -> &[CellValue] {
        &self.rhs_row
    }

    pub fn table_comparison(&self) -> &Arc<TableComparison> {
        &self.plan
    }

    /// Key values, read from the lhs row
    pub fn key_values(&self) -> &[CellValue] {
        self.key_values
            .get_or_init(|| self.plan.row_key_values(&self.lhs_row, Side::Left))
    }

    /// Merged display snapshot of both rows
    pub fn display_values(&self) -> &DisplayValues {
        self.display_values
            .get_or_init(|| self.plan.merged_display_values(&self.lhs_row, &self.rhs_row))
    }
}

/// A value difference within a key-aligned row pair
#[derive(Debug, Clone)]
pub struct ColumnDiff {
    row: Arc<ColumnDiffRow>,
    column_step: u32,
    lhs_value: CellValue,
    rhs_value: CellValue,
}

impl ColumnDiff {
    pub fn new(
        row: Arc<ColumnDiffRow>,
        column_step: u32,
        lhs_value: CellValue,
        rhs_value: CellValue,
    ) -> Self {
        Self {
            row,
            column_step,
            lhs_value,
            rhs_value,
        }
    }

    pub fn row(&self) -> &Arc<ColumnDiffRow> {
        &self.row
    }

    pub fn row_step(&self) -> u64 {
        self.row.row_step
    }

    /// 1-based position among the examined diff columns
    pub fn column_step(&self) -> u32 {
        self.column_step
    }

    pub fn lhs_value(&self) -> &CellValue {
        &self.lhs_value
    }

    pub fn rhs_value(&self) -> &CellValue {
        &self.rhs_value
    }

    /// Shared column name, or `lhs:rhs` when the two sides name it differently
    pub fn column_name(&self) -> String {
        self.row
            .plan
            .column_comparison(self.column_step as usize)
            .map(|c| c.display_name())
            .unwrap_or_else(|| format!("column_{}", self.column_step))
    }
}

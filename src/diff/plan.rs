//! The comparison plan binding two table shapes together

use indexmap::IndexMap;

use super::column::ColumnComparison;
use super::side::{DiffKind, Side};
use crate::error::{DiffError, Result};
use crate::model::{CellValue, RowComparator, TableModel};

/// Ordered column name to rendered value snapshot of a row
pub type DisplayValues = IndexMap<String, String>;

/// Complete, validated instructions for diffing two tables.
///
/// Immutable once built and reusable across runs.
#[derive(Debug, Clone)]
pub struct TableComparison {
    lhs_model: TableModel,
    rhs_model: TableModel,
    kind: DiffKind,
    map: Vec<ColumnComparison>,
    diff_indexes: Vec<usize>,
    display_indexes: [Vec<usize>; 2],
    max_diffs: u64,
    row_comparator: RowComparator,
}

impl TableComparison {
    /// Build and validate a plan.
    ///
    /// `diff_indexes` point into `map`; `display_indexes` hold lhs then rhs
    /// column indexes. Both keys must be non-empty, of equal arity and of
    /// matching types, and every column comparison must belong to the models.
    pub fn new(
        lhs_model: TableModel,
        rhs_model: TableModel,
        kind: DiffKind,
        map: Vec<ColumnComparison>,
        diff_indexes: Vec<usize>,
        display_indexes: [Vec<usize>; 2],
        max_diffs: u64,
    ) -> Result<Self> {
        validate_keys(&lhs_model, &rhs_model)?;

        for comparison in &map {
            comparison.validate(&lhs_model, &rhs_model)?;
        }
        if let Some(&bad) = diff_indexes.iter().find(|&&i| i >= map.len()) {
            return Err(DiffError::invalid_argument(format!(
                "diff index {} is outside the {} column comparisons",
                bad,
                map.len()
            )));
        }
        let sides = [
            (&lhs_model, &display_indexes[0]),
            (&rhs_model, &display_indexes[1]),
        ];
        for (model, indexes) in sides {
            if let Some(&bad) = indexes.iter().find(|&&i| i >= model.column_count()) {
                return Err(DiffError::MissingColumn {
                    table: model.name().to_string(),
                    index: bad,
                });
            }
        }

        let row_comparator = RowComparator::new(&lhs_model, &rhs_model);
        Ok(Self {
            lhs_model,
            rhs_model,
            kind,
            map,
            diff_indexes,
            display_indexes,
            max_diffs,
            row_comparator,
        })
    }

    pub fn lhs_model(&self) -> &TableModel {
        &self.lhs_model
    }

    pub fn rhs_model(&self) -> &TableModel {
        &self.rhs_model
    }

    /// Model for `side`; `Both` reads the lhs
    pub fn model(&self, side: Side) -> &TableModel {
        match side {
            Side::Right => &self.rhs_model,
            Side::Left | Side::Both => &self.lhs_model,
        }
    }

    pub fn kind(&self) -> DiffKind {
        self.kind
    }

    pub fn map(&self) -> &[ColumnComparison] {
        &self.map
    }

    pub fn diff_indexes(&self) -> &[usize] {
        &self.diff_indexes
    }

    pub fn display_indexes(&self, side: Side) -> &[usize] {
        match side {
            Side::Right => &self.display_indexes[1],
            Side::Left | Side::Both => &self.display_indexes[0],
        }
    }

    pub fn max_diffs(&self) -> u64 {
        self.max_diffs
    }

    pub fn row_comparator(&self) -> &RowComparator {
        &self.row_comparator
    }

    pub fn row_key_values(&self, row: &[CellValue], side: Side) -> Vec<CellValue> {
        self.model(side).key_values(row)
    }

    /// Column comparison examined at a 1-based column step
    pub fn column_comparison(&self, column_step: usize) -> Option<&ColumnComparison> {
        let index = *self.diff_indexes.get(column_step.checked_sub(1)?)?;
        self.map.get(index)
    }

    /// Shared column name at a 1-based column step
    pub fn column_name(&self, column_step: usize) -> Option<&str> {
        self.column_comparison(column_step)?.column_name()
    }

    /// Display snapshot of one side's row; nulls render as `<null>`
    pub fn row_display_values(&self, row: &[CellValue], side: Side) -> DisplayValues {
        let model = self.model(side);
        self.display_indexes(side)
            .iter()
            .filter_map(|&i| model.column_at(i))
            .map(|column| {
                let value = row
                    .get(column.index())
                    .unwrap_or(&CellValue::Null)
                    .display()
                    .into_owned();
                (column.name().to_string(), value)
            })
            .collect()
    }

    /// Side-by-side display snapshot of an aligned row pair
    pub fn merged_display_values(
        &self,
        lhs_row: &[CellValue],
        rhs_row: &[CellValue],
    ) -> DisplayValues {
        merge_display_values(
            &self.row_display_values(lhs_row, Side::Left),
            &self.row_display_values(rhs_row, Side::Right),
        )
    }
}

fn validate_keys(lhs: &TableModel, rhs: &TableModel) -> Result<()> {
    if lhs.key().is_empty() || rhs.key().is_empty() {
        return Err(DiffError::key_mismatch("both tables need a non-empty key"));
    }
    if lhs.key().len() != rhs.key().len() {
        return Err(DiffError::key_mismatch(format!(
            "key arity differs: {} has {}, {} has {}",
            lhs.name(),
            lhs.key().len(),
            rhs.name(),
            rhs.key().len()
        )));
    }
    for (l, r) in lhs.key_columns().zip(rhs.key_columns()) {
        if l.column_type() != r.column_type() {
            return Err(DiffError::key_mismatch(format!(
                "key column {} is {} but {} is {}",
                l.name(),
                l.column_type(),
                r.name(),
                r.column_type()
            )));
        }
    }
    Ok(())
}

/// Interleave two ordered per-side snapshots into one.
///
/// Walks the lhs entries in order. A name present on both sides keeps one
/// entry, holding the shared value or `lhs:rhs` when they differ; any
/// rhs-only names that precede it in rhs order are emitted first. Names on
/// one side only render as `value:` (lhs) or `:value` (rhs). Leftover
/// rhs-only names follow at the end in rhs order.
pub fn merge_display_values(lhs: &DisplayValues, rhs: &DisplayValues) -> DisplayValues {
    let mut merged = DisplayValues::with_capacity(lhs.len() + rhs.len());
    let mut rhs_cursor = 0;

    let flush_rhs_only = |merged: &mut DisplayValues, from: usize, to: usize| {
        for (name, value) in rhs.iter().take(to).skip(from) {
            if !lhs.contains_key(name) {
                merged.insert(name.clone(), format!(":{}", value));
            }
        }
    };

    for (name, lhs_value) in lhs {
        match rhs.get_full(name) {
            Some((position, _, rhs_value)) => {
                if position >= rhs_cursor {
                    flush_rhs_only(&mut merged, rhs_cursor, position);
                    rhs_cursor = position + 1;
                }
                let value = if lhs_value == rhs_value {
                    lhs_value.clone()
                } else {
                    format!("{}:{}", lhs_value, rhs_value)
                };
                merged.insert(name.clone(), value);
            }
            None => {
                merged.insert(name.clone(), format!("{}:", lhs_value));
            }
        }
    }
    flush_rhs_only(&mut merged, rhs_cursor, rhs.len());

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{EqualsDiffor, NumberDiffor};
    use crate::model::{ColumnModel, ColumnType, Row};
    use std::sync::Arc;

    fn display(pairs: &[(&str, &str)]) -> DisplayValues {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn models() -> (TableModel, TableModel) {
        let cols = || {
            vec![
                ColumnModel::new(0, "id", ColumnType::Integer),
                ColumnModel::new(1, "name", ColumnType::String),
                ColumnModel::new(2, "amount", ColumnType::Real),
            ]
        };
        (
            TableModel::new("lhs", cols(), vec![0]).unwrap(),
            TableModel::new("rhs", cols(), vec![0]).unwrap(),
        )
    }

    fn plan() -> TableComparison {
        let (lhs, rhs) = models();
        let map = (0..3)
            .map(|i| {
                ColumnComparison::new(
                    lhs.columns()[i].clone(),
                    rhs.columns()[i].clone(),
                    if i == 2 {
                        Arc::new(NumberDiffor::new(0.01, false)) as Arc<dyn crate::diff::Diffor>
                    } else {
                        Arc::new(EqualsDiffor)
                    },
                )
            })
            .collect();
        let display = [vec![0, 1], vec![0, 1]];
        TableComparison::new(lhs, rhs, DiffKind::Both, map, vec![1, 2], display, 10).unwrap()
    }

    #[test]
    fn test_merge_same_and_different() {
        let merged = merge_display_values(
            &display(&[("id", "1"), ("name", "a")]),
            &display(&[("id", "1"), ("name", "b")]),
        );
        assert_eq!(merged, display(&[("id", "1"), ("name", "a:b")]));
    }

    #[test]
    fn test_merge_one_sided_names() {
        let merged = merge_display_values(
            &display(&[("id", "1"), ("old", "x")]),
            &display(&[("id", "1"), ("new", "y")]),
        );
        assert_eq!(merged, display(&[("id", "1"), ("old", "x:"), ("new", ":y")]));
    }

    #[test]
    fn test_merge_interleaved_order() {
        // rhs-only "b" precedes the shared "c" on the rhs, so it lands before it
        let merged = merge_display_values(
            &display(&[("a", "1"), ("c", "3")]),
            &display(&[("b", "2"), ("c", "3"), ("d", "4")]),
        );
        let names: Vec<_> = merged.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["a", "b", "c", "d"]);
        assert_eq!(merged["a"], "1:");
        assert_eq!(merged["b"], ":2");
        assert_eq!(merged["c"], "3");
        assert_eq!(merged["d"], ":4");
    }

    #[test]
    fn test_merge_crossed_order() {
        let merged = merge_display_values(
            &display(&[("x", "1"), ("y", "2")]),
            &display(&[("y", "2"), ("z", "9"), ("x", "0")]),
        );
        // rhs-only "z" sits before "x" in rhs order
        let names: Vec<_> = merged.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["z", "x", "y"]);
        assert_eq!(merged["x"], "1:0");
        assert_eq!(merged["y"], "2");
        assert_eq!(merged["z"], ":9");
    }

    #[test]
    fn test_display_values_render_nulls() {
        let plan = plan();
        let row: Row = vec![CellValue::Int(7), CellValue::Null, CellValue::Float(1.0)];
        assert_eq!(
            plan.row_display_values(&row, Side::Left),
            display(&[("id", "7"), ("name", "<null>")])
        );
    }

    #[test]
    fn test_column_name_by_step() {
        let plan = plan();
        assert_eq!(plan.column_name(1), Some("name"));
        assert_eq!(plan.column_name(2), Some("amount"));
        assert_eq!(plan.column_name(0), None);
        assert_eq!(plan.column_name(3), None);
    }

    #[test]
    fn test_key_arity_mismatch() {
        let (lhs, _) = models();
        let rhs = lhs.copy_with_new_key(&["id", "name"]).unwrap();
        let err = empty_plan(lhs, rhs, Vec::new()).unwrap_err();
        assert!(matches!(err, DiffError::KeyMismatch { .. }));
    }

    #[test]
    fn test_key_type_mismatch() {
        let (lhs, _) = models();
        let rhs = lhs.copy_with_new_key(&["name"]).unwrap();
        assert!(matches!(
            empty_plan(lhs, rhs, Vec::new()),
            Err(DiffError::KeyMismatch { .. })
        ));
    }

    #[test]
    fn test_diff_index_out_of_range() {
        let (lhs, rhs) = models();
        assert!(empty_plan(lhs, rhs, vec![0]).is_err());
    }

    /// Plan with no column comparisons and no display columns
    fn empty_plan(
        lhs: TableModel,
        rhs: TableModel,
        diff_indexes: Vec<usize>,
    ) -> Result<TableComparison> {
        let display = [Vec::new(), Vec::new()];
        TableComparison::new(lhs, rhs, DiffKind::Both, Vec::new(), diff_indexes, display, 1)
    }
}

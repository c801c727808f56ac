//! Cell values, rows and table models

use std::borrow::Cow;
use std::hash::{Hash, Hasher};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use super::schema::ColumnModel;
use crate::error::{DiffError, Result};

/// Rendering used for null cells in display snapshots
pub const NULL_DISPLAY: &str = "<null>";

/// A cell value with type information
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
}

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CellValue::Null, CellValue::Null) => true,
            (CellValue::Bool(a), CellValue::Bool(b)) => a == b,
            (CellValue::Int(a), CellValue::Int(b)) => a == b,
            (CellValue::Float(a), CellValue::Float(b)) => {
                // Handle NaN comparison
                if a.is_nan() && b.is_nan() {
                    true
                } else {
                    a == b
                }
            }
            (CellValue::String(a), CellValue::String(b)) => a == b,
            (CellValue::Date(a), CellValue::Date(b)) => a == b,
            (CellValue::Time(a), CellValue::Time(b)) => a == b,
            (CellValue::DateTime(a), CellValue::DateTime(b)) => a == b,
            // Cross-type numeric comparison
            (CellValue::Int(a), CellValue::Float(b)) => (*a as f64) == *b,
            (CellValue::Float(a), CellValue::Int(b)) => *a == (*b as f64),
            _ => false,
        }
    }
}

impl Eq for CellValue {}

/// Numbers hash through their `f64` value so `Int(3)` and `Float(3.0)`,
/// which compare equal, land in the same bucket.
impl Hash for CellValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            CellValue::Int(_) | CellValue::Float(_) => {
                let f = self.as_f64().unwrap_or_default();
                let bits = if f.is_nan() {
                    f64::NAN.to_bits()
                } else if f == 0.0 {
                    0.0f64.to_bits()
                } else {
                    f.to_bits()
                };
                state.write_u8(2);
                bits.hash(state);
            }
            other => {
                std::mem::discriminant(other).hash(state);
                match other {
                    CellValue::Bool(b) => b.hash(state),
                    CellValue::String(s) => s.hash(state),
                    CellValue::Date(d) => d.hash(state),
                    CellValue::Time(t) => t.hash(state),
                    CellValue::DateTime(dt) => dt.hash(state),
                    CellValue::Null | CellValue::Int(_) | CellValue::Float(_) => {}
                }
            }
        }
    }
}

impl CellValue {
    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Convert to a display string
    pub fn display(&self) -> Cow<'_, str> {
        match self {
            CellValue::Null => Cow::Borrowed(NULL_DISPLAY),
            CellValue::Bool(b) => Cow::Owned(b.to_string()),
            CellValue::Int(i) => Cow::Owned(i.to_string()),
            CellValue::Float(f) => Cow::Owned(f.to_string()),
            CellValue::String(s) => Cow::Borrowed(s.as_str()),
            CellValue::Date(d) => Cow::Owned(d.to_string()),
            CellValue::Time(t) => Cow::Owned(t.to_string()),
            CellValue::DateTime(dt) => Cow::Owned(dt.to_string()),
        }
    }

    /// Name of the value's variant, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            CellValue::Null => "null",
            CellValue::Bool(_) => "bool",
            CellValue::Int(_) => "int",
            CellValue::Float(_) => "float",
            CellValue::String(_) => "string",
            CellValue::Date(_) => "date",
            CellValue::Time(_) => "time",
            CellValue::DateTime(_) => "datetime",
        }
    }

    /// Numeric view of the value
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Int(i) => Some(*i as f64),
            CellValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Millisecond view of a temporal value.
    ///
    /// Dates and timestamps count from the Unix epoch, times from midnight.
    pub fn as_millis(&self) -> Option<i64> {
        match self {
            CellValue::Date(d) => d
                .and_hms_opt(0, 0, 0)
                .map(|dt| dt.and_utc().timestamp_millis()),
            CellValue::DateTime(dt) => Some(dt.and_utc().timestamp_millis()),
            CellValue::Time(t) => Some(
                t.num_seconds_from_midnight() as i64 * 1000
                    + (t.nanosecond() / 1_000_000) as i64,
            ),
            _ => None,
        }
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Int(i)
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Float(f)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(d: NaiveDate) -> Self {
        CellValue::Date(d)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(dt: NaiveDateTime) -> Self {
        CellValue::DateTime(dt)
    }
}

impl<T> From<Option<T>> for CellValue
where
    T: Into<CellValue>,
{
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => CellValue::Null,
        }
    }
}

/// A row: cell values positionally aligned with its table's columns
pub type Row = Vec<CellValue>;

/// Shape of one side's tabular data
#[derive(Debug, Clone, PartialEq)]
pub struct TableModel {
    name: String,
    columns: Vec<ColumnModel>,
    key: Vec<usize>,
}

impl TableModel {
    /// Build a table model.
    ///
    /// Column indexes are reassigned to match their position. Fails when
    /// `columns` or `key` is empty, when two columns share a name, or when a
    /// key index does not resolve to a column.
    pub fn new(
        name: impl Into<String>,
        columns: Vec<ColumnModel>,
        key: Vec<usize>,
    ) -> Result<Self> {
        let name = name.into();
        if columns.is_empty() {
            return Err(DiffError::invalid_argument(format!(
                "table {} has no columns",
                name
            )));
        }
        if key.is_empty() {
            return Err(DiffError::invalid_argument(format!(
                "table {} has an empty key",
                name
            )));
        }

        let mut seen = FxHashSet::default();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(DiffError::invalid_argument(format!(
                    "duplicate column name {} in table {}",
                    column.name, name
                )));
            }
        }

        let mut columns = columns;
        for (position, column) in columns.iter_mut().enumerate() {
            column.index = position;
            column.key_position = None;
        }
        for (position, &index) in key.iter().enumerate() {
            let column = columns
                .get_mut(index)
                .ok_or_else(|| DiffError::MissingColumn {
                    table: name.clone(),
                    index,
                })?;
            column.key_position = Some(position);
        }

        Ok(Self { name, columns, key })
    }

    /// Build a table model keyed on a synthetic `<ROW_NUM>` column injected at position 0
    pub fn with_row_num(name: impl Into<String>, columns: Vec<ColumnModel>) -> Result<Self> {
        let mut all = Vec::with_capacity(columns.len() + 1);
        all.push(ColumnModel::row_num());
        all.extend(columns);
        Self::new(name, all, vec![0])
    }

    /// Build a table model keyed by column names
    pub fn with_key_names(
        name: impl Into<String>,
        columns: Vec<ColumnModel>,
        key_names: &[&str],
    ) -> Result<Self> {
        let name = name.into();
        let key = key_names
            .iter()
            .map(|key_name| {
                columns
                    .iter()
                    .position(|c| c.name == *key_name)
                    .ok_or_else(|| {
                        DiffError::invalid_argument(format!(
                            "key column {} not found in table {}",
                            key_name, name
                        ))
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(name, columns, key)
    }

    /// Deep copy with the same key
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// Copy of this model keyed on `names` instead
    pub fn copy_with_new_key(&self, names: &[&str]) -> Result<Self> {
        Self::with_key_names(self.name.clone(), self.columns.clone(), names)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Column definitions in row order
    pub fn columns(&self) -> &[ColumnModel] {
        &self.columns
    }

    /// Key column indexes in key order
    pub fn key(&self) -> &[usize] {
        &self.key
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Get column by name
    pub fn column(&self, name: &str) -> Option<&ColumnModel> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Get column by index
    pub fn column_at(&self, index: usize) -> Option<&ColumnModel> {
        self.columns.get(index)
    }

    /// Get column index by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Key columns in key order
    pub fn key_columns(&self) -> impl Iterator<Item = &ColumnModel> {
        self.key.iter().map(move |&i| &self.columns[i])
    }

    pub fn key_column_names(&self) -> Vec<&str> {
        self.key_columns().map(|c| c.name.as_str()).collect()
    }

    /// Key values extracted from a row; missing cells read as null
    pub fn key_values(&self, row: &[CellValue]) -> Vec<CellValue> {
        self.key
            .iter()
            .map(|&i| row.get(i).cloned().unwrap_or(CellValue::Null))
            .collect()
    }

    /// Whether `column` is one of this model's columns
    pub fn contains(&self, column: &ColumnModel) -> bool {
        self.columns
            .get(column.index)
            .is_some_and(|own| own.same_shape(column))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ColumnType;

    fn columns() -> Vec<ColumnModel> {
        vec![
            ColumnModel::new(0, "id", ColumnType::Integer),
            ColumnModel::new(1, "name", ColumnType::String),
            ColumnModel::new(2, "amount", ColumnType::Real),
        ]
    }

    #[test]
    fn test_key_membership() {
        let model = TableModel::new("t", columns(), vec![0]).unwrap();
        assert!(model.column("id").unwrap().is_key());
        assert!(!model.column("name").unwrap().is_key());
        assert_eq!(model.key_column_names(), vec!["id"]);
    }

    #[test]
    fn test_missing_key_column() {
        let err = TableModel::new("t", columns(), vec![5]).unwrap_err();
        assert!(err.to_string().contains("couldn't find Column for index 5"));
    }

    #[test]
    fn test_empty_inputs_rejected() {
        assert!(matches!(
            TableModel::new("t", Vec::new(), vec![0]),
            Err(DiffError::InvalidArgument { .. })
        ));
        assert!(matches!(
            TableModel::new("t", columns(), Vec::new()),
            Err(DiffError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut cols = columns();
        cols.push(ColumnModel::new(3, "id", ColumnType::String));
        assert!(TableModel::new("t", cols, vec![0]).is_err());
    }

    #[test]
    fn test_copy_with_new_key() {
        let model = TableModel::new("t", columns(), vec![0]).unwrap();
        let rekeyed = model.copy_with_new_key(&["name", "id"]).unwrap();
        assert_eq!(rekeyed.key(), &[1, 0]);
        assert_eq!(rekeyed.column("id").unwrap().key_position(), Some(1));
        // original untouched
        assert_eq!(model.key(), &[0]);
        assert!(model.copy_with_new_key(&["missing"]).is_err());
    }

    #[test]
    fn test_row_num_injection() {
        let model = TableModel::with_row_num("t", columns()).unwrap();
        assert_eq!(model.column_count(), 4);
        assert!(model.column_at(0).unwrap().is_row_num());
        assert_eq!(model.column("amount").unwrap().index(), 3);
        assert_eq!(model.key(), &[0]);
    }

    #[test]
    fn test_key_values() {
        let model = TableModel::new("t", columns(), vec![2, 0]).unwrap();
        let row: Row = vec![1.into(), "a".into(), 2.5.into()];
        assert_eq!(
            model.key_values(&row),
            vec![CellValue::Float(2.5), CellValue::Int(1)]
        );
    }

    #[test]
    fn test_temporal_millis() {
        let date = NaiveDate::from_ymd_opt(1970, 1, 2).unwrap();
        assert_eq!(CellValue::Date(date).as_millis(), Some(86_400_000));
        let time = NaiveTime::from_hms_milli_opt(0, 0, 1, 500).unwrap();
        assert_eq!(CellValue::Time(time).as_millis(), Some(1_500));
        assert_eq!(CellValue::Int(1).as_millis(), None);
    }

    #[test]
    fn test_equal_cells_hash_alike() {
        let mut set = FxHashSet::default();
        set.insert(CellValue::Int(3));
        assert!(set.contains(&CellValue::Float(3.0)));
        set.insert(CellValue::Float(-0.0));
        assert!(set.contains(&CellValue::Int(0)));
        set.insert(CellValue::Float(f64::NAN));
        assert!(set.contains(&CellValue::Float(-f64::NAN)));
        assert!(!set.contains(&CellValue::from("3")));
        assert!(!set.contains(&CellValue::Null));
    }
}

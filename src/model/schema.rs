//! Column metadata and type information

use serde::{Deserialize, Serialize};

use crate::error::DiffError;

/// Name of the synthetic row-number column injected at position 0
pub const ROW_NUM_COLUMN: &str = "<ROW_NUM>";

/// Semantic type of a column
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    Integer,
    Real,
    Decimal,
    Date,
    Time,
    Timestamp,
    Boolean,
    Text,
    #[default]
    Mixed,
}

impl ColumnType {
    /// Numeric types compared through `f64`
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            ColumnType::Integer | ColumnType::Real | ColumnType::Decimal
        )
    }

    /// Types with a millisecond representation
    pub fn is_temporal(self) -> bool {
        matches!(
            self,
            ColumnType::Date | ColumnType::Time | ColumnType::Timestamp
        )
    }

    pub fn is_textual(self) -> bool {
        matches!(self, ColumnType::String | ColumnType::Text)
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnType::String => write!(f, "string"),
            ColumnType::Integer => write!(f, "integer"),
            ColumnType::Real => write!(f, "real"),
            ColumnType::Decimal => write!(f, "decimal"),
            ColumnType::Date => write!(f, "date"),
            ColumnType::Time => write!(f, "time"),
            ColumnType::Timestamp => write!(f, "timestamp"),
            ColumnType::Boolean => write!(f, "boolean"),
            ColumnType::Text => write!(f, "text"),
            ColumnType::Mixed => write!(f, "mixed"),
        }
    }
}

impl std::str::FromStr for ColumnType {
    type Err = DiffError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "string" | "varchar" => Ok(ColumnType::String),
            "integer" | "int" => Ok(ColumnType::Integer),
            "real" | "float" | "double" => Ok(ColumnType::Real),
            "decimal" | "numeric" => Ok(ColumnType::Decimal),
            "date" => Ok(ColumnType::Date),
            "time" => Ok(ColumnType::Time),
            "timestamp" | "datetime" => Ok(ColumnType::Timestamp),
            "boolean" | "bool" => Ok(ColumnType::Boolean),
            "text" => Ok(ColumnType::Text),
            "mixed" => Ok(ColumnType::Mixed),
            _ => Err(DiffError::invalid_argument(format!(
                "Unknown column type: {}",
                s
            ))),
        }
    }
}

/// Column metadata
///
/// Built by [`TableModel`](super::TableModel), which also records whether the
/// column takes part in the table key. The column holds no pointer back to
/// its table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnModel {
    /// Column index (0-based position in the row)
    pub(crate) index: usize,
    pub(crate) name: String,
    pub(crate) column_type: ColumnType,
    /// chrono format string used to parse and render temporal values
    pub(crate) format: Option<String>,
    pub(crate) is_row_num: bool,
    /// Position of this column within the owning table's key
    pub(crate) key_position: Option<usize>,
}

impl ColumnModel {
    /// Create a new column with name, index and type
    pub fn new(index: usize, name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            index,
            name: name.into(),
            column_type,
            format: None,
            is_row_num: false,
            key_position: None,
        }
    }

    /// Attach a parse/format pattern
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// The synthetic row-number column
    pub fn row_num() -> Self {
        Self {
            index: 0,
            name: ROW_NUM_COLUMN.to_string(),
            column_type: ColumnType::Integer,
            format: None,
            is_row_num: true,
            key_position: None,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    pub fn is_row_num(&self) -> bool {
        self.is_row_num
    }

    /// Whether the owning table uses this column in its key
    pub fn is_key(&self) -> bool {
        self.key_position.is_some()
    }

    pub fn key_position(&self) -> Option<usize> {
        self.key_position
    }

    /// Same column apart from key membership
    pub(crate) fn same_shape(&self, other: &ColumnModel) -> bool {
        self.index == other.index
            && self.name == other.name
            && self.column_type == other.column_type
            && self.is_row_num == other.is_row_num
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_column_type() {
        assert_eq!("INTEGER".parse::<ColumnType>().unwrap(), ColumnType::Integer);
        assert_eq!("datetime".parse::<ColumnType>().unwrap(), ColumnType::Timestamp);
        assert!("blob".parse::<ColumnType>().is_err());
    }

    #[test]
    fn test_row_num_column() {
        let col = ColumnModel::row_num();
        assert_eq!(col.name(), ROW_NUM_COLUMN);
        assert!(col.is_row_num());
        assert_eq!(col.index(), 0);
    }
}

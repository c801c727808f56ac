//! Sides of a comparison and the kind of differences a run looks for

use serde::{Deserialize, Serialize};

use crate::error::DiffError;

/// One side of a comparison. The discriminant doubles as an array index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left = 0,
    Right = 1,
    Both = 2,
}

impl Side {
    pub fn index(self) -> usize {
        self as usize
    }

    /// The other side; `Both` stays `Both`
    pub fn flip(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
            Side::Both => Side::Both,
        }
    }

    /// Marker used in textual reports
    pub fn symbol(self) -> char {
        match self {
            Side::Left => '<',
            Side::Right => '>',
            Side::Both => '!',
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Left => write!(f, "lhs"),
            Side::Right => write!(f, "rhs"),
            Side::Both => write!(f, "both"),
        }
    }
}

/// Which differences a run reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffKind {
    /// Rows present on one side only
    RowDiff,
    /// Values that differ within key-aligned rows
    ColumnDiff,
    #[default]
    Both,
}

impl DiffKind {
    pub fn includes_rows(self) -> bool {
        matches!(self, DiffKind::RowDiff | DiffKind::Both)
    }

    pub fn includes_columns(self) -> bool {
        matches!(self, DiffKind::ColumnDiff | DiffKind::Both)
    }
}

impl std::fmt::Display for DiffKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiffKind::RowDiff => write!(f, "row"),
            DiffKind::ColumnDiff => write!(f, "column"),
            DiffKind::Both => write!(f, "both"),
        }
    }
}

impl std::str::FromStr for DiffKind {
    type Err = DiffError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "row" | "row_diff" | "rows" => Ok(DiffKind::RowDiff),
            "column" | "column_diff" | "columns" => Ok(DiffKind::ColumnDiff),
            "both" => Ok(DiffKind::Both),
            _ => Err(DiffError::invalid_argument(format!("Unknown diff kind: {}", s))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_indexes() {
        assert_eq!(Side::Left.index(), 0);
        assert_eq!(Side::Right.index(), 1);
        assert_eq!(Side::Both.index(), 2);
        assert_eq!(Side::Left.flip(), Side::Right);
        assert_eq!(Side::Right.flip(), Side::Left);
    }

    #[test]
    fn test_kind_scope() {
        assert!(DiffKind::Both.includes_rows() && DiffKind::Both.includes_columns());
        assert!(!DiffKind::RowDiff.includes_columns());
        assert!(!DiffKind::ColumnDiff.includes_rows());
        assert_eq!("column".parse::<DiffKind>().unwrap(), DiffKind::ColumnDiff);
    }
}

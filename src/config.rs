//! Configuration handling for tablediff

use std::path::PathBuf;

use rustc_hash::FxHashMap;

use crate::diff::{DiffKind, TimeSpan};
use crate::model::ColumnType;

/// Output format for diff results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Report,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "report" | "text" => Ok(OutputFormat::Report),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

/// Configuration for diff operations
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the lhs file
    pub lhs_file: PathBuf,
    /// Path to the rhs file
    pub rhs_file: PathBuf,
    /// Columns both files are sorted by; empty means compare by row number
    pub key_columns: Vec<String>,
    /// Which differences to report
    pub kind: DiffKind,
    /// Output format
    pub output_format: OutputFormat,
    /// Stop after this many diffs
    pub max_diffs: u64,
    /// Only diff these columns (empty means all)
    pub diff_columns: Vec<String>,
    /// Columns to ignore in comparison
    pub ignore_columns: Vec<String>,
    /// Columns shown with each diff (empty means the key)
    pub display_columns: Vec<String>,
    /// Absolute tolerance per numeric column
    pub numeric_tolerances: FxHashMap<String, f64>,
    /// Tolerance per date/time column
    pub temporal_tolerances: FxHashMap<String, TimeSpan>,
    /// Ignore whitespace layout in text columns
    pub normalize_text: bool,
    /// Declared column types; others are inferred per cell
    pub column_types: FxHashMap<String, ColumnType>,
    /// Leave timestamps out of the report
    pub stable_output: bool,
    /// Only show the summary, not each diff
    pub summary_only: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lhs_file: PathBuf::new(),
            rhs_file: PathBuf::new(),
            key_columns: Vec::new(),
            kind: DiffKind::default(),
            output_format: OutputFormat::default(),
            max_diffs: u64::MAX,
            diff_columns: Vec::new(),
            ignore_columns: Vec::new(),
            display_columns: Vec::new(),
            numeric_tolerances: FxHashMap::default(),
            temporal_tolerances: FxHashMap::default(),
            normalize_text: false,
            column_types: FxHashMap::default(),
            stable_output: false,
            summary_only: false,
        }
    }
}

impl Config {
    /// Create a new Config with file paths
    pub fn new(lhs_file: PathBuf, rhs_file: PathBuf) -> Self {
        Self {
            lhs_file,
            rhs_file,
            ..Default::default()
        }
    }

    /// Set key columns for row alignment
    pub fn with_key_columns(mut self, keys: Vec<String>) -> Self {
        self.key_columns = keys;
        self
    }

    pub fn with_kind(mut self, kind: DiffKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set output format
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    pub fn with_max_diffs(mut self, max_diffs: u64) -> Self {
        self.max_diffs = max_diffs;
        self
    }

    pub fn with_diff_columns(mut self, columns: Vec<String>) -> Self {
        self.diff_columns = columns;
        self
    }

    /// Set columns to ignore
    pub fn with_ignore_columns(mut self, columns: Vec<String>) -> Self {
        self.ignore_columns = columns;
        self
    }

    pub fn with_display_columns(mut self, columns: Vec<String>) -> Self {
        self.display_columns = columns;
        self
    }

    /// Set numeric tolerance for one column
    pub fn with_numeric_tolerance(mut self, column: impl Into<String>, tolerance: f64) -> Self {
        self.numeric_tolerances.insert(column.into(), tolerance);
        self
    }

    pub fn with_temporal_tolerance(
        mut self,
        column: impl Into<String>,
        tolerance: TimeSpan,
    ) -> Self {
        self.temporal_tolerances.insert(column.into(), tolerance);
        self
    }

    /// Enable whitespace-insensitive text comparison
    pub fn with_normalize_text(mut self, normalize: bool) -> Self {
        self.normalize_text = normalize;
        self
    }

    pub fn with_column_type(mut self, column: impl Into<String>, column_type: ColumnType) -> Self {
        self.column_types.insert(column.into(), column_type);
        self
    }

    pub fn with_stable_output(mut self, stable: bool) -> Self {
        self.stable_output = stable;
        self
    }

    /// Enable summary-only mode
    pub fn with_summary_only(mut self, summary_only: bool) -> Self {
        self.summary_only = summary_only;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = Config::new("a.csv".into(), "b.csv".into())
            .with_key_columns(vec!["id".into()])
            .with_kind(DiffKind::RowDiff)
            .with_numeric_tolerance("amount", 0.01)
            .with_max_diffs(5);
        assert_eq!(config.key_columns, vec!["id"]);
        assert_eq!(config.kind, DiffKind::RowDiff);
        assert_eq!(config.numeric_tolerances.get("amount"), Some(&0.01));
        assert_eq!(config.max_diffs, 5);
        assert_eq!(config.output_format, OutputFormat::Report);
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert!("html".parse::<OutputFormat>().is_err());
    }
}

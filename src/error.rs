//! Error types for tablediff operations

use thiserror::Error;

use crate::diff::Side;

pub type Result<T> = std::result::Result<T, DiffError>;

#[derive(Error, Debug)]
pub enum DiffError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("couldn't find Column for index {index} in table {table}")]
    MissingColumn { table: String, index: usize },

    #[error("Key mismatch: {message}")]
    KeyMismatch { message: String },

    #[error("Column {column} does not belong to table {table}")]
    ColumnNotInModel { column: String, table: String },

    #[error("No columns could be mapped between {lhs} and {rhs}")]
    NoMappedColumns { lhs: String, rhs: String },

    #[error("Ambiguous diffor rules for column {column}: {rules:?}")]
    AmbiguousRule { column: String, rules: Vec<String> },

    #[error("No converter registered from {from} to {to}")]
    UnsupportedConversion { from: String, to: String },

    #[error("Cannot convert {value:?} to {target}: {message}")]
    Conversion {
        value: String,
        target: String,
        message: String,
    },

    #[error("Type error: {message}")]
    Type { message: String },

    #[error("{side} source is not sorted by key at row {row}")]
    OutOfOrder { side: Side, row: u64 },

    #[error("Sink error: {message}")]
    SinkState { message: String },
}

impl DiffError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: msg.into(),
        }
    }

    pub fn key_mismatch(msg: impl Into<String>) -> Self {
        Self::KeyMismatch {
            message: msg.into(),
        }
    }

    pub fn type_error(msg: impl Into<String>) -> Self {
        Self::Type {
            message: msg.into(),
        }
    }

    pub fn sink_state(msg: impl Into<String>) -> Self {
        Self::SinkState {
            message: msg.into(),
        }
    }

    pub fn conversion(
        value: impl Into<String>,
        target: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self::Conversion {
            value: value.into(),
            target: target.into(),
            message: msg.into(),
        }
    }
}

//! Data model for tabular data representation

pub mod convert;
mod key;
mod schema;
mod table;

pub use key::{compare_keys, compare_values, RowComparator};
pub use schema::{ColumnModel, ColumnType, ROW_NUM_COLUMN};
pub use table::{CellValue, Row, TableModel, NULL_DISPLAY};

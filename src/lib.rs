//! tablediff - Streaming merge diff for key-sorted tabular data
//!
//! Compares two row sources that are sorted by a shared key in a single pass,
//! holding at most one pending row per side, and reports rows missing from
//! either side plus value differences within key-aligned rows.

pub mod config;
pub mod diff;
pub mod error;
pub mod model;
pub mod sink;
pub mod source;

pub use config::Config;
pub use diff::{AutoPlan, Diff, DiffEngine, RunContext, TableComparison};
pub use error::{DiffError, Result};
pub use model::{CellValue, TableModel};

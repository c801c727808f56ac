//! Diff engine for comparing key-sorted tables
//!
//! A [`TableComparison`] describes how two table shapes line up and how each
//! column pair is compared. The [`DiffEngine`] walks two [`Source`]s in key
//! order against that plan and hands every [`Diff`] it finds to a [`Sink`].
//!
//! [`Source`]: crate::source::Source
//! [`Sink`]: crate::sink::Sink

mod auto;
mod column;
pub mod diffor;
mod engine;
mod entity;
mod plan;
mod side;
mod span;

pub use auto::AutoPlan;
pub use column::ColumnComparison;
pub use diffor::{
    ChainDiffor, Conversion, ConvertingDiffor, DateDiffor, Diffor, EqualsDiffor, IdentityDiffor,
    NumberDiffor, TextDiffor,
};
pub use engine::{run_diff, DiffEngine, RunContext};
pub use entity::{ColumnDiff, ColumnDiffRow, Diff, RowDiff};
pub use plan::{merge_display_values, DisplayValues, TableComparison};
pub use side::{DiffKind, Side};
pub use span::TimeSpan;

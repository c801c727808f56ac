//! Plan derivation from loosely specified settings
//!
//! Columns pair up by identical name. Each pair gets its diffor from a fixed
//! table of rules evaluated in order: at most one exclusive rule may match
//! (otherwise the plan is ambiguous), and every matching non-exclusive rule
//! then wraps the result.

use std::sync::Arc;

use log::debug;
use rustc_hash::FxHashMap;

use super::column::ColumnComparison;
use super::diffor::{
    Conversion, ConvertingDiffor, DateDiffor, Diffor, EqualsDiffor, NumberDiffor, TextDiffor,
};
use super::plan::TableComparison;
use super::side::DiffKind;
use super::span::TimeSpan;
use crate::config::Config;
use crate::error::{DiffError, Result};
use crate::model::{ColumnModel, ColumnType, TableModel};

/// Settings from which a [`TableComparison`] is derived
#[derive(Debug, Clone)]
pub struct AutoPlan {
    kind: DiffKind,
    diff_columns: Option<Vec<String>>,
    ignore_columns: Vec<String>,
    display_columns: Option<Vec<String>>,
    numeric_tolerances: FxHashMap<String, f64>,
    temporal_tolerances: FxHashMap<String, TimeSpan>,
    normalize_text: bool,
    max_diffs: u64,
}

impl Default for AutoPlan {
    fn default() -> Self {
        Self {
            kind: DiffKind::default(),
            diff_columns: None,
            ignore_columns: Vec::new(),
            display_columns: None,
            numeric_tolerances: FxHashMap::default(),
            temporal_tolerances: FxHashMap::default(),
            normalize_text: false,
            max_diffs: u64::MAX,
        }
    }
}

impl From<&Config> for AutoPlan {
    fn from(config: &Config) -> Self {
        Self {
            kind: config.kind,
            diff_columns: (!config.diff_columns.is_empty())
                .then(|| config.diff_columns.clone()),
            ignore_columns: config.ignore_columns.clone(),
            display_columns: (!config.display_columns.is_empty())
                .then(|| config.display_columns.clone()),
            numeric_tolerances: config.numeric_tolerances.clone(),
            temporal_tolerances: config.temporal_tolerances.clone(),
            normalize_text: config.normalize_text,
            max_diffs: config.max_diffs,
        }
    }
}

impl AutoPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_kind(mut self, kind: DiffKind) -> Self {
        self.kind = kind;
        self
    }

    /// Only diff these columns
    pub fn with_diff_columns(mut self, names: Vec<String>) -> Self {
        self.diff_columns = Some(names);
        self
    }

    /// Never diff these columns
    pub fn with_ignore_columns(mut self, names: Vec<String>) -> Self {
        self.ignore_columns = names;
        self
    }

    /// Columns shown in row snapshots; defaults to the key
    pub fn with_display_columns(mut self, names: Vec<String>) -> Self {
        self.display_columns = Some(names);
        self
    }

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

    pub fn with_normalize_text(mut self, normalize: bool) -> Self {
        self.normalize_text = normalize;
        self
    }

    pub fn with_max_diffs(mut self, max_diffs: u64) -> Self {
        self.max_diffs = max_diffs;
        self
    }

    /// Derive the plan for two table models
    pub fn build(&self, lhs: TableModel, rhs: TableModel) -> Result<TableComparison> {
        let mut map = Vec::new();
        for lhs_column in lhs.columns() {
            let Some(rhs_column) = rhs.column(lhs_column.name()) else {
                debug!("column {} has no rhs counterpart, skipped", lhs_column.name());
                continue;
            };
            let diffor = resolve_diffor(&ColumnContext {
                lhs: lhs_column,
                rhs: rhs_column,
                plan: self,
            })?;
            map.push(ColumnComparison::new(lhs_column.clone(), rhs_column.clone(), diffor));
        }
        if map.is_empty() {
            return Err(DiffError::NoMappedColumns {
                lhs: lhs.name().to_string(),
                rhs: rhs.name().to_string(),
            });
        }

        let diff_indexes = map
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.columns_are_key() && self.wants_diff(&c.display_name()))
            .map(|(i, _)| i)
            .collect();

        let display_indexes = [self.display_indexes(&lhs), self.display_indexes(&rhs)];

        TableComparison::new(
            lhs,
            rhs,
            self.kind,
            map,
            diff_indexes,
            display_indexes,
            self.max_diffs,
        )
    }

    fn wants_diff(&self, name: &str) -> bool {
        let selected = match &self.diff_columns {
            Some(names) => names.iter().any(|n| n == name),
            None => true,
        };
        selected && !self.ignore_columns.iter().any(|n| n == name)
    }

    fn display_indexes(&self, model: &TableModel) -> Vec<usize> {
        match &self.display_columns {
            Some(names) => names.iter().filter_map(|n| model.column_index(n)).collect(),
            None => model.key().to_vec(),
        }
    }
}

/// What a rule sees about one column pair
struct ColumnContext<'a> {
    lhs: &'a ColumnModel,
    rhs: &'a ColumnModel,
    plan: &'a AutoPlan,
}

impl ColumnContext<'_> {
    fn name(&self) -> &str {
        self.lhs.name()
    }

    fn either(&self, test: fn(ColumnType) -> bool) -> bool {
        test(self.lhs.column_type()) || test(self.rhs.column_type())
    }
}

struct DifforRule {
    name: &'static str,
    exclusive: bool,
    applies: fn(&ColumnContext) -> bool,
    /// Exclusive rules ignore the incoming diffor; others wrap it
    resolve: fn(&ColumnContext, Arc<dyn Diffor>) -> Arc<dyn Diffor>,
}

const RULES: &[DifforRule] = &[
    DifforRule {
        name: "numeric-tolerance",
        exclusive: true,
        applies: has_numeric_tolerance,
        resolve: number_diffor,
    },
    DifforRule {
        name: "temporal-tolerance",
        exclusive: true,
        applies: has_temporal_tolerance,
        resolve: date_diffor,
    },
    DifforRule {
        name: "normalized-text",
        exclusive: true,
        applies: wants_text_normalization,
        resolve: text_diffor,
    },
    DifforRule {
        name: "type-coercion",
        exclusive: false,
        applies: types_differ,
        resolve: coerce_rhs,
    },
];

fn numeric_or_mixed(t: ColumnType) -> bool {
    t.is_numeric() || t == ColumnType::Mixed
}

fn temporal_or_mixed(t: ColumnType) -> bool {
    t.is_temporal() || t == ColumnType::Mixed
}

fn has_numeric_tolerance(ctx: &ColumnContext) -> bool {
    ctx.plan.numeric_tolerances.contains_key(ctx.name()) && ctx.either(numeric_or_mixed)
}

fn number_diffor(ctx: &ColumnContext, _: Arc<dyn Diffor>) -> Arc<dyn Diffor> {
    let tolerance = ctx.plan.numeric_tolerances.get(ctx.name()).copied().unwrap_or_default();
    Arc::new(NumberDiffor::new(tolerance, false))
}

fn has_temporal_tolerance(ctx: &ColumnContext) -> bool {
    ctx.plan.temporal_tolerances.contains_key(ctx.name()) && ctx.either(temporal_or_mixed)
}

fn date_diffor(ctx: &ColumnContext, _: Arc<dyn Diffor>) -> Arc<dyn Diffor> {
    let tolerance = ctx.plan.temporal_tolerances.get(ctx.name()).copied().unwrap_or_default();
    Arc::new(DateDiffor::new(tolerance))
}

fn wants_text_normalization(ctx: &ColumnContext) -> bool {
    ctx.plan.normalize_text && ctx.either(ColumnType::is_textual)
}

fn text_diffor(_: &ColumnContext, _: Arc<dyn Diffor>) -> Arc<dyn Diffor> {
    Arc::new(TextDiffor)
}

fn types_differ(ctx: &ColumnContext) -> bool {
    let (l, r) = (ctx.lhs.column_type(), ctx.rhs.column_type());
    l != r && l != ColumnType::Mixed && r != ColumnType::Mixed
}

/// Convert the rhs value to the lhs column's type before comparing
fn coerce_rhs(ctx: &ColumnContext, inner: Arc<dyn Diffor>) -> Arc<dyn Diffor> {
    let mut conversion = Conversion::new(ctx.lhs.column_type());
    if let Some(format) = ctx.lhs.format() {
        conversion = conversion.with_format(format);
    }
    Arc::new(ConvertingDiffor::new(None, Some(conversion), inner))
}

fn resolve_diffor(ctx: &ColumnContext) -> Result<Arc<dyn Diffor>> {
    let exclusive: Vec<&DifforRule> = RULES
        .iter()
        .filter(|rule| rule.exclusive && (rule.applies)(ctx))
        .collect();
    if exclusive.len() > 1 {
        return Err(DiffError::AmbiguousRule {
            column: ctx.name().to_string(),
            rules: exclusive.iter().map(|rule| rule.name.to_string()).collect(),
        });
    }

    let equals: Arc<dyn Diffor> = Arc::new(EqualsDiffor);
    let mut diffor = match exclusive.first() {
        Some(rule) => (rule.resolve)(ctx, Arc::clone(&equals)),
        None => equals,
    };
    for rule in RULES.iter().filter(|rule| !rule.exclusive && (rule.applies)(ctx)) {
        diffor = (rule.resolve)(ctx, diffor);
    }
    Ok(diffor)
}

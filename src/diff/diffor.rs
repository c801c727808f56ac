//! Column-level comparison strategies
//!
//! A [`Diffor`] answers one question for a pair of cell values: are they
//! different? Unless a strategy says otherwise, two nulls are equal and a
//! null against a non-null is a difference.

use std::fmt::Debug;
use std::sync::Arc;

use super::engine::RunContext;
use super::span::TimeSpan;
use crate::error::{DiffError, Result};
use crate::model::convert::convert;
use crate::model::{CellValue, ColumnType};

/// Strategy deciding whether two cell values differ
pub trait Diffor: Debug + Send + Sync {
    fn is_diff(&self, lhs: &CellValue, rhs: &CellValue, run: &RunContext) -> Result<bool>;
}

/// Outcome decided by nulls alone, if any
fn null_outcome(lhs: &CellValue, rhs: &CellValue) -> Option<bool> {
    match (lhs.is_null(), rhs.is_null()) {
        (true, true) => Some(false),
        (true, false) | (false, true) => Some(true),
        (false, false) => None,
    }
}

/// Plain inequality
#[derive(Debug, Clone, Copy, Default)]
pub struct EqualsDiffor;

impl Diffor for EqualsDiffor {
    fn is_diff(&self, lhs: &CellValue, rhs: &CellValue, _run: &RunContext) -> Result<bool> {
        Ok(lhs != rhs)
    }
}

/// Numeric comparison with an absolute tolerance.
///
/// Values differ when `|lhs - rhs| > tolerance`; a difference equal to the
/// tolerance is not a difference. NaN equals NaN and differs from any number.
/// Text cells holding a number are parsed before comparing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberDiffor {
    tolerance: f64,
    null_is_zero: bool,
}

impl NumberDiffor {
    pub fn new(tolerance: f64, null_is_zero: bool) -> Self {
        Self {
            tolerance: tolerance.abs(),
            null_is_zero,
        }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    fn number(&self, value: &CellValue) -> Result<f64> {
        if self.null_is_zero && value.is_null() {
            return Ok(0.0);
        }
        let number = match value {
            CellValue::String(s) => s.trim().parse::<f64>().ok(),
            other => other.as_f64(),
        };
        number.ok_or_else(|| {
            DiffError::type_error(format!(
                "NumberDiffor cannot compare {} value {}",
                value.type_name(),
                value
            ))
        })
    }
}

impl Diffor for NumberDiffor {
    fn is_diff(&self, lhs: &CellValue, rhs: &CellValue, _run: &RunContext) -> Result<bool> {
        if !self.null_is_zero {
            if let Some(outcome) = null_outcome(lhs, rhs) {
                return Ok(outcome);
            }
        }
        let (lhs, rhs) = (self.number(lhs)?, self.number(rhs)?);
        if lhs.is_nan() || rhs.is_nan() {
            return Ok(lhs.is_nan() != rhs.is_nan());
        }
        let diff = lhs - rhs;
        if diff == 0.0 {
            return Ok(false);
        }
        Ok(diff.abs() > self.tolerance)
    }
}

/// Temporal comparison with a tolerance span
#[derive(Debug, Clone, Copy, Default)]
pub struct DateDiffor {
    tolerance: TimeSpan,
}

impl DateDiffor {
    pub fn new(tolerance: TimeSpan) -> Self {
        Self { tolerance }
    }

    pub fn tolerance(&self) -> TimeSpan {
        self.tolerance
    }
}

impl Diffor for DateDiffor {
    fn is_diff(&self, lhs: &CellValue, rhs: &CellValue, _run: &RunContext) -> Result<bool> {
        if let Some(outcome) = null_outcome(lhs, rhs) {
            return Ok(outcome);
        }
        let millis = |value: &CellValue| {
            let millis = match value {
                CellValue::String(_) => convert(value, ColumnType::Timestamp, None)
                    .ok()
                    .and_then(|v| v.as_millis()),
                other => other.as_millis(),
            };
            millis.ok_or_else(|| {
                DiffError::type_error(format!(
                    "DateDiffor cannot compare {} value {}",
                    value.type_name(),
                    value
                ))
            })
        };
        let diff = millis(lhs)?.abs_diff(millis(rhs)?);
        if diff == 0 {
            return Ok(false);
        }
        Ok(diff > self.tolerance.as_millis().unsigned_abs())
    }
}

/// Text comparison that ignores layout whitespace
#[derive(Debug, Clone, Copy, Default)]
pub struct TextDiffor;

impl TextDiffor {
    /// Turn tabs and line breaks into spaces, squeeze repeated spaces, trim
    pub fn normalize(text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut pending_space = false;
        for c in text.chars() {
            if matches!(c, ' ' | '\n' | '\r' | '\t') {
                pending_space = true;
                continue;
            }
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(c);
        }
        out
    }
}

impl Diffor for TextDiffor {
    fn is_diff(&self, lhs: &CellValue, rhs: &CellValue, _run: &RunContext) -> Result<bool> {
        if let Some(outcome) = null_outcome(lhs, rhs) {
            return Ok(outcome);
        }
        if lhs == rhs {
            return Ok(false);
        }
        Ok(Self::normalize(&lhs.display()) != Self::normalize(&rhs.display()))
    }
}

/// Target type for one side of a [`ConvertingDiffor`]
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub target: ColumnType,
    pub format: Option<String>,
}

impl Conversion {
    pub fn new(target: ColumnType) -> Self {
        Self {
            target,
            format: None,
        }
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    fn apply(&self, value: &CellValue) -> Result<CellValue> {
        convert(value, self.target, self.format.as_deref())
    }
}

/// Converts either side to a target type before delegating
#[derive(Debug, Clone)]
pub struct ConvertingDiffor {
    lhs: Option<Conversion>,
    rhs: Option<Conversion>,
    inner: Arc<dyn Diffor>,
}

impl ConvertingDiffor {
    pub fn new(lhs: Option<Conversion>, rhs: Option<Conversion>, inner: Arc<dyn Diffor>) -> Self {
        Self { lhs, rhs, inner }
    }

    pub fn inner(&self) -> &Arc<dyn Diffor> {
        &self.inner
    }
}

impl Diffor for ConvertingDiffor {
    fn is_diff(&self, lhs: &CellValue, rhs: &CellValue, run: &RunContext) -> Result<bool> {
        let lhs = match &self.lhs {
            Some(conversion) => conversion.apply(lhs)?,
            None => lhs.clone(),
        };
        let rhs = match &self.rhs {
            Some(conversion) => conversion.apply(rhs)?,
            None => rhs.clone(),
        };
        self.inner.is_diff(&lhs, &rhs, run)
    }
}

/// Reports a difference only when every member does.
///
/// Each member acts as an independent justification for calling the values
/// equal; evaluation stops at the first member that finds no difference.
#[derive(Debug, Clone)]
pub struct ChainDiffor {
    diffors: Vec<Arc<dyn Diffor>>,
}

impl ChainDiffor {
    pub fn new(diffors: Vec<Arc<dyn Diffor>>) -> Result<Self> {
        if diffors.is_empty() {
            return Err(DiffError::invalid_argument("ChainDiffor needs at least one diffor"));
        }
        Ok(Self { diffors })
    }

    pub fn len(&self) -> usize {
        self.diffors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diffors.is_empty()
    }
}

impl Diffor for ChainDiffor {
    fn is_diff(&self, lhs: &CellValue, rhs: &CellValue, run: &RunContext) -> Result<bool> {
        for diffor in &self.diffors {
            if !diffor.is_diff(lhs, rhs, run)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// Differs unless both arguments are the very same value in memory
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityDiffor;

impl Diffor for IdentityDiffor {
    fn is_diff(&self, lhs: &CellValue, rhs: &CellValue, _run: &RunContext) -> Result<bool> {
        if let Some(outcome) = null_outcome(lhs, rhs) {
            return Ok(outcome);
        }
        Ok(!std::ptr::eq(lhs, rhs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn run() -> RunContext {
        RunContext::new()
    }

    fn date(y: i32, m: u32, d: u32) -> CellValue {
        CellValue::Date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[test]
    fn test_null_symmetry() {
        let cases: Vec<(Box<dyn Diffor>, CellValue)> = vec![
            (Box::new(EqualsDiffor), CellValue::Int(1)),
            (Box::new(NumberDiffor::new(0.5, false)), CellValue::Int(1)),
            (Box::new(DateDiffor::new(TimeSpan::days(1))), date(2024, 1, 1)),
            (Box::new(TextDiffor), CellValue::from("a")),
            (Box::new(IdentityDiffor), CellValue::from("a")),
        ];
        for (diffor, x) in &cases {
            assert!(!diffor.is_diff(&CellValue::Null, &CellValue::Null, &run()).unwrap());
            assert!(diffor.is_diff(&CellValue::Null, x, &run()).unwrap());
            assert!(diffor.is_diff(x, &CellValue::Null, &run()).unwrap());
        }
    }

    #[test]
    fn test_number_tolerance_boundary() {
        let diffor = NumberDiffor::new(0.5, false);
        let a = CellValue::Float(10.0);
        assert!(!diffor.is_diff(&a, &CellValue::Float(10.5), &run()).unwrap());
        assert!(diffor.is_diff(&a, &CellValue::Float(10.51), &run()).unwrap());
        assert!(!diffor.is_diff(&CellValue::Int(3), &CellValue::Float(3.0), &run()).unwrap());
    }

    #[test]
    fn test_number_null_is_zero() {
        let diffor = NumberDiffor::new(0.0, true);
        assert!(!diffor.is_diff(&CellValue::Null, &CellValue::Int(0), &run()).unwrap());
        assert!(diffor.is_diff(&CellValue::Null, &CellValue::Int(1), &run()).unwrap());
        assert!(!diffor.is_diff(&CellValue::Null, &CellValue::Null, &run()).unwrap());
    }

    #[test]
    fn test_number_rejects_text() {
        let diffor = NumberDiffor::new(0.0, false);
        assert!(matches!(
            diffor.is_diff(&CellValue::from("x"), &CellValue::Int(1), &run()),
            Err(DiffError::Type { .. })
        ));
    }

    #[test]
    fn test_number_nan() {
        let diffor = NumberDiffor::new(100.0, false);
        let nan = CellValue::Float(f64::NAN);
        assert!(diffor.is_diff(&nan, &CellValue::Int(20), &run()).unwrap());
        assert!(diffor.is_diff(&CellValue::Int(20), &nan, &run()).unwrap());
        assert!(!diffor.is_diff(&nan, &CellValue::Float(f64::NAN), &run()).unwrap());
    }

    #[test]
    fn test_number_parses_numeric_text() {
        let diffor = NumberDiffor::new(0.5, false);
        let text = CellValue::from("20.0");
        assert!(!diffor.is_diff(&text, &CellValue::Float(20.5), &run()).unwrap());
        assert!(diffor.is_diff(&text, &CellValue::Int(21), &run()).unwrap());
    }

    #[test]
    fn test_date_tolerance() {
        let diffor = DateDiffor::new(TimeSpan::days(1));
        assert!(!diffor.is_diff(&date(2024, 1, 1), &date(2024, 1, 2), &run()).unwrap());
        assert!(diffor.is_diff(&date(2024, 1, 1), &date(2024, 1, 3), &run()).unwrap());
        let strict = DateDiffor::new(TimeSpan::ZERO);
        assert!(strict.is_diff(&date(2024, 1, 1), &date(2024, 1, 2), &run()).unwrap());

        let huge = DateDiffor::new(TimeSpan::millis(i64::MIN));
        assert!(!huge.is_diff(&date(1970, 1, 1), &date(2024, 1, 2), &run()).unwrap());
    }

    #[test]
    fn test_date_parses_timestamp_text() {
        let diffor = DateDiffor::new(TimeSpan::minutes(5));
        let text = CellValue::from("2024-01-01T10:00:00");
        let close = CellValue::from("2024-01-01 10:04:00");
        let far = CellValue::from("2024-01-01 10:06:00");
        assert!(!diffor.is_diff(&text, &close, &run()).unwrap());
        assert!(diffor.is_diff(&text, &far, &run()).unwrap());
    }

    #[test]
    fn test_text_normalization() {
        assert_eq!(TextDiffor::normalize("  a \t\r\n b  c "), "a b c");
        let once = TextDiffor::normalize("x\n\ny");
        assert_eq!(TextDiffor::normalize(&once), once);

        let diffor = TextDiffor;
        assert!(!diffor.is_diff(&"a  b".into(), &"a b".into(), &run()).unwrap());
        assert!(!diffor.is_diff(&"line\none".into(), &"line one".into(), &run()).unwrap());
        assert!(diffor.is_diff(&"a b".into(), &"ab".into(), &run()).unwrap());
    }

    #[test]
    fn test_converting_diffor() {
        let diffor = ConvertingDiffor::new(
            None,
            Some(Conversion::new(ColumnType::Integer)),
            Arc::new(EqualsDiffor),
        );
        assert!(!diffor.is_diff(&CellValue::Int(5), &"5".into(), &run()).unwrap());
        assert!(diffor.is_diff(&CellValue::Int(5), &"6".into(), &run()).unwrap());

        let unsupported = ConvertingDiffor::new(
            Some(Conversion::new(ColumnType::Mixed)),
            None,
            Arc::new(EqualsDiffor),
        );
        assert!(matches!(
            unsupported.is_diff(&CellValue::Int(5), &CellValue::Int(5), &run()),
            Err(DiffError::UnsupportedConversion { .. })
        ));
    }

    #[test]
    fn test_chain_is_logical_and() {
        let chain = ChainDiffor::new(vec![
            Arc::new(NumberDiffor::new(1.0, false)),
            Arc::new(EqualsDiffor),
        ])
        .unwrap();
        // within tolerance: first member says equal
        assert!(!chain.is_diff(&CellValue::Float(1.0), &CellValue::Float(1.5), &run()).unwrap());
        // both members agree on a difference
        assert!(chain.is_diff(&CellValue::Float(1.0), &CellValue::Float(3.0), &run()).unwrap());
        assert!(ChainDiffor::new(Vec::new()).is_err());
    }

    #[test]
    fn test_identity() {
        let value = CellValue::from("same");
        let copy = value.clone();
        assert!(!IdentityDiffor.is_diff(&value, &value, &run()).unwrap());
        assert!(IdentityDiffor.is_diff(&value, &copy, &run()).unwrap());
    }
}

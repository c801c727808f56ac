//! Value conversion between column types

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use super::schema::ColumnType;
use super::table::CellValue;
use crate::error::{DiffError, Result};

const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";
const DEFAULT_TIME_FORMAT: &str = "%H:%M:%S";
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
];

/// Convert `value` to `target`, using `format` for temporal parsing/rendering.
///
/// Null converts to null. Targets with no registered converter fail with
/// [`DiffError::UnsupportedConversion`].
pub fn convert(value: &CellValue, target: ColumnType, format: Option<&str>) -> Result<CellValue> {
    if value.is_null() {
        return Ok(CellValue::Null);
    }

    match target {
        ColumnType::String | ColumnType::Text => Ok(CellValue::String(to_text(value, format))),
        ColumnType::Integer => to_integer(value),
        ColumnType::Real | ColumnType::Decimal => to_real(value, target),
        ColumnType::Boolean => to_boolean(value),
        ColumnType::Date => to_date(value, format),
        ColumnType::Time => to_time(value, format),
        ColumnType::Timestamp => to_timestamp(value, format),
        ColumnType::Mixed => Err(DiffError::UnsupportedConversion {
            from: value.type_name().to_string(),
            to: target.to_string(),
        }),
    }
}

/// Parse one raw text cell according to its declared column type.
///
/// `Mixed` infers the most specific type. Empty cells are null.
pub fn parse_cell(raw: &str, column_type: ColumnType, format: Option<&str>) -> Result<CellValue> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(CellValue::Null);
    }
    match column_type {
        ColumnType::Mixed => Ok(infer_cell(raw)),
        ColumnType::String | ColumnType::Text => Ok(CellValue::String(raw.to_string())),
        other => convert(&CellValue::String(trimmed.to_string()), other, format),
    }
}

/// Infer the most specific value whose rendering reproduces `s` exactly.
///
/// Text that would not survive a round trip (`007`, `1.0`, `TRUE`, ` 7`)
/// stays a string, so inference never makes two different cells equal.
/// Only blank cells become null.
pub fn infer_cell(s: &str) -> CellValue {
    if s.trim().is_empty() {
        return CellValue::Null;
    }

    match s {
        "true" => return CellValue::Bool(true),
        "false" => return CellValue::Bool(false),
        _ => {}
    }

    if let Ok(i) = s.parse::<i64>() {
        if i.to_string() == s {
            return CellValue::Int(i);
        }
    }

    if let Ok(f) = s.parse::<f64>() {
        if f.to_string() == s {
            return CellValue::Float(f);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, DEFAULT_DATE_FORMAT) {
        if date.format(DEFAULT_DATE_FORMAT).to_string() == s {
            return CellValue::Date(date);
        }
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            if dt.format(fmt).to_string() == s {
                return CellValue::DateTime(dt);
            }
        }
    }

    CellValue::String(s.to_string())
}

fn to_text(value: &CellValue, format: Option<&str>) -> String {
    match (value, format) {
        (CellValue::Date(d), Some(fmt)) => d.format(fmt).to_string(),
        (CellValue::Time(t), Some(fmt)) => t.format(fmt).to_string(),
        (CellValue::DateTime(dt), Some(fmt)) => dt.format(fmt).to_string(),
        _ => value.display().into_owned(),
    }
}

fn to_integer(value: &CellValue) -> Result<CellValue> {
    match value {
        CellValue::Int(i) => Ok(CellValue::Int(*i)),
        CellValue::Float(f) if f.fract() == 0.0 => Ok(CellValue::Int(*f as i64)),
        CellValue::Bool(b) => Ok(CellValue::Int(i64::from(*b))),
        CellValue::String(s) => s
            .trim()
            .parse::<i64>()
            .map(CellValue::Int)
            .map_err(|e| DiffError::conversion(s.as_str(), "integer", e.to_string())),
        other => Err(unsupported(other, ColumnType::Integer)),
    }
}

fn to_real(value: &CellValue, target: ColumnType) -> Result<CellValue> {
    match value {
        CellValue::Int(i) => Ok(CellValue::Float(*i as f64)),
        CellValue::Float(f) => Ok(CellValue::Float(*f)),
        CellValue::String(s) => s
            .trim()
            .parse::<f64>()
            .map(CellValue::Float)
            .map_err(|e| DiffError::conversion(s.as_str(), target.to_string(), e.to_string())),
        other => Err(unsupported(other, target)),
    }
}

fn to_boolean(value: &CellValue) -> Result<CellValue> {
    match value {
        CellValue::Bool(b) => Ok(CellValue::Bool(*b)),
        CellValue::Int(i) => Ok(CellValue::Bool(*i != 0)),
        CellValue::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "t" | "yes" | "y" | "1" => Ok(CellValue::Bool(true)),
            "false" | "f" | "no" | "n" | "0" => Ok(CellValue::Bool(false)),
            _ => Err(DiffError::conversion(s.as_str(), "boolean", "not a boolean")),
        },
        other => Err(unsupported(other, ColumnType::Boolean)),
    }
}

fn to_date(value: &CellValue, format: Option<&str>) -> Result<CellValue> {
    match value {
        CellValue::Date(d) => Ok(CellValue::Date(*d)),
        CellValue::DateTime(dt) => Ok(CellValue::Date(dt.date())),
        CellValue::String(s) => {
            NaiveDate::parse_from_str(s.trim(), format.unwrap_or(DEFAULT_DATE_FORMAT))
                .map(CellValue::Date)
                .map_err(|e| DiffError::conversion(s.as_str(), "date", e.to_string()))
        }
        other => Err(unsupported(other, ColumnType::Date)),
    }
}

fn to_time(value: &CellValue, format: Option<&str>) -> Result<CellValue> {
    match value {
        CellValue::Time(t) => Ok(CellValue::Time(*t)),
        CellValue::DateTime(dt) => Ok(CellValue::Time(dt.time())),
        CellValue::String(s) => {
            NaiveTime::parse_from_str(s.trim(), format.unwrap_or(DEFAULT_TIME_FORMAT))
                .map(CellValue::Time)
                .map_err(|e| DiffError::conversion(s.as_str(), "time", e.to_string()))
        }
        other => Err(unsupported(other, ColumnType::Time)),
    }
}

fn to_timestamp(value: &CellValue, format: Option<&str>) -> Result<CellValue> {
    match value {
        CellValue::DateTime(dt) => Ok(CellValue::DateTime(*dt)),
        CellValue::Date(d) => Ok(CellValue::DateTime(d.and_time(NaiveTime::default()))),
        CellValue::Int(millis) => chrono::DateTime::from_timestamp_millis(*millis)
            .map(|dt| CellValue::DateTime(dt.naive_utc()))
            .ok_or_else(|| DiffError::conversion(millis.to_string(), "timestamp", "out of range")),
        CellValue::String(s) => parse_datetime(s.trim(), format)
            .map(CellValue::DateTime)
            .ok_or_else(|| {
                DiffError::conversion(s.as_str(), "timestamp", "unrecognized timestamp")
            }),
        other => Err(unsupported(other, ColumnType::Timestamp)),
    }
}

fn parse_datetime(s: &str, format: Option<&str>) -> Option<NaiveDateTime> {
    match format {
        Some(fmt) => NaiveDateTime::parse_from_str(s, fmt).ok(),
        None => DATETIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok()),
    }
}

fn unsupported(value: &CellValue, target: ColumnType) -> DiffError {
    DiffError::UnsupportedConversion {
        from: value.type_name().to_string(),
        to: target.to_string(),
    }
}

//! Key ordering used to align rows across the two sides

use std::cmp::Ordering;

use super::table::{CellValue, TableModel};

/// Null-safe total order over cell values.
///
/// Null sorts before everything else. Ints and floats compare numerically
/// with each other; values of otherwise unrelated types order by type.
pub fn compare_values(a: &CellValue, b: &CellValue) -> Ordering {
    use CellValue::*;

    match (a, b) {
        (Null, Null) => Ordering::Equal,
        (Null, _) => Ordering::Less,
        (_, Null) => Ordering::Greater,
        (Bool(x), Bool(y)) => x.cmp(y),
        (Int(x), Int(y)) => x.cmp(y),
        (Float(x), Float(y)) => x.total_cmp(y),
        (Int(x), Float(y)) => (*x as f64).total_cmp(y),
        (Float(x), Int(y)) => x.total_cmp(&(*y as f64)),
        (String(x), String(y)) => x.cmp(y),
        (Date(x), Date(y)) => x.cmp(y),
        (Time(x), Time(y)) => x.cmp(y),
        (DateTime(x), DateTime(y)) => x.cmp(y),
        (Date(x), DateTime(y)) => x.and_time(chrono::NaiveTime::default()).cmp(y),
        (DateTime(x), Date(y)) => x.cmp(&y.and_time(chrono::NaiveTime::default())),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn type_rank(value: &CellValue) -> u8 {
    match value {
        CellValue::Null => 0,
        CellValue::Bool(_) => 1,
        CellValue::Int(_) | CellValue::Float(_) => 2,
        CellValue::Date(_) | CellValue::DateTime(_) => 3,
        CellValue::Time(_) => 4,
        CellValue::String(_) => 5,
    }
}

/// Lexicographic comparison of two key tuples, one component at a time
pub fn compare_keys(lhs: &[CellValue], rhs: &[CellValue]) -> Ordering {
    for (a, b) in lhs.iter().zip(rhs) {
        match compare_values(a, b) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    lhs.len().cmp(&rhs.len())
}

/// Compares an lhs row against an rhs row by their respective key columns
#[derive(Debug, Clone)]
pub struct RowComparator {
    lhs_key: Vec<usize>,
    rhs_key: Vec<usize>,
}

impl RowComparator {
    /// Pair the key columns of two models position by position
    pub fn new(lhs: &TableModel, rhs: &TableModel) -> Self {
        Self {
            lhs_key: lhs.key().to_vec(),
            rhs_key: rhs.key().to_vec(),
        }
    }

    pub fn arity(&self) -> usize {
        self.lhs_key.len()
    }

    /// First non-equal key component decides
    pub fn compare(&self, lhs_row: &[CellValue], rhs_row: &[CellValue]) -> Ordering {
        for (&l, &r) in self.lhs_key.iter().zip(&self.rhs_key) {
            let a = lhs_row.get(l).unwrap_or(&CellValue::Null);
            let b = rhs_row.get(r).unwrap_or(&CellValue::Null);
            match compare_values(a, b) {
                Ordering::Equal => continue,
                other => return other,
            }
        }
        Ordering::Equal
    }
}

//! Calendar spans used as temporal tolerances

use serde::{Deserialize, Serialize};

use crate::error::DiffError;

const SECOND: i64 = 1_000;
const MINUTE: i64 = 60 * SECOND;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;

const WEEK: i64 = 7 * DAY;
const MONTH: i64 = 30 * DAY;
const YEAR: i64 = 365 * DAY;

/// A span of time measured in milliseconds.
///
/// Week, month and year spans are estimates (7, 30 and 365 days), not
/// calendar-exact lengths. Unit constructors saturate at the `i64` range.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TimeSpan {
    millis: i64,
}

impl TimeSpan {
    pub const ZERO: TimeSpan = TimeSpan { millis: 0 };

    pub fn millis(n: i64) -> Self {
        Self { millis: n }
    }

    pub fn seconds(n: i64) -> Self {
        Self::millis(n.saturating_mul(SECOND))
    }

    pub fn minutes(n: i64) -> Self {
        Self::millis(n.saturating_mul(MINUTE))
    }

    pub fn hours(n: i64) -> Self {
        Self::millis(n.saturating_mul(HOUR))
    }

    pub fn days(n: i64) -> Self {
        Self::millis(n.saturating_mul(DAY))
    }

    /// Estimate: 7 days
    pub fn weeks(n: i64) -> Self {
        Self::millis(n.saturating_mul(WEEK))
    }

    /// Estimate: 30 days
    pub fn months(n: i64) -> Self {
        Self::millis(n.saturating_mul(MONTH))
    }

    /// Estimate: 365 days
    pub fn years(n: i64) -> Self {
        Self::millis(n.saturating_mul(YEAR))
    }

    pub fn as_millis(&self) -> i64 {
        self.millis
    }
}

impl std::fmt::Display for TimeSpan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}ms", self.millis)
    }
}

impl std::str::FromStr for TimeSpan {
    type Err = DiffError;

    /// Parses `<N><unit>` with units `ms`, `s`, `m`, `h`, `d`, `w`, `M`, `y`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| !c.is_ascii_digit() && c != '-')
            .unwrap_or(s.len());
        let (amount, unit) = s.split_at(split);
        let amount: i64 = amount
            .parse()
            .map_err(|_| DiffError::invalid_argument(format!("Invalid time span: {}", s)))?;

        let unit_millis = match unit {
            "ms" => 1,
            "" | "s" => SECOND,
            "m" => MINUTE,
            "h" => HOUR,
            "d" => DAY,
            "w" => WEEK,
            "M" => MONTH,
            "y" => YEAR,
            _ => {
                return Err(DiffError::invalid_argument(format!(
                    "Unknown time span unit in {}",
                    s
                )))
            }
        };
        amount
            .checked_mul(unit_millis)
            .map(TimeSpan::millis)
            .ok_or_else(|| DiffError::invalid_argument(format!("Time span out of range: {}", s)))
    }
}

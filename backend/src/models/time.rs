//! Calendar helpers for day-granular heatmap windows.
//!
//! Every piece of heatmap math works on whole local days. Timestamps coming
//! from the job source are truncated to their calendar date before they reach
//! the aggregator, so nothing downstream ever sees a time-of-day.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};

/// Short month names used for grid labels, January first.
pub const MONTH_SHORT_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const NAIVE_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// First day of the displayed week.
///
/// Rows of the grid are numbered from the configured week start, so the same
/// date lands on row 0 for Sunday-start grids and row 6 for Monday-start ones
/// when it is a Sunday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    #[default]
    Sunday,
    Monday,
}

impl WeekStart {
    /// Row position (`0..=6`) of `date` within its week.
    pub fn map_day_of_week(self, date: NaiveDate) -> u32 {
        let sunday_based = date.weekday().num_days_from_sunday();
        match self {
            WeekStart::Sunday => sunday_based,
            WeekStart::Monday => (sunday_based + 6) % 7,
        }
    }

    pub fn first_weekday(self) -> Weekday {
        match self {
            WeekStart::Sunday => Weekday::Sun,
            WeekStart::Monday => Weekday::Mon,
        }
    }

    /// Single-letter weekday headers in row order.
    pub fn weekday_labels(self) -> [&'static str; 7] {
        match self {
            WeekStart::Sunday => ["S", "M", "T", "W", "T", "F", "S"],
            WeekStart::Monday => ["M", "T", "W", "T", "F", "S", "S"],
        }
    }
}

impl FromStr for WeekStart {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sunday" | "sun" => Ok(WeekStart::Sunday),
            "monday" | "mon" => Ok(WeekStart::Monday),
            other => Err(format!(
                "Unsupported week start '{}'. Use sunday or monday.",
                other
            )),
        }
    }
}

impl fmt::Display for WeekStart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeekStart::Sunday => write!(f, "sunday"),
            WeekStart::Monday => write!(f, "monday"),
        }
    }
}

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Number of days in a calendar year (365 or 366).
pub fn days_in_year(year: i32) -> u32 {
    if is_leap_year(year) {
        366
    } else {
        365
    }
}

/// First day of `month` (1-based) in `year`, or `None` for an invalid month.
pub fn first_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
}

/// Last day of `month` (1-based) in `year`.
pub fn last_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    first_of_month(year, month)?;
    first_of_month(next_year, next_month)?.pred_opt()
}

/// Number of days in `month`; 0 for an invalid month.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    last_of_month(year, month).map(|d| d.day()).unwrap_or(0)
}

pub fn month_short_name(month: u32) -> &'static str {
    MONTH_SHORT_NAMES
        .get(month.wrapping_sub(1) as usize)
        .copied()
        .unwrap_or("")
}

/// Drop the time-of-day component of a timestamp.
pub fn truncate_to_day(timestamp: NaiveDateTime) -> NaiveDate {
    timestamp.date()
}

/// Signed number of whole days from `from` to `to`.
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    to.signed_duration_since(from).num_days()
}

/// Today's date in the local timezone.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parse an ISO-ish date string into a local calendar day.
///
/// Accepted shapes:
/// - `2024-01-05`
/// - `2024-01-05T08:30`, `2024-01-05T08:30:00`, `2024-01-05T08:30:00.123`
/// - `2024-01-05 08:30`, `2024-01-05 08:30:00`
/// - RFC 3339 with `Z` or an offset; converted to local time before truncation
///
/// Returns `None` for empty or unparseable input. Callers treat that as
/// "boundary missing" and drop the range.
pub fn parse_day(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Local).date_naive());
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(truncate_to_day(dt));
        }
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").ok()
}

//! Calendar grid layout.
//!
//! Two layouts are supported:
//!
//! - **Week columns** ([`layout`]): the whole window flows left to right, one
//!   column per week and one row per weekday, like a contribution graph.
//!   Month names are anchored on the column holding the 1st of each month.
//! - **Month blocks** ([`layout_month_blocks`]): each month of a year gets its
//!   own 7-wide calendar with blank cells before the 1st and after the last
//!   day.
//!
//! Both honour the configured [`WeekStart`].

use std::collections::BTreeMap;

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::{days_in_month, first_of_month, month_short_name, CoverageWindow, WeekStart};

/// Placement of one day in the week-column grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridCell {
    pub day_index: usize,
    pub date: NaiveDate,
    pub week_column: usize,
    pub weekday_row: u32,
}

/// Week-column layout of a window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridLayout {
    pub week_start: WeekStart,
    /// Row of day 0; the first column has this many leading blanks.
    pub week_offset: u32,
    pub weeks: usize,
    pub cells: Vec<GridCell>,
    /// Week column to month name.
    pub month_labels: BTreeMap<usize, String>,
}

impl GridLayout {
    pub fn label_at(&self, week_column: usize) -> Option<&str> {
        self.month_labels.get(&week_column).map(String::as_str)
    }
}

/// Lay out every day of `window` into week columns.
pub fn layout(window: &CoverageWindow, week_start: WeekStart) -> GridLayout {
    let week_offset = week_start.map_day_of_week(window.start());
    let offset = week_offset as usize;

    let cells: Vec<GridCell> = window
        .iter_days()
        .enumerate()
        .map(|(day_index, date)| GridCell {
            day_index,
            date,
            week_column: (day_index + offset) / 7,
            weekday_row: week_start.map_day_of_week(date),
        })
        .collect();

    let weeks = (window.num_days() as usize + offset).div_ceil(7);

    let mut month_labels = BTreeMap::new();
    for month_start in month_starts_within(window) {
        if let Some(day_index) = window.day_index(month_start) {
            let column = (day_index + offset) / 7;
            assign_label(&mut month_labels, column, month_short_name(month_start.month()));
        }
    }

    GridLayout {
        week_start,
        week_offset,
        weeks,
        cells,
        month_labels,
    }
}

/// First-come label assignment: a column keeps the first month placed on it.
fn assign_label(labels: &mut BTreeMap<usize, String>, column: usize, label: &str) {
    labels.entry(column).or_insert_with(|| label.to_string());
}

/// Every first-of-month date inside the window, in order.
fn month_starts_within(window: &CoverageWindow) -> Vec<NaiveDate> {
    let first = window.start();
    let Some(mut cursor) = first_of_month(first.year(), first.month()) else {
        return Vec::new();
    };
    if cursor < first {
        match cursor.checked_add_months(Months::new(1)) {
            Some(next) => cursor = next,
            None => return Vec::new(),
        }
    }

    let last = window.last_day();
    let mut starts = Vec::new();
    while cursor <= last {
        starts.push(cursor);
        match cursor.checked_add_months(Months::new(1)) {
            Some(next) => cursor = next,
            None => break,
        }
    }
    starts
}

/// One day inside a month block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthDayCell {
    pub date: NaiveDate,
    pub day_of_month: u32,
    /// Week line within the month, from 0.
    pub row: u32,
    /// Weekday position, from 0 at the configured week start.
    pub column: u32,
}

/// A month laid out as its own 7-wide calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthBlock {
    pub year: i32,
    pub month: u32,
    pub label: String,
    pub leading_blanks: u32,
    pub trailing_blanks: u32,
    pub week_rows: u32,
    pub days: Vec<MonthDayCell>,
}

impl MonthBlock {
    /// Total grid slots, blanks included.
    pub fn slot_count(&self) -> u32 {
        self.week_rows * 7
    }
}

/// Lay out the twelve months of `year` as independent blocks.
pub fn layout_month_blocks(year: i32, week_start: WeekStart) -> Vec<MonthBlock> {
    (1..=12)
        .filter_map(|month| month_block(year, month, week_start))
        .collect()
}

fn month_block(year: i32, month: u32, week_start: WeekStart) -> Option<MonthBlock> {
    let first = first_of_month(year, month)?;
    let leading_blanks = week_start.map_day_of_week(first);
    let length = days_in_month(year, month);

    let days = (0..length)
        .filter_map(|offset| {
            let date = first.with_day(offset + 1)?;
            let slot = leading_blanks + offset;
            Some(MonthDayCell {
                date,
                day_of_month: offset + 1,
                row: slot / 7,
                column: slot % 7,
            })
        })
        .collect();

    let week_rows = (leading_blanks + length).div_ceil(7);
    let trailing_blanks = week_rows * 7 - leading_blanks - length;

    Some(MonthBlock {
        year,
        month,
        label: month_short_name(month).to_string(),
        leading_blanks,
        trailing_blanks,
        week_rows,
        days,
    })
}

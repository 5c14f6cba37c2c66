//! Daily coverage aggregation service.
//!
//! Counts, for every day of a [`CoverageWindow`], how many intervals are
//! active on that day. Intervals are inclusive on both ends and are clipped to
//! the window before counting.
//!
//! ## Performance considerations
//! - Difference array + prefix sum: two point updates per interval and one
//!   pass over the window, so cost is O(intervals + days) regardless of how
//!   heavily intervals overlap
//! - Integer day offsets for the sweep; dates are only attached afterwards
//! - Fresh allocation per call, no shared state

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{days_between, CoverageWindow, Interval};

/// Coverage for a single day of the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCoverage {
    pub day_index: usize,
    pub date: NaiveDate,
    pub value: u32,
}

/// Result of one aggregation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageSeries {
    pub days: Vec<DayCoverage>,
    pub max_value: u32,
    /// Intervals that overlapped the window at all.
    pub counted_intervals: usize,
}

impl CoverageSeries {
    pub fn values(&self) -> Vec<u32> {
        self.days.iter().map(|d| d.value).collect()
    }

    pub fn value_on(&self, date: NaiveDate) -> Option<u32> {
        self.days.iter().find(|d| d.date == date).map(|d| d.value)
    }

    /// Days with at least one active interval.
    pub fn busy_days(&self) -> usize {
        self.days.iter().filter(|d| d.value > 0).count()
    }
}

/// Compute per-day coverage counts for `intervals` over `window`.
///
/// ## Edge cases
/// - No intervals: every value is 0 and `max_value` is 0
/// - Interval entirely before or after the window: skipped
/// - Interval straddling a window edge: clipped to the edge
/// - Reversed intervals are already order-normalised by [`Interval::new`]
pub fn aggregate<'a>(
    intervals: impl IntoIterator<Item = &'a Interval>,
    window: &CoverageWindow,
) -> CoverageSeries {
    let num_days = window.num_days() as usize;
    let first = window.start();
    let last = window.last_day();

    let mut diff = vec![0i64; num_days + 1];
    let mut counted_intervals = 0;

    for interval in intervals {
        if interval.end() < first || interval.start() > last {
            continue;
        }

        let clipped_start = interval.start().max(first);
        let clipped_end = interval.end().min(last);

        let (Some(start_idx), Some(end_idx)) = (
            day_offset(first, clipped_start, num_days),
            day_offset(first, clipped_end, num_days),
        ) else {
            log::warn!(
                "Skipping interval {:?} with out-of-range offsets in window starting {}",
                interval,
                first
            );
            continue;
        };

        diff[start_idx] += 1;
        if let Some(slot) = diff.get_mut(end_idx + 1) {
            *slot -= 1;
        }
        counted_intervals += 1;
    }

    let mut days = Vec::with_capacity(num_days);
    let mut running = 0i64;
    let mut max_value = 0u32;

    for (day_index, date) in window.iter_days().enumerate() {
        running += diff[day_index];
        let value = u32::try_from(running.max(0)).unwrap_or(u32::MAX);
        max_value = max_value.max(value);
        days.push(DayCoverage {
            day_index,
            date,
            value,
        });
    }

    CoverageSeries {
        days,
        max_value,
        counted_intervals,
    }
}

/// Offset of `day` from `first`, if it is a valid index into a window of
/// `num_days` days.
fn day_offset(first: NaiveDate, day: NaiveDate, num_days: usize) -> Option<usize> {
    let offset = usize::try_from(days_between(first, day)).ok()?;
    (offset < num_days).then_some(offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_aggregate_empty() {
        let window = CoverageWindow::calendar_year(2024).unwrap();
        let intervals: Vec<Interval> = vec![];
        let series = aggregate(&intervals, &window);

        assert_eq!(series.days.len(), 366);
        assert_eq!(series.max_value, 0);
        assert!(series.days.iter().all(|d| d.value == 0));
        assert_eq!(series.counted_intervals, 0);
    }

    #[test]
    fn test_aggregate_overlapping_intervals() {
        let window = CoverageWindow::calendar_year(2024).unwrap();
        let intervals = vec![
            Interval::days(date(2024, 1, 1), date(2024, 1, 3)),
            Interval::days(date(2024, 1, 2), date(2024, 1, 5)),
        ];

        let series = aggregate(&intervals, &window);

        assert_eq!(&series.values()[..7], &[1, 2, 2, 1, 1, 0, 0]);
        assert_eq!(series.max_value, 2);
        assert_eq!(series.busy_days(), 5);
        assert_eq!(series.value_on(date(2024, 12, 31)), Some(0));
    }

    #[test]
    fn test_aggregate_clips_to_window() {
        let window = CoverageWindow::rolling(date(2024, 3, 10), 5).unwrap();
        let intervals = vec![
            Interval::days(date(2024, 3, 1), date(2024, 3, 11)),
            Interval::days(date(2024, 3, 13), date(2024, 4, 30)),
        ];

        let series = aggregate(&intervals, &window);

        assert_eq!(series.values(), vec![1, 1, 0, 1, 1]);
        assert_eq!(series.counted_intervals, 2);
    }

    #[test]
    fn test_aggregate_skips_intervals_outside_window() {
        let window = CoverageWindow::rolling(date(2024, 6, 1), 10).unwrap();
        let intervals = vec![
            Interval::days(date(2024, 5, 1), date(2024, 5, 31)),
            Interval::days(date(2024, 6, 11), date(2024, 6, 20)),
        ];

        let series = aggregate(&intervals, &window);

        assert_eq!(series.max_value, 0);
        assert_eq!(series.counted_intervals, 0);
    }

    #[test]
    fn test_aggregate_reversed_interval() {
        let window = CoverageWindow::rolling(date(2024, 1, 1), 4).unwrap();
        let intervals = vec![Interval::days(date(2024, 1, 3), date(2024, 1, 2))];

        let series = aggregate(&intervals, &window);

        assert_eq!(series.values(), vec![0, 1, 1, 0]);
    }

    #[test]
    fn test_aggregate_single_day_window() {
        let window = CoverageWindow::rolling(date(2024, 1, 1), 1).unwrap();
        let intervals = vec![
            Interval::days(date(2023, 12, 1), date(2024, 2, 1)),
            Interval::days(date(2024, 1, 1), date(2024, 1, 1)),
        ];

        let series = aggregate(&intervals, &window);

        assert_eq!(series.values(), vec![2]);
        assert_eq!(series.max_value, 2);
    }

    #[test]
    fn test_interval_ending_on_last_day() {
        let window = CoverageWindow::rolling(date(2024, 1, 1), 3).unwrap();
        let intervals = vec![Interval::days(date(2024, 1, 2), date(2024, 1, 3))];

        let series = aggregate(&intervals, &window);

        // The closing decrement lands on the sentinel slot
        assert_eq!(series.values(), vec![0, 1, 1]);
    }

    #[test]
    fn test_day_offset_bounds() {
        let first = date(2024, 1, 1);
        assert_eq!(day_offset(first, date(2024, 1, 1), 3), Some(0));
        assert_eq!(day_offset(first, date(2024, 1, 3), 3), Some(2));
        assert_eq!(day_offset(first, date(2024, 1, 4), 3), None);
        assert_eq!(day_offset(first, date(2023, 12, 31), 3), None);
    }
}

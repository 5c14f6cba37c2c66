mod support;

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;

use planner_heatmap::models::{CoverageWindow, Interval, WeekStart};
use planner_heatmap::services::color::band_index;
use planner_heatmap::services::coverage::aggregate;
use planner_heatmap::services::layout::layout;
use support::date;

fn base() -> NaiveDate {
    date(2024, 2, 20)
}

fn interval_from_offsets(a: i64, b: i64) -> Interval {
    Interval::days(base() + Duration::days(a), base() + Duration::days(b))
}

/// Count covering intervals day by day.
fn brute_force(intervals: &[Interval], window: &CoverageWindow) -> Vec<u32> {
    window
        .iter_days()
        .map(|day| intervals.iter().filter(|i| i.covers(day)).count() as u32)
        .collect()
}

fn clipped_overlap(interval: &Interval, window: &CoverageWindow) -> u64 {
    let start = interval.start().max(window.start());
    let end = interval.end().min(window.last_day());
    if end < start {
        0
    } else {
        ((end - start).num_days() + 1) as u64
    }
}

proptest! {
    #[test]
    fn coverage_matches_brute_force(
        num_days in 1u32..80,
        offsets in prop::collection::vec((-30i64..110, -30i64..110), 0..40),
    ) {
        let window = CoverageWindow::rolling(base(), num_days).unwrap();
        let intervals: Vec<Interval> = offsets
            .iter()
            .map(|&(a, b)| interval_from_offsets(a, b))
            .collect();

        let series = aggregate(&intervals, &window);
        let expected = brute_force(&intervals, &window);

        prop_assert_eq!(series.values(), expected.clone());
        prop_assert_eq!(series.max_value, expected.iter().copied().max().unwrap_or(0));
        prop_assert_eq!(series.days.len(), num_days as usize);
    }

    #[test]
    fn coverage_sum_equals_clipped_lengths(
        num_days in 1u32..120,
        offsets in prop::collection::vec((-60i64..200, -60i64..200), 0..60),
    ) {
        let window = CoverageWindow::rolling(base(), num_days).unwrap();
        let intervals: Vec<Interval> = offsets
            .iter()
            .map(|&(a, b)| interval_from_offsets(a, b))
            .collect();

        let series = aggregate(&intervals, &window);
        let total: u64 = series.days.iter().map(|d| u64::from(d.value)).sum();
        let expected: u64 = intervals.iter().map(|i| clipped_overlap(i, &window)).sum();

        prop_assert_eq!(total, expected);
    }

    #[test]
    fn band_index_never_decreases(max in 1u32..500) {
        let mut previous = None;
        for value in 0..=max {
            let band = band_index(value, max);
            prop_assert!(band >= previous);
            previous = band;
        }
    }

    #[test]
    fn grid_cells_are_unique(start_offset in 0i64..730, num_days in 1u32..400, monday in any::<bool>()) {
        let window = CoverageWindow::rolling(date(2023, 1, 1) + Duration::days(start_offset), num_days).unwrap();
        let week_start = if monday { WeekStart::Monday } else { WeekStart::Sunday };
        let grid = layout(&window, week_start);

        let mut slots: Vec<(usize, u32)> = grid.cells.iter().map(|c| (c.week_column, c.weekday_row)).collect();
        slots.sort_unstable();
        slots.dedup();

        prop_assert_eq!(grid.cells.len(), num_days as usize);
        prop_assert_eq!(slots.len(), num_days as usize);
        prop_assert!(grid.cells.iter().all(|c| c.week_column < grid.weeks));
    }
}

//! Heatmap pipeline: job snapshot in, paint-ready view out.
//!
//! Chains ingestion, coverage aggregation, grid layout and colour mapping.
//! Pure and synchronous; callers decide where it runs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::color::{color_for, legend, LegendEntry, Rgba};
use super::coverage::{aggregate, CoverageSeries};
use super::layout::{layout, layout_month_blocks, MonthBlock};
use super::signature::snapshot_signature;
use crate::models::{CoverageWindow, TimelineSnapshot, WeekStart};

/// Inputs that shape a heatmap besides the data itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeatmapOptions {
    pub window: CoverageWindow,
    pub week_start: WeekStart,
    /// Also lay the window's year out as twelve month blocks.
    pub month_blocks: bool,
}

impl HeatmapOptions {
    pub fn new(window: CoverageWindow, week_start: WeekStart) -> Self {
        Self {
            window,
            week_start,
            month_blocks: false,
        }
    }

    pub fn with_month_blocks(mut self, enabled: bool) -> Self {
        self.month_blocks = enabled;
        self
    }
}

/// One painted day in week-column layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapCell {
    pub date: NaiveDate,
    pub day_index: usize,
    pub value: u32,
    pub week_column: usize,
    pub weekday_row: u32,
    pub color: Rgba,
    pub css_color: String,
    pub tooltip: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthLabel {
    pub week_column: usize,
    pub label: String,
}

/// One day of a month block. `value` is `None` for days outside the window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthBlockDay {
    pub date: NaiveDate,
    pub day_of_month: u32,
    pub row: u32,
    pub column: u32,
    pub value: Option<u32>,
    pub css_color: String,
    pub tooltip: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthBlockView {
    pub month: u32,
    pub label: String,
    pub leading_blanks: u32,
    pub trailing_blanks: u32,
    pub week_rows: u32,
    pub days: Vec<MonthBlockDay>,
}

/// Everything a surface needs to paint one heatmap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapView {
    pub window_start: NaiveDate,
    pub num_days: u32,
    pub week_start: WeekStart,
    pub week_offset: u32,
    pub weeks: usize,
    pub cells: Vec<HeatmapCell>,
    pub month_labels: Vec<MonthLabel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month_blocks: Option<Vec<MonthBlockView>>,
    pub legend: Vec<LegendEntry>,
    pub max_value: u32,
    pub interval_count: usize,
    pub dropped_count: usize,
    pub signature: String,
}

impl HeatmapView {
    pub fn cell_on(&self, date: NaiveDate) -> Option<&HeatmapCell> {
        self.cells.iter().find(|c| c.date == date)
    }
}

/// Tooltip shown for a day with `value` active intervals.
pub fn tooltip(value: u32) -> String {
    format!("{} processes", value)
}

/// Run the full pipeline over `snapshot`.
pub fn build_heatmap(snapshot: &TimelineSnapshot, options: &HeatmapOptions) -> HeatmapView {
    let report = snapshot.intervals();
    let window = &options.window;

    let series = aggregate(&report.intervals, window);
    let grid = layout(window, options.week_start);
    let max_value = series.max_value;

    let cells = grid
        .cells
        .iter()
        .zip(&series.days)
        .map(|(cell, day)| {
            let color = color_for(day.value, max_value);
            HeatmapCell {
                date: cell.date,
                day_index: cell.day_index,
                value: day.value,
                week_column: cell.week_column,
                weekday_row: cell.weekday_row,
                css_color: color.to_css(),
                color,
                tooltip: tooltip(day.value),
            }
        })
        .collect();

    let month_labels = grid
        .month_labels
        .iter()
        .map(|(week_column, label)| MonthLabel {
            week_column: *week_column,
            label: label.clone(),
        })
        .collect();

    let month_blocks = options.month_blocks.then(|| {
        layout_month_blocks(window.year(), options.week_start)
            .into_iter()
            .map(|block| month_block_view(block, window, &series))
            .collect()
    });

    log::debug!(
        "Built heatmap: {} intervals ({} dropped), max {} over {} days",
        report.intervals.len(),
        report.dropped,
        max_value,
        window.num_days()
    );

    HeatmapView {
        window_start: window.start(),
        num_days: window.num_days(),
        week_start: options.week_start,
        week_offset: grid.week_offset,
        weeks: grid.weeks,
        cells,
        month_labels,
        month_blocks,
        legend: legend(max_value),
        max_value,
        interval_count: report.intervals.len(),
        dropped_count: report.dropped,
        signature: snapshot_signature(snapshot),
    }
}

fn month_block_view(
    block: MonthBlock,
    window: &CoverageWindow,
    series: &CoverageSeries,
) -> MonthBlockView {
    let days = block
        .days
        .iter()
        .map(|cell| {
            let value = window
                .day_index(cell.date)
                .and_then(|i| series.days.get(i))
                .map(|d| d.value);
            let (css_color, tip) = match value {
                Some(v) => (color_for(v, series.max_value).to_css(), tooltip(v)),
                None => (color_for(0, 0).to_css(), String::new()),
            };
            MonthBlockDay {
                date: cell.date,
                day_of_month: cell.day_of_month,
                row: cell.row,
                column: cell.column,
                value,
                css_color,
                tooltip: tip,
            }
        })
        .collect();

    MonthBlockView {
        month: block.month,
        label: block.label,
        leading_blanks: block.leading_blanks,
        trailing_blanks: block.trailing_blanks,
        week_rows: block.week_rows,
        days,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::color::GRADIENT;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn scenario_snapshot() -> TimelineSnapshot {
        TimelineSnapshot::from_json_str(
            r#"{
                "JOB-A": {"starting_date": "2024-01-01", "ending_date": "2024-01-03"},
                "JOB-B": {"starting_date": "2024-01-02", "ending_date": "2024-01-05"},
                "JOB-C": {"starting_date": "soon", "ending_date": "2024-01-05"}
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_build_heatmap_scenario() {
        let options = HeatmapOptions::new(
            CoverageWindow::calendar_year(2024).unwrap(),
            WeekStart::Sunday,
        );
        let view = build_heatmap(&scenario_snapshot(), &options);

        assert_eq!(view.cells.len(), 366);
        assert_eq!(view.max_value, 2);
        assert_eq!(view.interval_count, 2);
        assert_eq!(view.dropped_count, 1);

        let values: Vec<u32> = view.cells[..6].iter().map(|c| c.value).collect();
        assert_eq!(values, vec![1, 2, 2, 1, 1, 0]);

        let busiest = view.cell_on(date(2024, 1, 2)).unwrap();
        assert_eq!(busiest.color, GRADIENT[4]);
        assert_eq!(busiest.tooltip, "2 processes");

        let idle = view.cell_on(date(2024, 6, 1)).unwrap();
        assert_eq!(idle.color, GRADIENT[0]);
        assert_eq!(idle.tooltip, "0 processes");

        assert_eq!(view.month_labels.len(), 12);
        assert!(view.month_blocks.is_none());
        assert_eq!(view.weeks, 53);
    }

    #[test]
    fn test_build_heatmap_empty_snapshot() {
        let options = HeatmapOptions::new(
            CoverageWindow::calendar_year(2023).unwrap(),
            WeekStart::Monday,
        );
        let view = build_heatmap(&TimelineSnapshot::default(), &options);

        assert_eq!(view.cells.len(), 365);
        assert_eq!(view.max_value, 0);
        assert!(view.cells.iter().all(|c| c.color == GRADIENT[0]));
        assert_eq!(view.legend.len(), 1);
    }

    #[test]
    fn test_month_blocks_attach_values() {
        let options = HeatmapOptions::new(
            CoverageWindow::rolling(date(2024, 1, 1), 10).unwrap(),
            WeekStart::Sunday,
        )
        .with_month_blocks(true);
        let view = build_heatmap(&scenario_snapshot(), &options);

        let blocks = view.month_blocks.as_ref().unwrap();
        assert_eq!(blocks.len(), 12);
        let jan = &blocks[0];
        assert_eq!(jan.days[1].value, Some(2));
        assert_eq!(jan.days[1].tooltip, "2 processes");
        // Jan 11 lies past the 10-day window
        assert_eq!(jan.days[10].value, None);
        assert!(jan.days[10].tooltip.is_empty());
    }

    #[test]
    fn test_view_serializes_without_blocks() {
        let options = HeatmapOptions::new(
            CoverageWindow::rolling(date(2024, 1, 1), 3).unwrap(),
            WeekStart::Sunday,
        );
        let view = build_heatmap(&scenario_snapshot(), &options);
        let json = serde_json::to_value(&view).unwrap();

        assert!(json.get("month_blocks").is_none());
        assert_eq!(json["cells"][1]["tooltip"], "2 processes");
        assert_eq!(json["week_start"], "sunday");
        assert_eq!(json["signature"].as_str().unwrap().len(), 64);
    }
}

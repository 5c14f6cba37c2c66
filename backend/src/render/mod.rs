//! Render adapter.
//!
//! [`paint`] walks a [`HeatmapView`] and drives any [`PaintSurface`]. This is
//! the only place that knows about grid slots and blank cells; surfaces just
//! draw what they are told.

mod html;

pub use html::HtmlSurface;

use chrono::NaiveDate;

use crate::error::HeatmapResult;
use crate::models::WeekStart;
use crate::services::color::LegendEntry;
use crate::services::heatmap::{HeatmapView, MonthBlockView};
use crate::services::preferences::{LayoutMode, PreferenceStore, ViewPreferences};

/// Where a cell sits on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellPosition {
    /// Week-column layout.
    Week { column: usize, row: u32 },
    /// Inside the block of `month`.
    Month { month: u32, row: u32, column: u32 },
}

/// What a month label is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelAnchor {
    WeekColumn(usize),
    MonthBlock(u32),
}

/// Frame information given to [`PaintSurface::begin`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub layout: LayoutMode,
    pub window_start: NaiveDate,
    pub num_days: u32,
    pub weeks: usize,
    pub week_start: WeekStart,
    pub weekday_labels: [&'static str; 7],
}

/// A painted day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaintCell<'a> {
    pub position: CellPosition,
    pub date: NaiveDate,
    pub value: Option<u32>,
    pub color: &'a str,
    pub tooltip: &'a str,
}

/// A drawing target for the heatmap.
///
/// Calls arrive in order: `begin`, then labels and cells, then `legend`
/// (only when enabled), then `finish`. In month-block mode each block's
/// label precedes its cells.
pub trait PaintSurface {
    fn begin(&mut self, frame: &Frame);

    fn month_label(&mut self, anchor: LabelAnchor, label: &str);

    fn paint_cell(&mut self, cell: &PaintCell<'_>);

    fn blank_cell(&mut self, position: CellPosition);

    fn legend(&mut self, entries: &[LegendEntry]);

    fn finish(&mut self);
}

/// Paint `view` onto `surface` using the preferences held by `store`.
pub fn paint(
    view: &HeatmapView,
    surface: &mut dyn PaintSurface,
    store: &dyn PreferenceStore,
) -> HeatmapResult<()> {
    let prefs = store.get()?;
    paint_with(view, surface, &prefs);
    Ok(())
}

/// Paint with already-resolved preferences.
pub fn paint_with(view: &HeatmapView, surface: &mut dyn PaintSurface, prefs: &ViewPreferences) {
    let blocks = match (prefs.layout, view.month_blocks.as_ref()) {
        (LayoutMode::MonthBlocks, Some(blocks)) => Some(blocks),
        (LayoutMode::MonthBlocks, None) => {
            log::debug!("Month blocks requested but not computed; painting week columns");
            None
        }
        (LayoutMode::WeekColumns, _) => None,
    };

    surface.begin(&Frame {
        layout: if blocks.is_some() {
            LayoutMode::MonthBlocks
        } else {
            LayoutMode::WeekColumns
        },
        window_start: view.window_start,
        num_days: view.num_days,
        weeks: view.weeks,
        week_start: view.week_start,
        weekday_labels: view.week_start.weekday_labels(),
    });

    match blocks {
        Some(blocks) => {
            for block in blocks {
                paint_block(block, surface, prefs.show_month_labels);
            }
        }
        None => paint_week_columns(view, surface, prefs.show_month_labels),
    }

    if prefs.show_legend {
        surface.legend(&view.legend);
    }
    surface.finish();
}

fn paint_week_columns(view: &HeatmapView, surface: &mut dyn PaintSurface, labels: bool) {
    if labels {
        for label in &view.month_labels {
            surface.month_label(LabelAnchor::WeekColumn(label.week_column), &label.label);
        }
    }

    let offset = view.week_offset as usize;
    for column in 0..view.weeks {
        for row in 0..7u32 {
            let position = CellPosition::Week { column, row };
            let cell = (column * 7 + row as usize)
                .checked_sub(offset)
                .and_then(|day_index| view.cells.get(day_index));

            match cell {
                Some(cell) => surface.paint_cell(&PaintCell {
                    position,
                    date: cell.date,
                    value: Some(cell.value),
                    color: &cell.css_color,
                    tooltip: &cell.tooltip,
                }),
                None => surface.blank_cell(position),
            }
        }
    }
}

fn paint_block(block: &MonthBlockView, surface: &mut dyn PaintSurface, labels: bool) {
    if labels {
        surface.month_label(LabelAnchor::MonthBlock(block.month), &block.label);
    }

    let position = |slot: u32| CellPosition::Month {
        month: block.month,
        row: slot / 7,
        column: slot % 7,
    };

    for slot in 0..block.leading_blanks {
        surface.blank_cell(position(slot));
    }
    for day in &block.days {
        surface.paint_cell(&PaintCell {
            position: CellPosition::Month {
                month: block.month,
                row: day.row,
                column: day.column,
            },
            date: day.date,
            value: day.value,
            color: &day.css_color,
            tooltip: &day.tooltip,
        });
    }
    let filled = block.leading_blanks + block.days.len() as u32;
    for slot in filled..filled + block.trailing_blanks {
        surface.blank_cell(position(slot));
    }
}

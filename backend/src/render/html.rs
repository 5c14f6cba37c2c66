use std::fmt::Write as _;

use super::{CellPosition, Frame, LabelAnchor, PaintCell, PaintSurface};
use crate::services::color::LegendEntry;
use crate::services::preferences::LayoutMode;

const CELL_PX: u32 = 12;
const GAP_PX: u32 = 2;

struct Block {
    label: Option<String>,
    cells: Vec<String>,
}

/// Paints an HTML fragment built from CSS grid `div`s.
///
/// Each day is a `div` with an inline background colour and a `title`
/// tooltip. Parts are buffered and assembled in [`PaintSurface::finish`].
#[derive(Default)]
pub struct HtmlSurface {
    frame: Option<Frame>,
    labels: Vec<String>,
    cells: Vec<String>,
    blocks: Vec<Block>,
    current_month: Option<u32>,
    legend: Option<String>,
    output: String,
}

impl HtmlSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// The assembled fragment; empty until `finish` has run.
    pub fn html(&self) -> &str {
        &self.output
    }

    pub fn into_html(self) -> String {
        self.output
    }

    fn block_for(&mut self, month: u32) -> &mut Block {
        // Cells may arrive before a label when labels are hidden.
        let needs_new = self.blocks.is_empty() || self.current_month != Some(month);
        if needs_new {
            self.blocks.push(Block {
                label: None,
                cells: Vec::new(),
            });
            self.current_month = Some(month);
        }
        let last = self.blocks.len() - 1;
        &mut self.blocks[last]
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// CSS grid placement; grid lines are 1-based.
fn grid_area(position: CellPosition) -> String {
    match position {
        CellPosition::Week { column, row } => {
            format!("grid-column:{};grid-row:{}", column + 1, row + 1)
        }
        CellPosition::Month { row, column, .. } => {
            format!("grid-column:{};grid-row:{}", column + 1, row + 1)
        }
    }
}

impl PaintSurface for HtmlSurface {
    fn begin(&mut self, frame: &Frame) {
        *self = Self {
            frame: Some(frame.clone()),
            ..Self::default()
        };
    }

    fn month_label(&mut self, anchor: LabelAnchor, label: &str) {
        match anchor {
            LabelAnchor::WeekColumn(column) => self.labels.push(format!(
                r#"<span class="heatmap-month" style="grid-column:{}">{}</span>"#,
                column + 1,
                escape(label)
            )),
            LabelAnchor::MonthBlock(month) => {
                self.block_for(month).label = Some(escape(label));
            }
        }
    }

    fn paint_cell(&mut self, cell: &PaintCell<'_>) {
        let html = format!(
            r#"<div class="heatmap-cell" data-date="{}" data-value="{}" title="{}" style="{};background-color:{}"></div>"#,
            cell.date,
            cell.value.map(|v| v.to_string()).unwrap_or_default(),
            escape(cell.tooltip),
            grid_area(cell.position),
            escape(cell.color),
        );
        match cell.position {
            CellPosition::Week { .. } => self.cells.push(html),
            CellPosition::Month { month, .. } => self.block_for(month).cells.push(html),
        }
    }

    fn blank_cell(&mut self, position: CellPosition) {
        let html = format!(
            r#"<div class="heatmap-cell heatmap-cell--blank" style="{}"></div>"#,
            grid_area(position)
        );
        match position {
            CellPosition::Week { .. } => self.cells.push(html),
            CellPosition::Month { month, .. } => self.block_for(month).cells.push(html),
        }
    }

    fn legend(&mut self, entries: &[LegendEntry]) {
        let mut html = String::from(r#"<div class="heatmap-legend">"#);
        for entry in entries {
            let _ = write!(
                html,
                r#"<span class="heatmap-legend-item"><span class="heatmap-swatch" style="background-color:{}"></span>{}</span>"#,
                escape(&entry.color.to_css()),
                escape(&entry.label)
            );
        }
        html.push_str("</div>");
        self.legend = Some(html);
    }

    fn finish(&mut self) {
        let layout = self
            .frame
            .as_ref()
            .map(|f| f.layout)
            .unwrap_or_default();
        let mut out = String::new();

        match layout {
            LayoutMode::WeekColumns => {
                let weeks = self.frame.as_ref().map_or(0, |f| f.weeks);
                let _ = write!(out, r#"<div class="heatmap" data-layout="week-columns">"#);
                let _ = write!(
                    out,
                    r#"<div class="heatmap-months" style="display:grid;grid-template-columns:repeat({weeks},{CELL_PX}px);column-gap:{GAP_PX}px">"#
                );
                out.extend(self.labels.drain(..));
                out.push_str("</div>");
                let _ = write!(
                    out,
                    r#"<div class="heatmap-grid" style="display:grid;grid-template-columns:repeat({weeks},{CELL_PX}px);grid-template-rows:repeat(7,{CELL_PX}px);gap:{GAP_PX}px">"#
                );
                out.extend(self.cells.drain(..));
                out.push_str("</div>");
            }
            LayoutMode::MonthBlocks => {
                let _ = write!(out, r#"<div class="heatmap" data-layout="month-blocks">"#);
                for block in self.blocks.drain(..) {
                    out.push_str(r#"<section class="heatmap-block">"#);
                    if let Some(label) = block.label {
                        let _ = write!(out, r#"<h4 class="heatmap-month">{}</h4>"#, label);
                    }
                    let _ = write!(
                        out,
                        r#"<div class="heatmap-grid" style="display:grid;grid-template-columns:repeat(7,{CELL_PX}px);gap:{GAP_PX}px">"#
                    );
                    out.extend(block.cells);
                    out.push_str("</div></section>");
                }
            }
        }

        if let Some(legend) = self.legend.take() {
            out.push_str(&legend);
        }
        out.push_str("</div>");
        self.output = out;
    }
}

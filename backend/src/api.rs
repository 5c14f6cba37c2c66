//! Public API surface.
//!
//! Flat re-exports of the types callers embedding the engine need, so they
//! do not have to know the module layout.

pub use crate::config::{HeatmapConfig, WindowMode};
pub use crate::error::{ErrorContext, HeatmapError, HeatmapResult};
pub use crate::models::{
    CoverageWindow, Interval, JobRanges, JobRecord, RawDateRange, TimelineSnapshot, WeekStart,
};
pub use crate::render::{paint, paint_with, CellPosition, Frame, HtmlSurface, LabelAnchor, PaintCell, PaintSurface};
pub use crate::services::color::{color_for, legend, LegendEntry, Rgba};
pub use crate::services::coverage::{aggregate, CoverageSeries, DayCoverage};
pub use crate::services::heatmap::{
    build_heatmap, HeatmapCell, HeatmapOptions, HeatmapView, MonthBlockDay, MonthBlockView,
    MonthLabel,
};
pub use crate::services::layout::{layout, layout_month_blocks, GridCell, GridLayout, MonthBlock};
pub use crate::services::poller::{ChangeEvent, PollOutcome, Poller};
pub use crate::services::preferences::{
    FilePreferenceStore, LayoutMode, MemoryPreferenceStore, PreferenceStore, PreferencesUpdate,
    ViewPreferences,
};
pub use crate::services::source::{fetcher_for_source, FetchError, Fetcher, FileFetcher};

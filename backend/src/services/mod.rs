//! Service layer: the heatmap pipeline stages and the components that drive
//! them.
//!
//! Coverage, colour, layout and the pipeline are pure. The poller, sources
//! and preference stores hold state or do I/O.

pub mod color;
pub mod coverage;
pub mod heatmap;
pub mod layout;
pub mod poller;
pub mod preferences;
pub mod signature;
pub mod source;

#[cfg(test)]
mod poller_tests;

pub use color::{band_index, color_for, legend, smoothstep, LegendEntry, Rgba, BAND_EDGES, GRADIENT};
pub use coverage::{aggregate, CoverageSeries, DayCoverage};
pub use heatmap::{build_heatmap, tooltip, HeatmapCell, HeatmapOptions, HeatmapView, MonthLabel};
pub use layout::{layout, layout_month_blocks, GridCell, GridLayout, MonthBlock};
pub use poller::{ChangeEvent, PollOutcome, Poller};
pub use preferences::{
    FilePreferenceStore, LayoutMode, MemoryPreferenceStore, PreferenceStore, PreferencesUpdate,
    ViewPreferences,
};
pub use signature::{snapshot_signature, ChangeDetector};
pub use source::{fetcher_for_source, FetchError, FileFetcher, Fetcher};
#[cfg(feature = "http-source")]
pub use source::HttpFetcher;

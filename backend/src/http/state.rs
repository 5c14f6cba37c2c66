//! Application state for the HTTP server.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::config::HeatmapConfig;
use crate::error::HeatmapResult;
use crate::models::{today, CoverageWindow, TimelineSnapshot};
use crate::services::heatmap::{build_heatmap, HeatmapOptions, HeatmapView};
use crate::services::preferences::{LayoutMode, PreferenceStore, ViewPreferences};

type WindowFn = dyn Fn() -> HeatmapResult<CoverageWindow> + Send + Sync;

/// The most recent snapshot the poller delivered, with its rendered view.
#[derive(Debug, Clone)]
pub struct Published {
    pub snapshot: TimelineSnapshot,
    pub view: Arc<HeatmapView>,
    pub options: HeatmapOptions,
    pub refreshed_at: DateTime<Utc>,
}

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Written by the poller callback, read by handlers.
    pub latest: Arc<RwLock<Option<Published>>>,
    /// View preferences (week start, layout, toggles).
    pub preferences: Arc<dyn PreferenceStore>,
    /// Compute month blocks even when the layout preference does not ask.
    pub always_month_blocks: bool,
    window: Arc<WindowFn>,
}

impl AppState {
    /// State whose window follows the configuration and the current date.
    pub fn new(config: &HeatmapConfig, preferences: Arc<dyn PreferenceStore>) -> Self {
        let config = config.clone();
        let always_month_blocks = config.layout.month_blocks;
        Self {
            latest: Arc::new(RwLock::new(None)),
            preferences,
            always_month_blocks,
            window: Arc::new(move || config.resolve_window(today())),
        }
    }

    /// State pinned to a fixed window.
    pub fn with_window(window: CoverageWindow, preferences: Arc<dyn PreferenceStore>) -> Self {
        Self {
            latest: Arc::new(RwLock::new(None)),
            preferences,
            always_month_blocks: false,
            window: Arc::new(move || Ok(window)),
        }
    }

    pub fn current_window(&self) -> HeatmapResult<CoverageWindow> {
        (self.window)()
    }

    /// Options for the current window and the given preferences.
    pub fn options_for(&self, prefs: &ViewPreferences) -> HeatmapResult<HeatmapOptions> {
        Ok(HeatmapOptions::new(self.current_window()?, prefs.week_start).with_month_blocks(
            self.always_month_blocks || prefs.layout == LayoutMode::MonthBlocks,
        ))
    }

    /// Store a changed snapshot and render its view.
    pub fn publish(&self, snapshot: TimelineSnapshot) -> HeatmapResult<Arc<HeatmapView>> {
        let prefs = self.preferences.get()?;
        let options = self.options_for(&prefs)?;
        let view = Arc::new(build_heatmap(&snapshot, &options));

        *self.latest.write() = Some(Published {
            snapshot,
            view: Arc::clone(&view),
            options,
            refreshed_at: Utc::now(),
        });
        Ok(view)
    }

    /// The latest view, re-rendered if the window or preferences moved since
    /// it was built. `None` until the first snapshot is published.
    pub fn current_view(&self) -> HeatmapResult<Option<Arc<HeatmapView>>> {
        let prefs = self.preferences.get()?;
        let options = self.options_for(&prefs)?;

        {
            let latest = self.latest.read();
            match latest.as_ref() {
                None => return Ok(None),
                Some(published) if published.options == options => {
                    return Ok(Some(Arc::clone(&published.view)));
                }
                Some(_) => {}
            }
        }

        let mut latest = self.latest.write();
        let Some(published) = latest.as_mut() else {
            return Ok(None);
        };
        if published.options != options {
            tracing::debug!("Re-rendering heatmap for updated window or preferences");
            published.view = Arc::new(build_heatmap(&published.snapshot, &options));
            published.options = options;
        }
        Ok(Some(Arc::clone(&published.view)))
    }

    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        self.latest.read().as_ref().map(|p| p.refreshed_at)
    }

    pub fn last_signature(&self) -> Option<String> {
        self.latest.read().as_ref().map(|p| p.view.signature.clone())
    }
}

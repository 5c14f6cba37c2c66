//! View preferences.
//!
//! The week start, layout mode and legend toggle are user choices that
//! survive restarts. They live behind [`PreferenceStore`] so the render
//! adapter and HTTP handlers get them injected instead of reading globals.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{ErrorContext, HeatmapError, HeatmapResult};
use crate::models::WeekStart;

/// How the heatmap grid is arranged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutMode {
    /// One column per week across the whole window.
    #[default]
    WeekColumns,
    /// Twelve separate month calendars.
    MonthBlocks,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewPreferences {
    pub week_start: WeekStart,
    pub layout: LayoutMode,
    pub show_legend: bool,
    pub show_month_labels: bool,
}

impl Default for ViewPreferences {
    fn default() -> Self {
        Self {
            week_start: WeekStart::default(),
            layout: LayoutMode::default(),
            show_legend: true,
            show_month_labels: true,
        }
    }
}

/// Partial update; `None` fields are left alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferencesUpdate {
    pub week_start: Option<WeekStart>,
    pub layout: Option<LayoutMode>,
    pub show_legend: Option<bool>,
    pub show_month_labels: Option<bool>,
}

impl ViewPreferences {
    pub fn apply(mut self, update: &PreferencesUpdate) -> Self {
        if let Some(week_start) = update.week_start {
            self.week_start = week_start;
        }
        if let Some(layout) = update.layout {
            self.layout = layout;
        }
        if let Some(show_legend) = update.show_legend {
            self.show_legend = show_legend;
        }
        if let Some(show_month_labels) = update.show_month_labels {
            self.show_month_labels = show_month_labels;
        }
        self
    }
}

/// Source of truth for [`ViewPreferences`].
pub trait PreferenceStore: Send + Sync {
    fn get(&self) -> HeatmapResult<ViewPreferences>;

    fn set(&self, prefs: ViewPreferences) -> HeatmapResult<()>;

    /// Apply `update` and return the stored result.
    fn update(&self, update: &PreferencesUpdate) -> HeatmapResult<ViewPreferences> {
        let next = self.get()?.apply(update);
        self.set(next)?;
        Ok(next)
    }
}

/// In-memory preferences, lost on restart.
#[derive(Clone, Default)]
pub struct MemoryPreferenceStore {
    prefs: Arc<RwLock<ViewPreferences>>,
}

impl MemoryPreferenceStore {
    pub fn new(initial: ViewPreferences) -> Self {
        Self {
            prefs: Arc::new(RwLock::new(initial)),
        }
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self) -> HeatmapResult<ViewPreferences> {
        Ok(*self.prefs.read())
    }

    fn set(&self, prefs: ViewPreferences) -> HeatmapResult<()> {
        *self.prefs.write() = prefs;
        Ok(())
    }
}

/// JSON-file backed preferences.
///
/// The file is read lazily on first access; a missing file yields the
/// defaults. Every change is written through before it becomes visible.
pub struct FilePreferenceStore {
    path: PathBuf,
    defaults: ViewPreferences,
    cache: RwLock<Option<ViewPreferences>>,
}

impl FilePreferenceStore {
    pub fn new(path: impl Into<PathBuf>, defaults: ViewPreferences) -> Self {
        Self {
            path: path.into(),
            defaults,
            cache: RwLock::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> HeatmapResult<ViewPreferences> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!(
                    "No preferences at {}; using defaults",
                    self.path.display()
                );
                return Ok(self.defaults);
            }
            Err(e) => {
                return Err(HeatmapError::preferences_with_context(
                    format!("Failed to read {}: {}", self.path.display(), e),
                    ErrorContext::new("load_preferences")
                        .with_entity("preferences")
                        .retryable(),
                ))
            }
        };

        serde_json::from_str(&content).map_err(|e| {
            HeatmapError::preferences_with_context(
                format!("Invalid preferences file {}: {}", self.path.display(), e),
                ErrorContext::new("load_preferences").with_entity("preferences"),
            )
        })
    }

    fn persist(&self, prefs: &ViewPreferences) -> HeatmapResult<()> {
        let write_error = |e: std::io::Error| {
            HeatmapError::preferences_with_context(
                format!("Failed to write {}: {}", self.path.display(), e),
                ErrorContext::new("save_preferences")
                    .with_entity("preferences")
                    .retryable(),
            )
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_error)?;
        }

        let body = serde_json::to_string_pretty(prefs).map_err(|e| {
            HeatmapError::preferences(format!("Failed to serialise preferences: {}", e))
        })?;

        // Atomic replace
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, body).map_err(write_error)?;
        std::fs::rename(&tmp, &self.path).map_err(write_error)?;
        Ok(())
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn get(&self) -> HeatmapResult<ViewPreferences> {
        if let Some(prefs) = *self.cache.read() {
            return Ok(prefs);
        }

        let mut cache = self.cache.write();
        if let Some(prefs) = *cache {
            return Ok(prefs);
        }
        let prefs = self.load()?;
        *cache = Some(prefs);
        Ok(prefs)
    }

    fn set(&self, prefs: ViewPreferences) -> HeatmapResult<()> {
        let mut cache = self.cache.write();
        self.persist(&prefs)?;
        *cache = Some(prefs);
        Ok(())
    }
}

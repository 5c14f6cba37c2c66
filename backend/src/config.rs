//! Service configuration.
//!
//! Settings come from a `heatmap.toml` file (every field has a default, the
//! file itself is optional) and are then overridden by environment variables.
//!
//! # Environment Variables
//! - `HEATMAP_SOURCE_URL`: job map source, `http(s)://` URL or file path
//! - `HEATMAP_POLL_INTERVAL_MS`: poll interval in milliseconds (> 0)
//! - `HEATMAP_WEEK_START`: `sunday` | `monday`
//! - `HEATMAP_WINDOW_MODE`: `calendar-year` | `rolling`
//! - `HEATMAP_ROLLING_DAYS`: rolling window length (>= 1)
//! - `HEATMAP_YEAR`: calendar year to show (default: current year)
//! - `HEATMAP_PREFERENCES_PATH`: view preferences file
//! - `HOST`, `PORT`: server bind address

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{ErrorContext, HeatmapError, HeatmapResult};
use crate::models::{CoverageWindow, WeekStart};

/// Which days the heatmap covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WindowMode {
    /// January 1st to December 31st.
    #[default]
    CalendarYear,
    /// `rolling_days` days starting today.
    Rolling,
}

impl FromStr for WindowMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "calendar-year" | "calendar_year" | "year" => Ok(Self::CalendarYear),
            "rolling" => Ok(Self::Rolling),
            other => Err(format!(
                "Unknown window mode '{}'. Use calendar-year or rolling.",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeatmapConfig {
    #[serde(default)]
    pub window: WindowSettings,
    #[serde(default)]
    pub layout: LayoutSettings,
    #[serde(default)]
    pub poller: PollerSettings,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub preferences: PreferencesSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowSettings {
    #[serde(default)]
    pub mode: WindowMode,
    #[serde(default = "default_rolling_days")]
    pub rolling_days: u32,
    /// Calendar year to show; the current year when unset.
    #[serde(default)]
    pub year: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayoutSettings {
    #[serde(default)]
    pub week_start: WeekStart,
    /// Compute month blocks alongside the week-column grid.
    #[serde(default)]
    pub month_blocks: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerSettings {
    #[serde(default = "default_source_url")]
    pub source_url: String,
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferencesSettings {
    #[serde(default = "default_preferences_path")]
    pub path: PathBuf,
}

fn default_rolling_days() -> u32 {
    365
}

fn default_source_url() -> String {
    "jobs.json".to_string()
}

fn default_interval_ms() -> u64 {
    5000
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_preferences_path() -> PathBuf {
    PathBuf::from("heatmap-preferences.json")
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            mode: WindowMode::default(),
            rolling_days: default_rolling_days(),
            year: None,
        }
    }
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self {
            source_url: default_source_url(),
            interval_ms: default_interval_ms(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for PreferencesSettings {
    fn default() -> Self {
        Self {
            path: default_preferences_path(),
        }
    }
}

const CONFIG_FILE: &str = "heatmap.toml";

impl HeatmapConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> HeatmapResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            HeatmapError::configuration_with_context(
                format!("Failed to read config file: {}", e),
                ErrorContext::new("load_config").with_details(path.display().to_string()),
            )
        })?;

        Self::from_toml_str(&content).map_err(|e| e.with_operation("load_config"))
    }

    pub fn from_toml_str(content: &str) -> HeatmapResult<Self> {
        toml::from_str(content).map_err(|e| {
            HeatmapError::configuration(format!("Failed to parse config file: {}", e))
        })
    }

    /// Find `heatmap.toml` in the standard locations.
    ///
    /// Searches:
    /// 1. Current directory
    /// 2. `backend/` directory
    /// 3. Parent directory
    pub fn find_default_file() -> Option<PathBuf> {
        [
            PathBuf::from(CONFIG_FILE),
            PathBuf::from("backend").join(CONFIG_FILE),
            PathBuf::from("..").join(CONFIG_FILE),
        ]
        .into_iter()
        .find(|path| path.exists())
    }

    /// Defaults, overlaid by the config file if one exists, overlaid by the
    /// process environment. The result is validated.
    pub fn load() -> HeatmapResult<Self> {
        let mut config = match Self::find_default_file() {
            Some(path) => {
                log::info!("Loading configuration from {}", path.display());
                Self::from_file(&path)?
            }
            None => {
                log::info!("No {} found; using defaults", CONFIG_FILE);
                Self::default()
            }
        };

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> HeatmapResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("HEATMAP_SOURCE_URL") {
            self.poller.source_url = url;
        }
        if let Some(raw) = lookup("HEATMAP_POLL_INTERVAL_MS") {
            self.poller.interval_ms = parse_env("HEATMAP_POLL_INTERVAL_MS", &raw)?;
        }
        if let Some(raw) = lookup("HEATMAP_WEEK_START") {
            self.layout.week_start = parse_env("HEATMAP_WEEK_START", &raw)?;
        }
        if let Some(raw) = lookup("HEATMAP_WINDOW_MODE") {
            self.window.mode = parse_env("HEATMAP_WINDOW_MODE", &raw)?;
        }
        if let Some(raw) = lookup("HEATMAP_ROLLING_DAYS") {
            self.window.rolling_days = parse_env("HEATMAP_ROLLING_DAYS", &raw)?;
        }
        if let Some(raw) = lookup("HEATMAP_YEAR") {
            self.window.year = Some(parse_env("HEATMAP_YEAR", &raw)?);
        }
        if let Some(path) = lookup("HEATMAP_PREFERENCES_PATH") {
            self.preferences.path = PathBuf::from(path);
        }
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(raw) = lookup("PORT") {
            self.server.port = parse_env("PORT", &raw)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> HeatmapResult<()> {
        if self.poller.interval_ms == 0 {
            return Err(HeatmapError::configuration(
                "poller.interval_ms must be greater than zero",
            ));
        }
        if self.window.rolling_days == 0 {
            return Err(HeatmapError::configuration(
                "window.rolling_days must be at least 1",
            ));
        }
        if self.poller.source_url.trim().is_empty() {
            return Err(HeatmapError::configuration("poller.source_url is empty"));
        }
        if let Some(year) = self.window.year {
            CoverageWindow::calendar_year(year).map_err(|e| {
                HeatmapError::configuration_with_context(
                    format!("window.year {} is out of range: {}", year, e),
                    ErrorContext::new("validate_config").with_entity("window.year"),
                )
            })?;
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poller.interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.poller.request_timeout_ms)
    }

    /// `host:port` for the HTTP listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Resolve the coverage window relative to `today`.
    pub fn resolve_window(&self, today: NaiveDate) -> HeatmapResult<CoverageWindow> {
        match self.window.mode {
            WindowMode::CalendarYear => {
                CoverageWindow::calendar_year(self.window.year.unwrap_or_else(|| today.year()))
            }
            WindowMode::Rolling => CoverageWindow::rolling(today, self.window.rolling_days),
        }
        .map_err(|e| e.with_operation("resolve_window"))
    }
}

fn parse_env<T: FromStr>(key: &str, raw: &str) -> HeatmapResult<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| {
        HeatmapError::configuration_with_context(
            format!("{} has an invalid value '{}': {}", key, raw, e),
            ErrorContext::new("apply_env_overrides").with_entity(key),
        )
    })
}

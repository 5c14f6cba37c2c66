//! Request and response bodies that exist only at the HTTP boundary.
//!
//! Views and preferences are served as their library types; these cover the
//! rest.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{TimelineSnapshot, WeekStart};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status of the service
    pub status: String,
    /// Version of the API
    pub version: String,
    /// When the poller last delivered a changed snapshot
    pub last_refresh: Option<DateTime<Utc>>,
    /// Signature of that snapshot
    pub signature: Option<String>,
}

/// Body of `POST /v1/heatmap/preview`.
///
/// With `start`, the window runs `days` days (365 by default) from it. With
/// only `days`, it runs from today. With neither, the server's window is used.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewRequest {
    pub jobs: TimelineSnapshot,
    #[serde(default)]
    pub week_start: Option<WeekStart>,
    #[serde(default)]
    pub start: Option<NaiveDate>,
    #[serde(default)]
    pub days: Option<u32>,
    #[serde(default)]
    pub month_blocks: bool,
}

pub const DEFAULT_PREVIEW_DAYS: u32 = 365;

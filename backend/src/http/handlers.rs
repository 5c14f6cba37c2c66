//! HTTP handlers for the REST API.
//!
//! Handlers only translate between HTTP and the state/service layer; the
//! heatmap itself is built by [`crate::services::heatmap`]. Anything that
//! can reach the preference store runs on the blocking pool, since a file
//! store does synchronous I/O.

use axum::{extract::State, response::Html, Json};

use super::dto::{HealthResponse, PreviewRequest, DEFAULT_PREVIEW_DAYS};
use super::error::AppError;
use super::state::AppState;
use crate::error::HeatmapResult;
use crate::models::{today, CoverageWindow};
use crate::render::{paint, HtmlSurface};
use crate::services::heatmap::{build_heatmap, HeatmapOptions, HeatmapView};
use crate::services::preferences::{PreferencesUpdate, ViewPreferences};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

const NO_DATA: &str = "No job timeline has been fetched yet";

/// Run store-touching work off the async runtime.
async fn blocking<T, F>(work: F) -> Result<T, AppError>
where
    F: FnOnce() -> HeatmapResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AppError::Internal(format!("Blocking task failed: {}", e)))?
        .map_err(AppError::from)
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        last_refresh: state.last_refresh(),
        signature: state.last_signature(),
    }))
}

/// GET /v1/heatmap
///
/// Latest heatmap view. 404 until the first poll has landed.
pub async fn get_heatmap(State(state): State<AppState>) -> HandlerResult<HeatmapView> {
    let view = blocking(move || state.current_view())
        .await?
        .ok_or_else(|| AppError::NotFound(NO_DATA.to_string()))?;
    Ok(Json(HeatmapView::clone(&view)))
}

/// GET /v1/heatmap/html
///
/// Latest heatmap painted as an HTML fragment.
pub async fn get_heatmap_html(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let html = blocking(move || {
        let Some(view) = state.current_view()? else {
            return Ok(None);
        };
        let mut surface = HtmlSurface::new();
        paint(&view, &mut surface, state.preferences.as_ref())?;
        Ok(Some(surface.into_html()))
    })
    .await?
    .ok_or_else(|| AppError::NotFound(NO_DATA.to_string()))?;

    Ok(Html(html))
}

/// GET /v1/preferences
pub async fn get_preferences(State(state): State<AppState>) -> HandlerResult<ViewPreferences> {
    let prefs = blocking(move || state.preferences.get()).await?;
    Ok(Json(prefs))
}

/// PUT /v1/preferences
///
/// Partial update; omitted fields keep their value.
pub async fn update_preferences(
    State(state): State<AppState>,
    Json(update): Json<PreferencesUpdate>,
) -> HandlerResult<ViewPreferences> {
    let prefs = blocking(move || state.preferences.update(&update)).await?;
    tracing::info!(?prefs, "Preferences updated");
    Ok(Json(prefs))
}

/// POST /v1/heatmap/preview
///
/// Build a view from a posted job map. The poller's state is untouched.
pub async fn preview_heatmap(
    State(state): State<AppState>,
    Json(request): Json<PreviewRequest>,
) -> HandlerResult<HeatmapView> {
    let window = match (request.start, request.days) {
        (Some(start), days) => {
            CoverageWindow::rolling(start, days.unwrap_or(DEFAULT_PREVIEW_DAYS))?
        }
        (None, Some(days)) => CoverageWindow::rolling(today(), days)?,
        (None, None) => state.current_window()?,
    };

    let store = state.preferences.clone();
    let prefs = blocking(move || store.get()).await?;
    let week_start = request.week_start.unwrap_or(prefs.week_start);
    let options = HeatmapOptions::new(window, week_start).with_month_blocks(request.month_blocks);

    Ok(Json(build_heatmap(&request.jobs, &options)))
}

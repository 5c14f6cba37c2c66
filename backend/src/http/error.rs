//! HTTP error handling and response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::HeatmapError;

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Resource not found
    NotFound(String),
    /// Invalid request (validation error)
    BadRequest(String),
    /// Internal server error
    Internal(String),
    /// Library error
    Heatmap(HeatmapError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", msg)),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ApiError::new("BAD_REQUEST", msg))
            }
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new("INTERNAL_ERROR", msg),
            ),
            AppError::Heatmap(e) => {
                let details = e.context().to_string();
                let (status, code) = match &e {
                    HeatmapError::InvalidWindow { .. } => (StatusCode::BAD_REQUEST, "INVALID_WINDOW"),
                    HeatmapError::SourceError { .. } => (StatusCode::BAD_REQUEST, "INVALID_SOURCE"),
                    HeatmapError::ConfigurationError { .. } => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "CONFIGURATION_ERROR")
                    }
                    HeatmapError::PreferencesError { .. } => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "PREFERENCES_ERROR")
                    }
                };
                tracing::warn!(error = %e, "Request failed");
                (status, ApiError::new(code, e.to_string()).with_details(details))
            }
        };

        (status, Json(error)).into_response()
    }
}

impl From<HeatmapError> for AppError {
    fn from(err: HeatmapError) -> Self {
        AppError::Heatmap(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

//! Error types for heatmap operations.
//!
//! Every fallible library operation returns [`HeatmapResult`]. Errors carry an
//! [`ErrorContext`] describing where they happened so that log lines and HTTP
//! responses stay useful without a backtrace.

use std::fmt;

/// Result type for heatmap operations
pub type HeatmapResult<T> = Result<T, HeatmapError>;

/// Structured context for heatmap errors.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The operation being performed (e.g., "load_config", "resolve_window")
    pub operation: Option<String>,
    /// The entity involved (e.g., "window", "preferences", "source")
    pub entity: Option<String>,
    /// Additional details about the error
    pub details: Option<String>,
    /// Whether retrying the same operation later may succeed
    pub retryable: bool,
}

impl ErrorContext {
    /// Create a new error context with an operation name.
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: Some(operation.into()),
            ..Default::default()
        }
    }

    /// Set the entity type.
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    /// Set additional details.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Mark this error as retryable.
    pub fn retryable(mut self) -> Self {
        self.retryable = true;
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(ref op) = self.operation {
            parts.push(format!("operation={}", op));
        }
        if let Some(ref entity) = self.entity {
            parts.push(format!("entity={}", entity));
        }
        if let Some(ref details) = self.details {
            parts.push(format!("details={}", details));
        }
        if self.retryable {
            parts.push("retryable=true".to_string());
        }
        write!(f, "[{}]", parts.join(", "))
    }
}

/// Error type for heatmap operations
#[derive(Debug, thiserror::Error)]
pub enum HeatmapError {
    /// Configuration file or environment variable is missing or malformed.
    #[error("Configuration error: {message} {context}")]
    ConfigurationError {
        message: String,
        context: ErrorContext,
    },

    /// A coverage window could not be built (zero length, out-of-range dates).
    #[error("Invalid window: {message} {context}")]
    InvalidWindow {
        message: String,
        context: ErrorContext,
    },

    /// The job source returned something that is not a job map.
    #[error("Source error: {message} {context}")]
    SourceError {
        message: String,
        context: ErrorContext,
    },

    /// Reading or writing the view preferences failed.
    #[error("Preferences error: {message} {context}")]
    PreferencesError {
        message: String,
        context: ErrorContext,
    },
}

impl HeatmapError {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    /// Create a configuration error with context.
    pub fn configuration_with_context(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::ConfigurationError {
            message: message.into(),
            context,
        }
    }

    /// Create an invalid window error.
    pub fn invalid_window(message: impl Into<String>) -> Self {
        Self::InvalidWindow {
            message: message.into(),
            context: ErrorContext::default().with_entity("window"),
        }
    }

    /// Create a source error.
    pub fn source_data(message: impl Into<String>) -> Self {
        Self::SourceError {
            message: message.into(),
            context: ErrorContext::default().with_entity("source"),
        }
    }

    /// Create a preferences error.
    pub fn preferences(message: impl Into<String>) -> Self {
        Self::PreferencesError {
            message: message.into(),
            context: ErrorContext::default().with_entity("preferences"),
        }
    }

    /// Create a preferences error with context.
    pub fn preferences_with_context(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::PreferencesError {
            message: message.into(),
            context,
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        self.context().retryable
    }

    /// Get the error context.
    pub fn context(&self) -> &ErrorContext {
        match self {
            Self::ConfigurationError { context, .. }
            | Self::InvalidWindow { context, .. }
            | Self::SourceError { context, .. }
            | Self::PreferencesError { context, .. } => context,
        }
    }

    /// Add or update the operation in the error context.
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        match &mut self {
            Self::ConfigurationError { context, .. }
            | Self::InvalidWindow { context, .. }
            | Self::SourceError { context, .. }
            | Self::PreferencesError { context, .. } => {
                context.operation = Some(operation.into());
            }
        }
        self
    }
}

impl From<serde_json::Error> for HeatmapError {
    fn from(err: serde_json::Error) -> Self {
        HeatmapError::source_data(format!("Invalid job map JSON: {}", err))
    }
}

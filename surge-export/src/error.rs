//! Export error types

use thiserror::Error;

/// Export result type
pub type ExportResult<T> = Result<T, ExportError>;

/// Errors raised while building or delivering export documents
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Timestamp {value} cannot be represented as a UTC date")]
    InvalidTimestamp { value: f64 },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid sink configuration: {0}")]
    InvalidConfig(String),

    #[error("Template rendering failed for '{template}': {error}")]
    TemplateRender { template: String, error: String },

    #[error("Filesystem error during {operation} on '{path}': {error}")]
    Filesystem {
        path: String,
        operation: String,
        error: String,
    },

    #[error("Failed to write to {stream}: {error}")]
    Stdio { stream: String, error: String },

    #[error("Request to '{url}' failed with status {status}: {response}")]
    Http {
        url: String,
        status: u16,
        response: String,
    },

    #[error("Network error for '{url}': {error}")]
    Network { url: String, error: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ExportError {
    pub fn filesystem(
        path: impl Into<String>,
        operation: impl Into<String>,
        error: impl ToString,
    ) -> Self {
        Self::Filesystem {
            path: path.into(),
            operation: operation.into(),
            error: error.to_string(),
        }
    }
}

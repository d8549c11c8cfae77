//! Context lifecycle error types

use surge_plugin::PluginError;
use thiserror::Error;

/// Context result type
pub type ContextResult<T> = Result<T, ContextError>;

/// Context lifecycle errors
#[derive(Error, Debug)]
pub enum ContextError {
    /// Registry lookup or selector failure
    #[error(transparent)]
    Plugin(#[from] PluginError),

    /// A context failed during setup; `context` is the qualified `name@platform`
    #[error("Context {context}.setup() failed: {source}")]
    SetupFailed {
        context: String,
        #[source]
        source: Box<ContextError>,
    },

    /// Context execution error raised by a plugin implementation
    #[error("Context '{name}' error: {reason}")]
    ExecutionError { name: String, reason: String },

    /// Context configuration is invalid
    #[error("Invalid configuration for context '{name}': {}", errors.join("; "))]
    InvalidConfig { name: String, errors: Vec<String> },

    /// `setup()` called twice on the same manager
    #[error("Contexts are already set up")]
    AlreadySetUp,

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Generic(String),
}

impl ContextError {
    /// Create an execution error
    pub fn execution_error(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ExecutionError {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a generic error
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic(message.into())
    }

    /// Qualified name of the context whose setup failed, if any
    pub fn failed_context(&self) -> Option<&str> {
        match self {
            Self::SetupFailed { context, .. } => Some(context),
            _ => None,
        }
    }
}

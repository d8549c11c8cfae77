//! Plugin system error types

use thiserror::Error;

/// Plugin system result type
pub type PluginResult<T> = Result<T, PluginError>;

/// Plugin system errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PluginError {
    /// No plugin registered under the requested key
    #[error("Plugin '{name}@{platform}' not found")]
    PluginNotFound { name: String, platform: String },

    /// A plugin with the same (name, platform) is already registered
    #[error("Plugin '{name}@{platform}' is already registered")]
    DuplicatePlugin { name: String, platform: String },

    /// A bare name matched plugins on several platforms
    #[error("Plugin '{name}' is ambiguous, found on platforms: {}", platforms.join(", "))]
    MultipleMatches {
        name: String,
        platforms: Vec<String>,
    },

    /// Selector string could not be parsed
    #[error("Invalid plugin selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },
}

impl PluginError {
    /// Create a new not-found error
    pub fn not_found(name: impl Into<String>, platform: impl Into<String>) -> Self {
        Self::PluginNotFound {
            name: name.into(),
            platform: platform.into(),
        }
    }

    /// Create a new invalid selector error
    pub fn invalid_selector(selector: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSelector {
            selector: selector.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error means the plugin does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::PluginNotFound { .. })
    }
}

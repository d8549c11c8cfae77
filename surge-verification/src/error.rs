//! Error types for verification runs

use surge_context::ContextError;
use thiserror::Error;

pub type VerificationResult<T> = Result<T, VerificationError>;

#[derive(Error, Debug)]
pub enum VerificationError {
    /// The runner could not be started
    #[error("Failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The runner exited with a non-zero status
    #[error("Command '{command}' failed with status {status:?}: {output}")]
    CommandFailed {
        command: String,
        status: Option<i32>,
        output: String,
    },

    #[error("Failed to initialize {tool}: {reason}")]
    InitFailed { tool: String, reason: String },

    #[error("Run context has no runner command under '{0}'")]
    MissingCommand(String),

    #[error("Invalid run arguments: {0}")]
    InvalidRunArgs(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl VerificationError {
    pub fn command_failed(command: &[String], status: Option<i32>, output: impl Into<String>) -> Self {
        Self::CommandFailed {
            command: command.join(" "),
            status,
            output: output.into(),
        }
    }
}

impl From<VerificationError> for ContextError {
    fn from(err: VerificationError) -> Self {
        match err {
            VerificationError::Io(io) => ContextError::Io(io),
            VerificationError::InvalidRunArgs(json) => ContextError::Serialization(json),
            other => ContextError::execution_error("testr", other.to_string()),
        }
    }
}

//! Structured logging initialisation for surge
//!
//! Every crate logs through `tracing` with a per-concern target
//! (`plugin_registry`, `context_manager`, `export`, `verification`).
//! This crate installs the global subscriber from a [`LoggingConfig`].
//! Log lines go to stderr so stdout stays free for exported documents.

pub mod init;

pub use init::{build_env_filter, filter_directives, init_logging_from_config, init_simple_tracing};
pub use surge_config::{LogFormat, LogLevel, LoggingConfig};

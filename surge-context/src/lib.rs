//! Context plugins and their lifecycle
//!
//! A context prepares fixtures (users, networks, quotas, test runners)
//! before a workload runs and tears them down afterwards. Contexts are
//! registered in a [`ContextRegistry`] and driven by a [`ContextManager`]
//! which sets them up in ascending order and cleans them up in reverse.

pub mod config;
pub mod error;
pub mod manager;
pub mod plugin;
pub mod run;
pub mod validation;

// Re-export main types
pub use config::ContextConfig;
pub use error::{ContextError, ContextResult};
pub use manager::{CleanupFailure, CleanupReport, ContextManager};
pub use plugin::{validate, with_context, Context, ContextPlugin, ContextRegistry, ContextSettings};
pub use run::{RunContext, TaskRef};

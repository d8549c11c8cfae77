//! Plugin registry for Surge
//!
//! Plugins are registered explicitly at process start and looked up by
//! `(name, platform)`. Context plugins, exporters and other pluggable
//! pieces all share this registry type.

pub mod error;
pub mod registry;
pub mod types;

// Re-export main types
pub use error::{PluginError, PluginResult};
pub use registry::{PluginRegistry, RegisteredPlugin, RegistryStats};
pub use types::{PluginDescriptor, PluginKey, Selector, DEFAULT_ORDER, DEFAULT_PLATFORM};

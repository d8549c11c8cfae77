//! Domain-driven configuration management for surge
//!
//! Configuration is split by functional domain (logging, export,
//! verification), each with defaults and validation, and can be loaded from
//! YAML with `SURGE_*` environment overrides.

pub mod error;
pub mod loader;
pub mod validation;

pub mod domains;

// Re-export main types
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;
pub use validation::Validatable;

pub use domains::{
    export::{ExportConfig, ExportDestination},
    logging::{LogFormat, LogLevel, LoggingConfig},
    verification::VerificationConfig,
    SurgeConfig,
};

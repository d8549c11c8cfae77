use anyhow::Result;
use surge_config::{LogFormat, LoggingConfig};
use tracing_subscriber::EnvFilter;

/// Filter directives of a configuration: the level, then any extra directives
pub fn filter_directives(config: &LoggingConfig) -> String {
    match config.filter.as_deref().map(str::trim) {
        Some(extra) if !extra.is_empty() => format!("{},{}", config.level, extra),
        _ => config.level.to_string(),
    }
}

/// Environment filter for `directives`, falling back to `RUST_LOG` and then `info`
pub fn build_env_filter(directives: &str) -> EnvFilter {
    EnvFilter::try_new(directives)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize logging from configuration
///
/// Uses `try_init`, so a second call keeps the first subscriber.
pub fn init_logging_from_config(config: &LoggingConfig) -> Result<()> {
    let env_filter = build_env_filter(&filter_directives(config));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_file(config.include_location)
        .with_line_number(config.include_location);

    let result = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    };

    if result.is_err() {
        tracing::debug!("Global tracing subscriber already initialized, skipping");
    }
    Ok(())
}

/// Initialize simple tracing for basic console output
pub fn init_simple_tracing(log_level: &str) -> Result<()> {
    let env_filter = build_env_filter(log_level);

    // Use try_init to avoid panic if global subscriber already set
    if tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init()
        .is_err()
    {
        tracing::debug!("Global tracing subscriber already initialized, skipping");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use surge_config::LogLevel;

    #[test]
    fn test_filter_directives() {
        let mut config = LoggingConfig::default();
        assert_eq!(filter_directives(&config), "info");

        config.level = LogLevel::Warn;
        config.filter = Some("export=debug,verification=trace".to_string());
        assert_eq!(filter_directives(&config), "warn,export=debug,verification=trace");

        config.filter = Some("  ".to_string());
        assert_eq!(filter_directives(&config), "warn");
    }

    #[test]
    fn test_build_env_filter_accepts_targets() {
        let filter = build_env_filter("info,plugin_registry=debug");
        assert!(filter.to_string().contains("plugin_registry=debug"));
    }
}

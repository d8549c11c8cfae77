use surge_logging::{init_logging_from_config, init_simple_tracing, LogFormat, LogLevel, LoggingConfig};

#[test]
fn test_logging_config_from_yaml() {
    let yaml_config = r#"
level: debug
format: json
filter: "export=trace"
include_location: true
"#;

    let config: LoggingConfig = serde_yaml::from_str(yaml_config).unwrap();
    assert_eq!(config.level, LogLevel::Debug);
    assert_eq!(config.format, LogFormat::Json);
    assert!(config.include_location);

    init_logging_from_config(&config).unwrap();
    tracing::info!(target: "export", "logging initialised");
}

#[test]
fn test_repeated_initialisation_is_harmless() {
    init_simple_tracing("debug").unwrap();
    init_simple_tracing("info").unwrap();
    init_logging_from_config(&LoggingConfig::default()).unwrap();
}

//! Context configuration validation

use serde_json::Value;

use crate::plugin::ContextPlugin;

/// Validate a raw configuration value against a plugin
///
/// Schema violations come first, followed by the plugin's own checks.
pub fn validate_plugin_config(plugin: &dyn ContextPlugin, config: &Value) -> Vec<String> {
    let mut errors = match plugin.config_schema() {
        Some(schema) => validate_against_schema(&schema, config),
        None => Vec::new(),
    };
    errors.extend(plugin.validate_config(config));
    errors
}

/// Validate `config` against a JSON schema
pub fn validate_against_schema(schema: &Value, config: &Value) -> Vec<String> {
    match jsonschema::validator_for(schema) {
        Ok(validator) => validator
            .iter_errors(config)
            .map(|error| error.to_string())
            .collect(),
        Err(e) => vec![format!("Invalid configuration schema: {}", e)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schema_errors_are_collected() {
        let schema = json!({
            "type": "object",
            "properties": {
                "users_per_tenant": {"type": "integer", "minimum": 1},
                "tenants": {"type": "integer", "minimum": 1}
            },
            "additionalProperties": false
        });

        assert!(validate_against_schema(&schema, &json!({"tenants": 2})).is_empty());

        let errors = validate_against_schema(&schema, &json!({"tenants": 0, "users_per_tenant": "x"}));
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_invalid_schema_reported() {
        let errors = validate_against_schema(&json!({"type": 12}), &json!({}));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Invalid configuration schema"));
    }
}

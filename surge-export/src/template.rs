//! Template engine for sink paths

use handlebars::Handlebars;
use serde_json::Value;
use std::collections::HashMap;

use crate::error::{ExportError, ExportResult};

/// Handlebars based variable substitution
#[derive(Debug, Clone)]
pub struct TemplateEngine {
    handlebars: Handlebars<'static>,
}

impl TemplateEngine {
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true); // Error on missing variables
        // Paths are not HTML
        handlebars.register_escape_fn(handlebars::no_escape);

        Self { handlebars }
    }

    /// Render a template with string variables
    pub fn render(&self, template: &str, variables: &HashMap<String, String>) -> ExportResult<String> {
        let json_vars: Value = variables
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect::<serde_json::Map<_, _>>()
            .into();

        self.render_json(template, &json_vars)
    }

    /// Render a template with JSON variables
    pub fn render_json(&self, template: &str, variables: &Value) -> ExportResult<String> {
        self.handlebars
            .render_template(template, variables)
            .map_err(|e| ExportError::TemplateRender {
                template: template.to_string(),
                error: e.to_string(),
            })
    }

    /// Check template syntax
    pub fn validate(&self, template: &str) -> ExportResult<()> {
        handlebars::Template::compile(template)
            .map(|_| ())
            .map_err(|e| ExportError::TemplateRender {
                template: template.to_string(),
                error: e.to_string(),
            })
    }

    pub fn has_variables(&self, template: &str) -> bool {
        template.contains("{{") && template.contains("}}")
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

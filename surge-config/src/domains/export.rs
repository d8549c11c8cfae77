//! Export configuration

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ConfigResult;
use crate::validation::{validate_http_url, validate_positive, validate_required_string, Validatable};

/// Where documents go and how they are batched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub destination: ExportDestination,

    /// Maximum documents per batch; `0` sends each task as one batch
    pub batch_size: usize,

    pub include_actions: bool,

    pub include_metrics: bool,

    /// Levels of nested atomic actions that are exported
    pub max_action_depth: usize,
}

/// Export destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ExportDestination {
    Stdout,
    File {
        /// Handlebars template of the output path
        path: String,
        /// Append to an existing file; otherwise every batch replaces it
        #[serde(default = "default_true")]
        append: bool,
        #[serde(default = "default_true")]
        create_dirs: bool,
    },
    Http {
        url: String,
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        headers: BTreeMap<String, String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        bearer_token: Option<String>,
    },
}

fn default_true() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            destination: ExportDestination::Stdout,
            batch_size: 0,
            include_actions: true,
            include_metrics: true,
            max_action_depth: 3,
        }
    }
}

impl ExportDestination {
    /// Parse the shorthand used on the command line and in `SURGE_EXPORT_DESTINATION`
    ///
    /// `-` is stdout, an http(s) URL is an http endpoint and anything else is
    /// a file path.
    pub fn parse_shorthand(value: &str) -> Self {
        let value = value.trim();
        if value == "-" {
            ExportDestination::Stdout
        } else if value.starts_with("http://") || value.starts_with("https://") {
            ExportDestination::Http {
                url: value.to_string(),
                timeout_secs: default_timeout_secs(),
                headers: BTreeMap::new(),
                bearer_token: None,
            }
        } else {
            ExportDestination::File {
                path: value.to_string(),
                append: true,
                create_dirs: true,
            }
        }
    }
}

impl Validatable for ExportConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.max_action_depth, "max_action_depth", self.domain_name())?;

        match &self.destination {
            ExportDestination::Stdout => Ok(()),
            ExportDestination::File { path, .. } => {
                validate_required_string(path, "destination.path", self.domain_name())
            }
            ExportDestination::Http { url, timeout_secs, .. } => {
                validate_http_url(url, "destination.url", self.domain_name())?;
                validate_positive(*timeout_secs, "destination.timeout_secs", self.domain_name())
            }
        }
    }

    fn domain_name(&self) -> &'static str {
        "export"
    }
}

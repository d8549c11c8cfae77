//! Verification runner configuration

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::ConfigResult;
use crate::validation::Validatable;

/// Where the test repository lives and how the runner is started
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationConfig {
    /// Checkout holding the tests; `.testr.conf` selects `testr`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo_dir: Option<PathBuf>,

    /// Directory of the `.testrepository`; defaults to `repo_dir`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_dir: Option<PathBuf>,

    /// Default worker count; `0` lets the runner decide
    pub concurrency: u32,

    /// Extra environment of the runner process
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

impl VerificationConfig {
    pub fn base_dir(&self) -> Option<&PathBuf> {
        self.base_dir.as_ref().or(self.repo_dir.as_ref())
    }
}

impl Validatable for VerificationConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.base_dir.is_some() && self.repo_dir.is_none() {
            return Err(self.validation_error("base_dir requires repo_dir"));
        }
        if let Some(key) = self.env.keys().find(|key| key.is_empty() || key.contains('=')) {
            return Err(self.validation_error(format!("invalid environment variable name '{}'", key)));
        }
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "verification"
    }
}

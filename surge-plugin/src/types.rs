//! Plugin type definitions and utilities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PluginError;

/// Platform used when a selector or descriptor names none
pub const DEFAULT_PLATFORM: &str = "default";

/// Execution order given to plugins that do not declare one
pub const DEFAULT_ORDER: i32 = 0;

/// Registry key: a plugin name scoped to a platform
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PluginKey {
    pub name: String,
    pub platform: String,
}

impl PluginKey {
    /// Create a new key
    pub fn new(name: impl Into<String>, platform: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            platform: platform.into(),
        }
    }

    /// Create a key on the default platform
    pub fn on_default_platform(name: impl Into<String>) -> Self {
        Self::new(name, DEFAULT_PLATFORM)
    }

    pub fn is_default_platform(&self) -> bool {
        self.platform == DEFAULT_PLATFORM
    }
}

impl fmt::Display for PluginKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.platform)
    }
}

/// Parsed `name` or `name@platform` selector
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selector {
    pub name: String,
    /// Platform given explicitly after `@`
    pub platform: Option<String>,
}

impl Selector {
    pub fn parse(selector: &str) -> Result<Self, PluginError> {
        selector.parse()
    }

    /// Key this selector addresses, with the default platform filled in
    pub fn key(&self) -> PluginKey {
        PluginKey::new(
            self.name.clone(),
            self.platform.as_deref().unwrap_or(DEFAULT_PLATFORM),
        )
    }

    pub fn has_explicit_platform(&self) -> bool {
        self.platform.is_some()
    }
}

impl FromStr for Selector {
    type Err = PluginError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, platform) = match s.split_once('@') {
            Some((name, platform)) => (name, Some(platform)),
            None => (s, None),
        };

        if name.is_empty() {
            return Err(PluginError::invalid_selector(s, "plugin name is empty"));
        }

        match platform {
            Some("") => Err(PluginError::invalid_selector(s, "platform is empty")),
            Some(p) if p.contains('@') => Err(PluginError::invalid_selector(
                s,
                "selector contains more than one '@'",
            )),
            _ => Ok(Self {
                name: name.to_string(),
                platform: platform.map(str::to_string),
            }),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.platform {
            Some(platform) => write!(f, "{}@{}", self.name, platform),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Registration-time metadata of a plugin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginDescriptor {
    /// Plugin name
    pub name: String,
    /// Platform the plugin belongs to
    #[serde(default = "default_platform")]
    pub platform: String,
    /// Execution order, lower runs first
    #[serde(default)]
    pub order: i32,
    /// Hidden plugins are skipped by default discovery
    #[serde(default)]
    pub hidden: bool,
    /// Human readable description
    #[serde(default)]
    pub description: Option<String>,
}

fn default_platform() -> String {
    DEFAULT_PLATFORM.to_string()
}

impl PluginDescriptor {
    /// Create a descriptor on the default platform with the default order
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            platform: default_platform(),
            order: DEFAULT_ORDER,
            hidden: false,
            description: None,
        }
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    /// Mark the plugin as hidden
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn key(&self) -> PluginKey {
        PluginKey::new(self.name.clone(), self.platform.clone())
    }
}

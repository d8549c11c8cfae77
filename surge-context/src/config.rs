//! Per-context configuration values and merge rules

use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::error::ContextResult;

/// Configuration a context plugin receives for its own selector
#[derive(Debug, Clone, PartialEq)]
pub enum ContextConfig {
    /// Explicit `null` in the run configuration
    Null,
    /// Mapping, merged over the plugin defaults
    Mapping(Map<String, Value>),
    /// Sequence, frozen into an immutable shared slice
    Sequence(Arc<[Value]>),
    /// Any other scalar, passed through verbatim
    Scalar(Value),
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self::Mapping(Map::new())
    }
}

impl ContextConfig {
    /// Build the effective configuration from the raw value at a selector
    ///
    /// `raw` is `None` when the selector is absent from the run configuration;
    /// in that case the defaults (when they are a mapping) are used as is.
    pub fn from_raw(raw: Option<&Value>, defaults: &Value) -> Self {
        let defaults = defaults.as_object();

        match raw {
            None => Self::Mapping(defaults.cloned().unwrap_or_default()),
            Some(Value::Null) => Self::Null,
            Some(Value::Object(overrides)) => {
                let mut merged = defaults.cloned().unwrap_or_default();
                merge_mapping(&mut merged, overrides);
                Self::Mapping(merged)
            }
            Some(Value::Array(items)) => Self::Sequence(Arc::from(items.as_slice())),
            Some(other) => Self::Scalar(other.clone()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_mapping(&self) -> Option<&Map<String, Value>> {
        match self {
            Self::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Self::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Look up a key of a mapping configuration
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_mapping().and_then(|map| map.get(key))
    }

    /// Convert back into a plain JSON value
    pub fn to_value(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Mapping(map) => Value::Object(map.clone()),
            Self::Sequence(items) => Value::Array(items.to_vec()),
            Self::Scalar(value) => value.clone(),
        }
    }

    /// Deserialize the configuration into a typed structure
    pub fn deserialize_into<T: DeserializeOwned>(&self) -> ContextResult<T> {
        Ok(serde_json::from_value(self.to_value())?)
    }
}

impl Serialize for ContextConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

/// Merge `overrides` into `base`; override keys win, nested mappings merge
pub fn merge_mapping(base: &mut Map<String, Value>, overrides: &Map<String, Value>) {
    for (key, value) in overrides {
        match (base.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(nested)) => {
                merge_mapping(existing, nested);
            }
            _ => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}

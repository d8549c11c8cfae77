//! Atomic action trees and the flat records derived from them

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;

use crate::error::{ExportError, ExportResult};

/// Timestamp layout of every exported date field
pub const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// One named, timed sub-operation of an iteration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomicAction {
    pub name: String,
    /// Unix epoch seconds
    pub started_at: f64,
    /// Unix epoch seconds
    pub finished_at: f64,
    #[serde(default)]
    pub failed: bool,
    #[serde(default)]
    pub children: Vec<AtomicAction>,
}

impl AtomicAction {
    pub fn new(name: impl Into<String>, started_at: f64, finished_at: f64) -> Self {
        Self {
            name: name.into(),
            started_at,
            finished_at,
            failed: false,
            children: Vec::new(),
        }
    }

    pub fn failed(mut self) -> Self {
        self.failed = true;
        self
    }

    pub fn with_child(mut self, child: AtomicAction) -> Self {
        self.children.push(child);
        self
    }

    pub fn duration(&self) -> f64 {
        self.finished_at - self.started_at
    }

    /// Number of nodes in this subtree, the node itself included
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(AtomicAction::node_count).sum::<usize>()
    }
}

/// One execution of a scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Iteration {
    /// Assigned by the exporter when absent in the input
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub atomic_actions: Vec<AtomicAction>,
    #[serde(default)]
    pub error: Option<Value>,
    pub timestamp: f64,
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub idle_duration: f64,
}

impl Iteration {
    /// Whether the iteration carries a non-empty error payload
    pub fn has_error(&self) -> bool {
        match &self.error {
            None | Some(Value::Null) | Some(Value::Bool(false)) => false,
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Array(items)) => !items.is_empty(),
            Some(Value::Object(map)) => !map.is_empty(),
            Some(Value::Number(_)) | Some(Value::Bool(true)) => true,
        }
    }

    /// Moment the iteration ended, idle time included
    pub fn end_timestamp(&self) -> f64 {
        self.timestamp + self.duration + self.idle_duration
    }
}

/// Deterministic identifier of a flattened action
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActionId {
    pub iteration_id: String,
    pub action_name: String,
    /// Index among same-named siblings under one parent
    pub occurrence: usize,
    /// Rendered id of the parent action
    pub parent: Option<String>,
}

impl ActionId {
    /// Document id, unique within a run
    ///
    /// `/` separates parent and child, so it is percent-encoded in names.
    pub fn document_id(&self) -> String {
        let name = escape_segment(&self.action_name);
        match &self.parent {
            None => format!("{}_action_{}_{}", self.iteration_id, name, self.occurrence),
            Some(parent) => format!("{}/{}_{}", parent, name, self.occurrence),
        }
    }
}

fn escape_segment(name: &str) -> Cow<'_, str> {
    if !name.contains(['/', '%']) {
        return Cow::Borrowed(name);
    }
    Cow::Owned(name.replace('%', "%25").replace('/', "%2F"))
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.document_id())
    }
}

/// Flat, denormalized document for one atomic action
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionRecord {
    #[serde(skip)]
    pub id: ActionId,
    /// Position of the parent record in the same flattening output
    #[serde(skip)]
    pub parent_index: Option<usize>,

    pub deployment_uuid: String,
    pub deployment_name: String,
    pub action_name: String,
    pub workload_uuid: String,
    pub scenario_cfg: Vec<String>,
    pub contexts: Vec<String>,
    pub runner_name: String,
    pub runner_cfg: Vec<String>,
    pub success: bool,
    pub duration: f64,
    pub started_at: String,
    pub finished_at: String,
    /// Document id of the parent action
    pub parent: Option<String>,
    pub error: Option<Value>,
}

impl ActionRecord {
    pub fn document_id(&self) -> String {
        self.id.document_id()
    }
}

/// Format epoch seconds as a zone-less UTC timestamp with whole seconds
pub fn format_timestamp(epoch_seconds: f64) -> ExportResult<String> {
    if !epoch_seconds.is_finite() {
        return Err(ExportError::InvalidTimestamp {
            value: epoch_seconds,
        });
    }

    let seconds = epoch_seconds.floor();
    let nanos = ((epoch_seconds - seconds) * 1e9) as u32;
    chrono::DateTime::from_timestamp(seconds as i64, nanos.min(999_999_999))
        .map(|dt| dt.format(TIME_FORMAT).to_string())
        .ok_or(ExportError::InvalidTimestamp {
            value: epoch_seconds,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0.0).unwrap(), "1970-01-01T00:00:00");
        assert_eq!(format_timestamp(105.0).unwrap(), "1970-01-01T00:01:45");
        assert_eq!(format_timestamp(1_500_000_000.75).unwrap(), "2017-07-14T02:40:00");
        assert!(format_timestamp(f64::NAN).is_err());
        assert!(format_timestamp(f64::INFINITY).is_err());
    }

    #[test]
    fn test_document_ids() {
        let top = ActionId {
            iteration_id: "w1_iter_1".into(),
            action_name: "boot".into(),
            occurrence: 0,
            parent: None,
        };
        assert_eq!(top.document_id(), "w1_iter_1_action_boot_0");

        let nested = ActionId {
            iteration_id: "w1_iter_1".into(),
            action_name: "wait".into(),
            occurrence: 1,
            parent: Some(top.document_id()),
        };
        assert_eq!(nested.to_string(), "w1_iter_1_action_boot_0/wait_1");
    }

    #[test]
    fn test_document_ids_escape_separator() {
        let top = ActionId {
            iteration_id: "it".into(),
            action_name: "p_0/c".into(),
            occurrence: 0,
            parent: None,
        };
        assert_eq!(top.document_id(), "it_action_p_0%2Fc_0");

        let literal = ActionId {
            action_name: "p_0%2Fc".into(),
            ..top.clone()
        };
        assert_eq!(literal.document_id(), "it_action_p_0%252Fc_0");
        assert_ne!(literal.document_id(), top.document_id());
    }

    #[test]
    fn test_iteration_error_truthiness() {
        let mut iteration: Iteration = serde_json::from_value(json!({"timestamp": 1.0})).unwrap();
        assert!(!iteration.has_error());

        iteration.error = Some(json!([]));
        assert!(!iteration.has_error());

        iteration.error = Some(json!(["TimeoutException", "took too long", "trace"]));
        assert!(iteration.has_error());
    }

    #[test]
    fn test_node_count() {
        let tree = AtomicAction::new("a", 0.0, 3.0)
            .with_child(AtomicAction::new("b", 0.0, 1.0).with_child(AtomicAction::new("c", 0.0, 0.5)))
            .with_child(AtomicAction::new("d", 1.0, 2.0));
        assert_eq!(tree.node_count(), 4);
        assert_eq!(tree.duration(), 3.0);
    }
}

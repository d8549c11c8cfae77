//! Run-wide state shared by every context of a run

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reference to the task a run belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRef {
    pub uuid: String,
    #[serde(default)]
    pub title: String,
}

impl TaskRef {
    pub fn new(uuid: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            title: String::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

/// Mutable state threaded through setup and cleanup
///
/// `config` maps selectors to raw configuration values in declaration order.
/// Contexts publish anything later stages need (users, networks, commands)
/// into `data`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunContext {
    pub task: Option<TaskRef>,
    #[serde(default)]
    pub config: Map<String, Value>,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl RunContext {
    pub fn new(task: TaskRef, config: Map<String, Value>) -> Self {
        Self {
            task: Some(task),
            config,
            owner_id: None,
            data: Map::new(),
        }
    }

    pub fn with_owner_id(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = Some(owner_id.into());
        self
    }

    /// Explicit owner id, falling back to the task uuid
    pub fn owner_id(&self) -> Option<&str> {
        self.owner_id
            .as_deref()
            .or_else(|| self.task.as_ref().map(|task| task.uuid.as_str()))
    }

    /// Raw configuration value at a selector
    pub fn raw_config(&self, selector: &str) -> Option<&Value> {
        self.config.get(selector)
    }

    /// Selectors in declaration order
    pub fn selectors(&self) -> impl Iterator<Item = &str> {
        self.config.keys().map(String::as_str)
    }

    pub fn publish(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.data.insert(key.into(), value)
    }

    pub fn take(&mut self, key: &str) -> Option<Value> {
        self.data.remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_owner_id_prefers_explicit_value() {
        let run = RunContext::new(TaskRef::new("task-uuid"), Map::new()).with_owner_id("owner");
        assert_eq!(run.owner_id(), Some("owner"));
    }

    #[test]
    fn test_owner_id_falls_back_to_task() {
        let run = RunContext::new(TaskRef::new("task-uuid"), Map::new());
        assert_eq!(run.owner_id(), Some("task-uuid"));
        assert_eq!(RunContext::default().owner_id(), None);
    }

    #[test]
    fn test_selectors_keep_declaration_order() {
        let config = json!({"zeta": {}, "alpha@foo": {}, "mid": null});
        let run = RunContext::new(TaskRef::new("t"), config.as_object().cloned().unwrap());
        let selectors: Vec<&str> = run.selectors().collect();
        assert_eq!(selectors, vec!["zeta", "alpha@foo", "mid"]);
    }
}

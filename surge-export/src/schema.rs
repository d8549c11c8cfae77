//! Typed field sets of the export indices

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

pub const TASK_INDEX: &str = "surge_task_data_v1";
pub const WORKLOAD_INDEX: &str = "surge_workload_data_v1";
pub const ACTION_INDEX: &str = "surge_atomic_action_data_v1";
pub const METRIC_INDEX: &str = "surge_workload_metric_v1";

/// Field type as understood by document stores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Keyword,
    Text,
    Boolean,
    Float,
    Date,
    Long,
}

/// Name and field set of one index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSchema {
    pub name: &'static str,
    pub fields: &'static [(&'static str, FieldType)],
}

use FieldType::*;

pub const TASK_SCHEMA: IndexSchema = IndexSchema {
    name: TASK_INDEX,
    fields: &[
        ("task_uuid", Keyword),
        ("deployment_uuid", Keyword),
        ("deployment_name", Keyword),
        ("title", Text),
        ("description", Text),
        ("status", Keyword),
        ("pass_sla", Boolean),
        ("tags", Keyword),
    ],
};

pub const WORKLOAD_SCHEMA: IndexSchema = IndexSchema {
    name: WORKLOAD_INDEX,
    fields: &[
        ("deployment_uuid", Keyword),
        ("deployment_name", Keyword),
        ("scenario_name", Keyword),
        ("scenario_cfg", Keyword),
        ("description", Text),
        ("runner_name", Keyword),
        ("runner_cfg", Keyword),
        ("contexts", Keyword),
        ("task_uuid", Keyword),
        ("subtask_uuid", Keyword),
        ("started_at", Date),
        ("load_duration", Long),
        ("full_duration", Long),
        ("pass_sla", Boolean),
        ("success_rate", Float),
        ("sla_details", Text),
    ],
};

pub const ACTION_SCHEMA: IndexSchema = IndexSchema {
    name: ACTION_INDEX,
    fields: &[
        ("deployment_uuid", Keyword),
        ("deployment_name", Keyword),
        ("action_name", Keyword),
        ("workload_uuid", Keyword),
        ("scenario_cfg", Keyword),
        ("contexts", Keyword),
        ("runner_name", Keyword),
        ("runner_cfg", Keyword),
        ("success", Boolean),
        ("duration", Float),
        ("started_at", Date),
        ("finished_at", Date),
        ("parent", Keyword),
        ("error", Keyword),
    ],
};

pub const METRIC_SCHEMA: IndexSchema = IndexSchema {
    name: METRIC_INDEX,
    fields: &[
        ("name", Keyword),
        ("value", Float),
        ("dimensions", Keyword),
        ("value_meta", Keyword),
    ],
};

impl IndexSchema {
    /// All known schemas
    pub fn all() -> [&'static IndexSchema; 4] {
        [&TASK_SCHEMA, &WORKLOAD_SCHEMA, &ACTION_SCHEMA, &METRIC_SCHEMA]
    }

    pub fn by_name(name: &str) -> Option<&'static IndexSchema> {
        Self::all().into_iter().find(|schema| schema.name == name)
    }

    pub fn field_type(&self, field: &str) -> Option<FieldType> {
        self.fields
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, field_type)| *field_type)
    }

    /// Mapping body in the `{"properties": {field: {"type": ...}}}` shape
    pub fn mapping(&self) -> Value {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|(name, field_type)| (name.to_string(), json!({ "type": field_type })))
            .collect();
        json!({ "properties": properties })
    }

    /// Schema fields absent from a document body
    pub fn missing_fields(&self, body: &Value) -> Vec<&'static str> {
        self.fields
            .iter()
            .map(|(name, _)| *name)
            .filter(|name| body.get(name).is_none())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_shape() {
        let mapping = TASK_SCHEMA.mapping();
        assert_eq!(mapping["properties"]["pass_sla"], json!({"type": "boolean"}));
        assert_eq!(mapping["properties"].as_object().unwrap().len(), 8);
    }

    #[test]
    fn test_lookup() {
        assert_eq!(IndexSchema::by_name(ACTION_INDEX), Some(&ACTION_SCHEMA));
        assert_eq!(ACTION_SCHEMA.field_type("started_at"), Some(FieldType::Date));
        assert_eq!(WORKLOAD_SCHEMA.field_type("load_duration"), Some(FieldType::Long));
        assert!(IndexSchema::by_name("unknown").is_none());
    }

    #[test]
    fn test_missing_fields() {
        let body = json!({"name": "surge_boot_load_duration", "value": 1.0});
        assert_eq!(METRIC_SCHEMA.missing_fields(&body), vec!["dimensions", "value_meta"]);
    }
}

//! Task results input model and the reports derived from it

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::error::{ExportError, ExportResult};
use crate::record::{format_timestamp, Iteration};

/// Prefix of generated metric names
pub const METRIC_PREFIX: &str = "surge";

/// Result of one task run, as stored by the benchmark engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    pub uuid: String,
    #[serde(default)]
    pub env_uuid: String,
    #[serde(default)]
    pub env_name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub pass_sla: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub subtasks: Vec<SubtaskResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtaskResult {
    pub uuid: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub workloads: Vec<WorkloadResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadResult {
    pub uuid: String,
    #[serde(default)]
    pub task_uuid: String,
    #[serde(default)]
    pub subtask_uuid: String,
    /// Scenario name
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Scenario arguments
    #[serde(default)]
    pub args: Value,
    #[serde(default)]
    pub runner_type: String,
    #[serde(default)]
    pub runner: Value,
    #[serde(default)]
    pub contexts: Value,
    /// Epoch seconds when the load started
    #[serde(default)]
    pub start_time: Option<f64>,
    #[serde(default)]
    pub load_duration: f64,
    #[serde(default)]
    pub full_duration: f64,
    #[serde(default)]
    pub pass_sla: bool,
    #[serde(default)]
    pub statistics: Value,
    #[serde(default)]
    pub sla_results: SlaResults,
    /// Iterations
    #[serde(default)]
    pub data: Vec<Iteration>,
}

impl WorkloadResult {
    /// Raw success rate from the total durations statistics
    pub fn raw_success_rate(&self) -> Option<&Value> {
        self.statistics.pointer("/durations/total/data/success")
    }

    /// Iterations with their ids assigned, `<workload_uuid>_iter_<n>` from 1
    pub fn iterations(&self) -> impl Iterator<Item = Iteration> + '_ {
        self.data.iter().enumerate().map(|(idx, itr)| {
            let mut itr = itr.clone();
            itr.id = format!("{}_iter_{}", self.uuid, idx + 1);
            itr
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlaResults {
    #[serde(default)]
    pub sla: Vec<SlaCheck>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlaCheck {
    #[serde(default)]
    pub criterion: String,
    pub success: bool,
    #[serde(default)]
    pub detail: String,
}

/// Task index document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskReport {
    pub task_uuid: String,
    pub deployment_uuid: String,
    pub deployment_name: String,
    pub title: String,
    pub description: String,
    pub status: String,
    pub pass_sla: bool,
    pub tags: Vec<String>,
}

impl TaskReport {
    pub fn from_task(task: &TaskResult) -> Self {
        Self {
            task_uuid: task.uuid.clone(),
            deployment_uuid: task.env_uuid.clone(),
            deployment_name: task.env_name.clone(),
            title: task.title.clone(),
            description: task.description.clone(),
            status: task.status.clone(),
            pass_sla: task.pass_sla,
            tags: task.tags.clone(),
        }
    }
}

/// Workload index document; also the metadata denormalized into action records
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WorkloadReport {
    pub task_uuid: String,
    pub subtask_uuid: String,
    pub deployment_uuid: String,
    pub deployment_name: String,
    pub scenario_name: String,
    pub scenario_cfg: Vec<String>,
    pub description: String,
    pub runner_name: String,
    pub runner_cfg: Vec<String>,
    pub contexts: Vec<String>,
    pub started_at: Option<String>,
    pub load_duration: f64,
    pub full_duration: f64,
    pub pass_sla: bool,
    pub success_rate: f64,
    pub sla_details: Vec<String>,
}

impl WorkloadReport {
    pub fn from_workload(task: &TaskResult, workload: &WorkloadResult) -> ExportResult<Self> {
        let success_rate = match workload.raw_success_rate() {
            Some(raw) => parse_success_rate(raw)?,
            None => 0.0,
        };

        let started_at = workload.start_time.map(format_timestamp).transpose()?;

        Ok(Self {
            task_uuid: workload.task_uuid.clone(),
            subtask_uuid: workload.subtask_uuid.clone(),
            deployment_uuid: task.env_uuid.clone(),
            deployment_name: task.env_name.clone(),
            scenario_name: workload.name.clone(),
            scenario_cfg: flatten_config(&workload.args),
            description: workload.description.clone(),
            runner_name: workload.runner_type.clone(),
            runner_cfg: flatten_config(&workload.runner),
            contexts: flatten_config(&workload.contexts),
            started_at,
            load_duration: workload.load_duration,
            full_duration: workload.full_duration,
            pass_sla: workload.pass_sla,
            success_rate,
            sla_details: workload
                .sla_results
                .sla
                .iter()
                .filter(|check| !check.success)
                .map(|check| check.detail.clone())
                .collect(),
        })
    }
}

/// Metric document for one workload measurement
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricDocument {
    pub name: String,
    pub value: f64,
    pub dimensions: BTreeMap<String, String>,
    pub value_meta: Map<String, Value>,
}

/// `load_duration` and `success_rate` metrics of a workload
pub fn workload_metrics(subtask_title: &str, report: &WorkloadReport) -> Vec<MetricDocument> {
    let dimensions: BTreeMap<String, String> = [
        ("task_uuid", &report.task_uuid),
        ("subtask_uuid", &report.subtask_uuid),
        ("deployment_uuid", &report.deployment_uuid),
        ("deployment_name", &report.deployment_name),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_string(), value.clone()))
    .collect();

    let mut value_meta = Map::new();
    value_meta.insert(
        "scenario_cfg".to_string(),
        Value::from(report.scenario_cfg.clone()),
    );

    [
        ("load_duration", report.load_duration),
        ("success_rate", report.success_rate),
    ]
    .into_iter()
    .map(|(metric, value)| MetricDocument {
        name: format!("{}_{}_{}", METRIC_PREFIX, subtask_title, metric),
        value,
        dimensions: dimensions.clone(),
        value_meta: value_meta.clone(),
    })
    .collect()
}

/// Parse a success rate such as `"95.5%"` into a fraction; `"n/a"` is zero
pub fn parse_success_rate(raw: &Value) -> ExportResult<f64> {
    match raw {
        Value::Null => Ok(0.0),
        Value::String(s) if s == "n/a" => Ok(0.0),
        Value::String(s) => s
            .strip_suffix('%')
            .and_then(|number| number.trim().parse::<f64>().ok())
            .map(|percent| percent / 100.0)
            .ok_or_else(|| ExportError::InvalidInput(format!("invalid success rate '{}'", s))),
        other => Err(ExportError::InvalidInput(format!(
            "invalid success rate {}",
            other
        ))),
    }
}

/// Flatten a nested configuration into sorted `key.path=value` strings
///
/// Sequence items are addressed as `key[i]`; scalars at the top level are
/// kept as their bare value. A missing (`null`) configuration flattens to
/// nothing.
pub fn flatten_config(value: &Value) -> Vec<String> {
    let mut out = Vec::new();
    if value.is_null() {
        return out;
    }
    collect_leaves(value, String::new(), &mut out);
    out.sort();
    out
}

fn collect_leaves(value: &Value, path: String, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                let nested_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", path, key)
                };
                collect_leaves(nested, nested_path, out);
            }
        }
        Value::Array(items) => {
            for (idx, nested) in items.iter().enumerate() {
                collect_leaves(nested, format!("{}[{}]", path, idx), out);
            }
        }
        Value::String(s) => push_leaf(&path, s, out),
        other => push_leaf(&path, &other.to_string(), out),
    }
}

fn push_leaf(path: &str, value: &str, out: &mut Vec<String>) {
    if path.is_empty() {
        out.push(value.to_string());
    } else {
        out.push(format!("{}={}", path, value));
    }
}

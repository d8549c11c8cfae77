//! Task exporter: builds every document of a task and hands it to a sink

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ExportResult;
use crate::flatten::{ActionFlattener, MAX_ACTION_DEPTH};
use crate::report::{workload_metrics, TaskReport, TaskResult, WorkloadReport};
use crate::schema::{ACTION_INDEX, METRIC_INDEX, TASK_INDEX, WORKLOAD_INDEX};
use crate::sink::{BatchReport, ExportDocument, ExportSink};

/// Which documents to build and how to batch them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExporterOptions {
    /// Maximum documents per batch; `0` sends each task as one batch
    #[serde(default)]
    pub batch_size: usize,
    #[serde(default = "default_true")]
    pub include_actions: bool,
    #[serde(default = "default_true")]
    pub include_metrics: bool,
    /// Levels of nested atomic actions that are exported
    #[serde(default = "default_max_action_depth")]
    pub max_action_depth: usize,
}

fn default_true() -> bool {
    true
}

fn default_max_action_depth() -> usize {
    MAX_ACTION_DEPTH
}

impl Default for ExporterOptions {
    fn default() -> Self {
        Self {
            batch_size: 0,
            include_actions: true,
            include_metrics: true,
            max_action_depth: MAX_ACTION_DEPTH,
        }
    }
}

/// Totals of one export run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportSummary {
    pub tasks: usize,
    pub documents: usize,
    pub batches: Vec<BatchReport>,
}

impl ExportSummary {
    pub fn accepted(&self) -> usize {
        self.batches.iter().map(|batch| batch.accepted).sum()
    }

    pub fn failed(&self) -> usize {
        self.batches.iter().map(|batch| batch.failures.len()).sum()
    }
}

/// Walks tasks, subtasks, workloads and iterations into export documents
#[derive(Debug, Clone, Default)]
pub struct TaskExporter {
    options: ExporterOptions,
}

impl TaskExporter {
    pub fn new(options: ExporterOptions) -> Self {
        Self { options }
    }

    /// All documents of one task in a stable order
    ///
    /// The task document comes first, then per workload its workload
    /// document, its metrics and the actions of every iteration.
    pub fn build_documents(&self, task: &TaskResult) -> ExportResult<Vec<ExportDocument>> {
        let mut documents = vec![ExportDocument::from_serialize(
            TASK_INDEX,
            &task.uuid,
            &TaskReport::from_task(task),
        )?];

        for subtask in &task.subtasks {
            for workload in &subtask.workloads {
                let report = WorkloadReport::from_workload(task, workload)?;
                documents.push(ExportDocument::from_serialize(
                    WORKLOAD_INDEX,
                    &workload.uuid,
                    &report,
                )?);

                if self.options.include_metrics {
                    for metric in workload_metrics(&subtask.title, &report) {
                        let id = format!("{}_{}", workload.uuid, metric.name);
                        documents.push(ExportDocument::from_serialize(METRIC_INDEX, id, &metric)?);
                    }
                }

                if self.options.include_actions {
                    for iteration in workload.iterations() {
                        let records = ActionFlattener::new(&iteration, &report, &workload.uuid)
                            .with_max_depth(self.options.max_action_depth)
                            .flatten()?;
                        for record in records {
                            documents.push(ExportDocument::new(
                                ACTION_INDEX,
                                record.document_id(),
                                serde_json::to_value(&record)?,
                            ));
                        }
                    }
                }
            }
        }

        Ok(documents)
    }

    /// Export every task through `sink`
    ///
    /// The first sink error aborts the run and is returned as is.
    pub async fn export(&self, tasks: &[TaskResult], sink: &dyn ExportSink) -> ExportResult<ExportSummary> {
        sink.validate_config()?;

        let mut summary = ExportSummary::default();
        for task in tasks {
            let documents = self.build_documents(task)?;
            tracing::info!(
                target: "export",
                task = %task.uuid,
                sink = sink.sink_type(),
                documents = documents.len(),
                "Exporting task"
            );

            let chunk_size = match self.options.batch_size {
                0 => documents.len().max(1),
                size => size,
            };
            for chunk in documents.chunks(chunk_size) {
                let report = sink.export(chunk).await?;
                if !report.is_complete() {
                    tracing::warn!(
                        target: "export",
                        task = %task.uuid,
                        failed = report.failures.len(),
                        "Sink rejected some documents"
                    );
                }
                summary.batches.push(report);
            }

            summary.tasks += 1;
            summary.documents += documents.len();
        }

        Ok(summary)
    }
}

/// Parse task results from JSON: a single task or a list of tasks
pub fn parse_tasks(input: &str) -> ExportResult<Vec<TaskResult>> {
    let value: Value = serde_json::from_str(input)?;
    Ok(match value {
        Value::Array(_) => serde_json::from_value(value)?,
        single => vec![serde_json::from_value(single)?],
    })
}

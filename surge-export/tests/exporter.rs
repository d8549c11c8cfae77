//! Task exporter against mocked sinks and schema conformance of its documents

use async_trait::async_trait;
use mockall::mock;
use serde_json::json;
use surge_export::schema::{IndexSchema, ACTION_INDEX};
use surge_export::{
    BatchReport, ExportDocument, ExportError, ExportResult, ExportSink, ExporterOptions,
    MemorySink, TaskExporter, TaskResult,
};

mock! {
    pub Sink {}

    #[async_trait]
    impl ExportSink for Sink {
        async fn export(&self, batch: &[ExportDocument]) -> ExportResult<BatchReport>;
        fn validate_config(&self) -> ExportResult<()>;
        fn sink_type(&self) -> &'static str;
    }
}

fn tasks() -> Vec<TaskResult> {
    serde_json::from_value(json!([
        {
            "uuid": "task-1",
            "env_uuid": "env-1",
            "env_name": "staging",
            "title": "nightly",
            "status": "finished",
            "subtasks": [{
                "uuid": "sub-1",
                "title": "boot",
                "workloads": [{
                    "uuid": "wl-1",
                    "task_uuid": "task-1",
                    "subtask_uuid": "sub-1",
                    "name": "Nova.boot_server",
                    "args": {"image": "cirros"},
                    "runner_type": "constant",
                    "runner": {"times": 2},
                    "contexts": {"users": {"tenants": 1}},
                    "start_time": 1000.0,
                    "statistics": {"durations": {"total": {"data": {"success": "n/a"}}}},
                    "data": [{
                        "timestamp": 1000.0,
                        "duration": 3.0,
                        "error": ["Exception", "server went to ERROR"],
                        "atomic_actions": [
                            {"name": "create", "started_at": 1000.0, "finished_at": 1001.0},
                            {"name": "create", "started_at": 1001.0, "finished_at": 1002.0},
                            {"name": "delete", "started_at": 1002.0, "finished_at": 1003.0, "failed": true}
                        ]
                    }]
                }]
            }]
        },
        {"uuid": "task-2", "subtasks": []}
    ]))
    .unwrap()
}

#[tokio::test]
async fn one_batch_per_task_by_default() {
    let mut sink = MockSink::new();
    sink.expect_validate_config().times(1).returning(|| Ok(()));
    sink.expect_sink_type().return_const("mock");
    sink.expect_export()
        .times(2)
        .returning(|batch| {
            Ok(BatchReport {
                sink: "mock".to_string(),
                accepted: batch.len(),
                ..Default::default()
            })
        });

    let summary = TaskExporter::default().export(&tasks(), &sink).await.unwrap();
    assert_eq!(summary.tasks, 2);
    assert_eq!(summary.batches.len(), 2);
    // task-1: task, workload, 2 metrics, 3 actions; task-2: task only
    assert_eq!(summary.documents, 8);
    assert_eq!(summary.accepted(), 8);
}

#[tokio::test]
async fn sink_failure_aborts_export() {
    let mut sink = MockSink::new();
    sink.expect_validate_config().returning(|| Ok(()));
    sink.expect_sink_type().return_const("mock");
    sink.expect_export()
        .times(1)
        .returning(|_| Err(ExportError::InvalidInput("index closed".to_string())));

    let err = TaskExporter::default().export(&tasks(), &sink).await.unwrap_err();
    assert_eq!(err.to_string(), "Invalid input: index closed");
}

#[tokio::test]
async fn invalid_sink_config_sends_nothing() {
    let mut sink = MockSink::new();
    sink.expect_validate_config()
        .returning(|| Err(ExportError::InvalidConfig("no endpoint".to_string())));
    sink.expect_export().never();

    let options = ExporterOptions::default();
    let result = TaskExporter::new(options).export(&tasks(), &sink).await;
    assert!(matches!(result, Err(ExportError::InvalidConfig(_))));
}

#[tokio::test]
async fn documents_carry_every_schema_field() {
    let sink = MemorySink::new();
    TaskExporter::default().export(&tasks(), &sink).await.unwrap();

    for document in sink.documents().await {
        let schema = IndexSchema::by_name(&document.index).unwrap();
        assert!(
            schema.missing_fields(&document.body).is_empty(),
            "{} is missing {:?}",
            document.id,
            schema.missing_fields(&document.body)
        );
    }
}

#[tokio::test]
async fn failed_action_owns_iteration_error() {
    let sink = MemorySink::new();
    TaskExporter::default().export(&tasks(), &sink).await.unwrap();

    let actions = sink.documents_in(ACTION_INDEX).await;
    let ids: Vec<&str> = actions.iter().map(|doc| doc.id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "wl-1_iter_1_action_create_0",
            "wl-1_iter_1_action_create_1",
            "wl-1_iter_1_action_delete_0",
        ]
    );

    let with_error: Vec<&ExportDocument> = actions
        .iter()
        .filter(|doc| !doc.body["error"].is_null())
        .collect();
    assert_eq!(with_error.len(), 1);
    assert_eq!(with_error[0].body["action_name"], json!("delete"));
    assert_eq!(with_error[0].body["success"], json!(false));
    assert_eq!(with_error[0].body["started_at"], json!("1970-01-01T00:16:42"));
}

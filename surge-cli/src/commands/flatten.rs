//! `surge flatten`

use anyhow::{Context, Result};
use std::path::Path;
use surge_export::{
    schema::ACTION_INDEX, ActionFlattener, ExportDocument, TaskResult, WorkloadReport, WorkloadResult,
};
use tokio::io::AsyncWriteExt;

/// Flattened action documents of every iteration of a workload
pub fn flatten_workload(workload: &WorkloadResult, max_depth: usize) -> Result<Vec<ExportDocument>> {
    // Deployment fields are unknown without the enclosing task
    let task = TaskResult {
        uuid: workload.task_uuid.clone(),
        env_uuid: String::new(),
        env_name: String::new(),
        title: String::new(),
        description: String::new(),
        status: String::new(),
        pass_sla: workload.pass_sla,
        tags: Vec::new(),
        subtasks: Vec::new(),
    };
    let report = WorkloadReport::from_workload(&task, workload)?;

    let mut documents = Vec::new();
    for iteration in workload.iterations() {
        let records = ActionFlattener::new(&iteration, &report, &workload.uuid)
            .with_max_depth(max_depth)
            .flatten()
            .with_context(|| format!("Failed to flatten iteration {}", iteration.id))?;
        for record in records {
            documents.push(ExportDocument::from_serialize(
                ACTION_INDEX,
                record.document_id(),
                &record,
            )?);
        }
    }
    Ok(documents)
}

/// Print the flattened records of the workload in `input` to stdout
pub async fn handle_flatten(input: &Path, max_depth: usize) -> Result<usize> {
    let content = tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("Failed to read workload from {:?}", input))?;
    let workload: WorkloadResult = serde_json::from_str(&content).context("Failed to parse workload")?;

    let documents = flatten_workload(&workload, max_depth)?;
    let mut out = String::new();
    for document in &documents {
        out.push_str(&serde_json::to_string(document)?);
        out.push('\n');
    }

    let mut stdout = tokio::io::stdout();
    stdout.write_all(out.as_bytes()).await?;
    stdout.flush().await?;
    Ok(documents.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn workload() -> WorkloadResult {
        serde_json::from_value(json!({
            "uuid": "wl-7",
            "task_uuid": "task-7",
            "name": "Nova.boot_and_delete",
            "data": [{
                "timestamp": 1.0,
                "error": ["Timeout", "boot took too long"],
                "atomic_actions": [{
                    "name": "boot",
                    "started_at": 1.0,
                    "finished_at": 3.0,
                    "failed": true,
                    "children": [
                        {"name": "wait", "started_at": 1.5, "finished_at": 2.0,
                         "children": [{"name": "poll", "started_at": 1.6, "finished_at": 1.7,
                                       "children": [{"name": "get", "started_at": 1.6, "finished_at": 1.65}]}]},
                        {"name": "wait", "started_at": 2.0, "finished_at": 3.0, "failed": true}
                    ]
                }]
            }]
        }))
        .unwrap()
    }

    #[test]
    fn test_flatten_workload_links_parents() {
        let documents = flatten_workload(&workload(), 3).unwrap();
        let ids: Vec<&str> = documents.iter().map(|doc| doc.id.as_str()).collect();

        assert_eq!(
            ids,
            vec![
                "wl-7_iter_1_action_boot_0",
                "wl-7_iter_1_action_boot_0/wait_0",
                "wl-7_iter_1_action_boot_0/wait_0/poll_0",
                "wl-7_iter_1_action_boot_0/wait_1",
            ]
        );
        assert_eq!(documents[1].body["parent"], json!("wl-7_iter_1_action_boot_0"));
        assert_eq!(documents[3].body["error"], json!(["Timeout", "boot took too long"]));
        assert_eq!(documents[0].body["error"], Value::Null);
    }

    #[test]
    fn test_flatten_workload_depth_one() {
        let documents = flatten_workload(&workload(), 1).unwrap();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].body["error"], json!(["Timeout", "boot took too long"]));
    }
}

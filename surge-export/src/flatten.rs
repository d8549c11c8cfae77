//! Flattening of atomic action trees into parent-linked records
//!
//! The walk is depth-first and pre-order. Occurrence counters live in the
//! frame of the parent being expanded, so two siblings named `x` get
//! occurrences 0 and 1 no matter how often `x` appears elsewhere. Nodes
//! below [`MAX_ACTION_DEPTH`] levels are dropped.

use serde_json::Value;
use std::collections::HashMap;

use crate::error::ExportResult;
use crate::record::{format_timestamp, ActionId, ActionRecord, AtomicAction, Iteration};
use crate::report::WorkloadReport;

/// Number of tree levels that are flattened
pub const MAX_ACTION_DEPTH: usize = 3;

/// Name of the record created for failures outside any timed action
pub const UNNAMED_ACTION: &str = "no-name-action";

/// Next-index counter of one parent frame
#[derive(Debug, Default)]
struct OccurrenceCounter(HashMap<String, usize>);

impl OccurrenceCounter {
    fn next(&mut self, name: &str) -> usize {
        let slot = self.0.entry(name.to_string()).or_insert(0);
        let occurrence = *slot;
        *slot += 1;
        occurrence
    }
}

/// Bookkeeping shared across frames of one pass
#[derive(Debug, Default)]
struct PassState {
    records: Vec<ActionRecord>,
    error_attributed: bool,
    dropped: usize,
}

/// Flattens the atomic actions of one iteration
#[derive(Debug, Clone)]
pub struct ActionFlattener<'a> {
    iteration: &'a Iteration,
    workload: &'a WorkloadReport,
    workload_id: &'a str,
    max_depth: usize,
}

impl<'a> ActionFlattener<'a> {
    pub fn new(iteration: &'a Iteration, workload: &'a WorkloadReport, workload_id: &'a str) -> Self {
        Self {
            iteration,
            workload,
            workload_id,
            max_depth: MAX_ACTION_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Produce the records of the iteration in pre-order
    ///
    /// When the iteration failed, exactly one record carries its error: the
    /// first failed node none of whose flattened children failed, or else a
    /// synthetic [`UNNAMED_ACTION`] record stamped at the iteration end.
    pub fn flatten(&self) -> ExportResult<Vec<ActionRecord>> {
        let mut state = PassState::default();
        let mut top_level = OccurrenceCounter::default();

        self.flatten_frame(&self.iteration.atomic_actions, None, 0, &mut top_level, &mut state)?;

        if self.iteration.has_error() && !state.error_attributed {
            let timestamp = format_timestamp(self.iteration.end_timestamp())?;
            let id = ActionId {
                iteration_id: self.iteration.id.clone(),
                action_name: UNNAMED_ACTION.to_string(),
                occurrence: top_level.next(UNNAMED_ACTION),
                parent: None,
            };
            state.records.push(self.make_record(
                id,
                None,
                0.0,
                timestamp.clone(),
                timestamp,
                false,
                self.iteration.error.clone(),
            ));
        }

        if state.dropped > 0 {
            tracing::debug!(
                target: "export",
                iteration = %self.iteration.id,
                dropped = state.dropped,
                max_depth = self.max_depth,
                "Dropped atomic actions nested below the depth limit"
            );
        }

        Ok(state.records)
    }

    fn flatten_frame(
        &self,
        actions: &[AtomicAction],
        parent: Option<usize>,
        depth: usize,
        counter: &mut OccurrenceCounter,
        state: &mut PassState,
    ) -> ExportResult<()> {
        for action in actions {
            let id = ActionId {
                iteration_id: self.iteration.id.clone(),
                action_name: action.name.clone(),
                occurrence: counter.next(&action.name),
                parent: parent.map(|idx| state.records[idx].document_id()),
            };

            let expand = depth + 1 < self.max_depth;
            let failing_origin =
                action.failed && !(expand && action.children.iter().any(|child| child.failed));

            let error = if failing_origin && self.iteration.has_error() && !state.error_attributed {
                state.error_attributed = true;
                self.iteration.error.clone()
            } else {
                None
            };

            let record = self.make_record(
                id,
                parent,
                action.duration(),
                format_timestamp(action.started_at)?,
                format_timestamp(action.finished_at)?,
                !action.failed,
                error,
            );
            state.records.push(record);
            let index = state.records.len() - 1;

            if expand {
                let mut child_counter = OccurrenceCounter::default();
                self.flatten_frame(&action.children, Some(index), depth + 1, &mut child_counter, state)?;
            } else {
                state.dropped += action.children.iter().map(AtomicAction::node_count).sum::<usize>();
            }
        }

        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn make_record(
        &self,
        id: ActionId,
        parent_index: Option<usize>,
        duration: f64,
        started_at: String,
        finished_at: String,
        success: bool,
        error: Option<Value>,
    ) -> ActionRecord {
        ActionRecord {
            action_name: id.action_name.clone(),
            parent: id.parent.clone(),
            id,
            parent_index,
            deployment_uuid: self.workload.deployment_uuid.clone(),
            deployment_name: self.workload.deployment_name.clone(),
            workload_uuid: self.workload_id.to_string(),
            scenario_cfg: self.workload.scenario_cfg.clone(),
            contexts: self.workload.contexts.clone(),
            runner_name: self.workload.runner_name.clone(),
            runner_cfg: self.workload.runner_cfg.clone(),
            success,
            duration,
            started_at,
            finished_at,
            error,
        }
    }
}

/// Flatten one iteration with the default depth limit
pub fn flatten_iteration(
    iteration: &Iteration,
    workload: &WorkloadReport,
    workload_id: &str,
) -> ExportResult<Vec<ActionRecord>> {
    ActionFlattener::new(iteration, workload, workload_id).flatten()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn workload() -> WorkloadReport {
        WorkloadReport {
            deployment_uuid: "env-1".into(),
            deployment_name: "staging".into(),
            runner_name: "constant".into(),
            scenario_cfg: vec!["image=cirros".into()],
            ..Default::default()
        }
    }

    fn iteration(actions: Vec<AtomicAction>, error: Option<Value>) -> Iteration {
        Iteration {
            id: "wl_iter_1".into(),
            atomic_actions: actions,
            error,
            timestamp: 100.0,
            duration: 5.0,
            idle_duration: 0.0,
        }
    }

    #[test]
    fn test_single_successful_action() {
        let itr = iteration(vec![AtomicAction::new("a", 0.0, 1.0)], None);
        let records = flatten_iteration(&itr, &workload(), "wl").unwrap();

        assert_eq!(records.len(), 1);
        assert!(records[0].success);
        assert_eq!(records[0].duration, 1.0);
        assert_eq!(records[0].error, None);
        assert_eq!(records[0].parent, None);
        assert_eq!(records[0].document_id(), "wl_iter_1_action_a_0");
        assert_eq!(records[0].deployment_name, "staging");
        assert_eq!(records[0].workload_uuid, "wl");
    }

    #[test]
    fn test_failure_without_actions_gets_synthetic_record() {
        let itr = iteration(Vec::new(), Some(json!({"msg": "boom"})));
        let records = flatten_iteration(&itr, &workload(), "wl").unwrap();

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.action_name, UNNAMED_ACTION);
        assert_eq!(record.started_at, "1970-01-01T00:01:45");
        assert_eq!(record.finished_at, record.started_at);
        assert_eq!(record.duration, 0.0);
        assert!(!record.success);
        assert_eq!(record.error, Some(json!({"msg": "boom"})));
    }

    #[test]
    fn test_sibling_occurrences_scoped_per_parent() {
        let itr = iteration(
            vec![
                AtomicAction::new("x", 0.0, 1.0).with_child(AtomicAction::new("y", 0.0, 0.5)),
                AtomicAction::new("x", 1.0, 2.0)
                    .with_child(AtomicAction::new("y", 1.0, 1.2))
                    .with_child(AtomicAction::new("y", 1.2, 1.4)),
            ],
            None,
        );
        let records = flatten_iteration(&itr, &workload(), "wl").unwrap();
        let ids: Vec<(String, usize)> = records
            .iter()
            .map(|r| (r.action_name.clone(), r.id.occurrence))
            .collect();

        assert_eq!(
            ids,
            vec![
                ("x".into(), 0),
                ("y".into(), 0),
                ("x".into(), 1),
                ("y".into(), 0),
                ("y".into(), 1),
            ]
        );

        // Parent links point at earlier records and ids never collide
        assert_eq!(records[1].parent_index, Some(0));
        assert_eq!(records[4].parent_index, Some(2));
        assert_eq!(records[4].parent.as_deref(), Some("wl_iter_1_action_x_1"));
        let mut document_ids: Vec<String> = records.iter().map(ActionRecord::document_id).collect();
        document_ids.sort();
        document_ids.dedup();
        assert_eq!(document_ids.len(), records.len());
    }

    #[test]
    fn test_error_attributed_to_deepest_failed_node() {
        let itr = iteration(
            vec![
                AtomicAction::new("ok", 0.0, 1.0),
                AtomicAction::new("outer", 1.0, 3.0)
                    .failed()
                    .with_child(AtomicAction::new("inner", 1.0, 2.0).failed()),
            ],
            Some(json!(["Timeout", "inner took too long"])),
        );
        let records = flatten_iteration(&itr, &workload(), "wl").unwrap();

        assert_eq!(records.len(), 3);
        assert!(records[0].success);
        assert!(!records[1].success);
        assert_eq!(records[1].error, None);
        assert_eq!(records[2].action_name, "inner");
        assert_eq!(records[2].error, Some(json!(["Timeout", "inner took too long"])));
    }

    #[test]
    fn test_failure_after_successful_actions_adds_synthetic_record() {
        let itr = iteration(
            vec![AtomicAction::new("a", 0.0, 1.0), AtomicAction::new("b", 1.0, 2.0)],
            Some(json!("crashed outside timers")),
        );
        let records = flatten_iteration(&itr, &workload(), "wl").unwrap();

        assert_eq!(records.len(), 3);
        assert!(records.iter().take(2).all(|r| r.success && r.error.is_none()));
        assert_eq!(records[2].action_name, UNNAMED_ACTION);
        assert_eq!(records[2].document_id(), "wl_iter_1_action_no-name-action_0");
        assert_eq!(records.iter().filter(|r| r.error.is_some()).count(), 1);
    }

    #[test]
    fn test_nodes_below_depth_limit_are_dropped() {
        let deep = AtomicAction::new("l0", 0.0, 4.0).with_child(
            AtomicAction::new("l1", 0.0, 3.0).with_child(
                AtomicAction::new("l2", 0.0, 2.0)
                    .with_child(AtomicAction::new("l3", 0.0, 1.0).with_child(AtomicAction::new("l4", 0.0, 0.5))),
            ),
        );
        let itr = iteration(vec![deep], None);
        let records = flatten_iteration(&itr, &workload(), "wl").unwrap();

        let names: Vec<&str> = records.iter().map(|r| r.action_name.as_str()).collect();
        assert_eq!(names, vec!["l0", "l1", "l2"]);
        assert_eq!(records[2].parent.as_deref(), Some("wl_iter_1_action_l0_0/l1_0"));
    }

    #[test]
    fn test_failed_node_at_depth_limit_owns_error() {
        let tree = AtomicAction::new("l0", 0.0, 4.0).failed().with_child(
            AtomicAction::new("l1", 0.0, 3.0).failed().with_child(
                AtomicAction::new("l2", 0.0, 2.0)
                    .failed()
                    .with_child(AtomicAction::new("l3", 0.0, 1.0).failed()),
            ),
        );
        let itr = iteration(vec![tree], Some(json!("deep failure")));
        let records = flatten_iteration(&itr, &workload(), "wl").unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[2].action_name, "l2");
        assert_eq!(records[2].error, Some(json!("deep failure")));
        assert_eq!(records.iter().filter(|r| r.error.is_some()).count(), 1);
    }

    #[test]
    fn test_slash_in_name_keeps_ids_unique() {
        let itr = iteration(
            vec![
                AtomicAction::new("p", 0.0, 2.0).with_child(AtomicAction::new("c", 0.0, 1.0)),
                AtomicAction::new("p_0/c", 2.0, 3.0),
            ],
            None,
        );
        let records = flatten_iteration(&itr, &workload(), "wl").unwrap();
        let ids: Vec<String> = records.iter().map(ActionRecord::document_id).collect();

        assert_eq!(
            ids,
            vec![
                "wl_iter_1_action_p_0",
                "wl_iter_1_action_p_0/c_0",
                "wl_iter_1_action_p_0%2Fc_0",
            ]
        );
        let unique: std::collections::HashSet<&String> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
        assert_eq!(records[2].action_name, "p_0/c");
    }

    #[test]
    fn test_custom_depth_limit() {
        let tree = AtomicAction::new("a", 0.0, 2.0).with_child(AtomicAction::new("b", 0.0, 1.0));
        let itr = iteration(vec![tree], None);
        let records = ActionFlattener::new(&itr, &workload(), "wl")
            .with_max_depth(1)
            .flatten()
            .unwrap();
        assert_eq!(records.len(), 1);
    }
}

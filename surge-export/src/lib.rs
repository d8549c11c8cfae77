//! # Surge Export
//!
//! Turns task results into flat documents and delivers them to export
//! sinks.
//!
//! - **Flattening**: atomic action trees become parent-linked records with
//!   deterministic ids and exact failure attribution
//! - **Reports**: task, workload and metric documents with typed index schemas
//! - **Sinks**: memory, JSON-lines file, stdio and HTTP reference sinks
//!
//! ## Example
//!
//! ```rust
//! use surge_export::{flatten_iteration, AtomicAction, Iteration, WorkloadReport};
//!
//! let iteration = Iteration {
//!     id: "wl_iter_1".to_string(),
//!     atomic_actions: vec![AtomicAction::new("boot", 0.0, 1.5)],
//!     error: None,
//!     timestamp: 0.0,
//!     duration: 1.5,
//!     idle_duration: 0.0,
//! };
//! let records = flatten_iteration(&iteration, &WorkloadReport::default(), "wl").unwrap();
//! assert_eq!(records[0].document_id(), "wl_iter_1_action_boot_0");
//! ```

pub mod error;
pub mod exporter;
pub mod flatten;
pub mod record;
pub mod report;
pub mod schema;
pub mod sink;
pub mod sinks;
pub mod template;

pub use error::{ExportError, ExportResult};
pub use exporter::{parse_tasks, ExportSummary, ExporterOptions, TaskExporter};
pub use flatten::{flatten_iteration, ActionFlattener, MAX_ACTION_DEPTH, UNNAMED_ACTION};
pub use record::{format_timestamp, ActionId, ActionRecord, AtomicAction, Iteration};
pub use report::{
    flatten_config, parse_success_rate, workload_metrics, MetricDocument, SlaCheck, SlaResults,
    SubtaskResult, TaskReport, TaskResult, WorkloadReport, WorkloadResult,
};
pub use schema::{FieldType, IndexSchema};
pub use sink::{BatchReport, DocumentFailure, ExportDocument, ExportSink};
pub use sinks::{FileSink, FileSinkConfig, HttpSink, HttpSinkConfig, MemorySink, StdStream, StdioSink};
pub use template::TemplateEngine;

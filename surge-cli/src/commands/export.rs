//! `surge export`

use anyhow::{Context, Result};
use std::path::Path;
use surge_config::{ExportConfig, ExportDestination};
use surge_export::{
    parse_tasks, ExportSink, ExportSummary, ExporterOptions, FileSink, FileSinkConfig, HttpSink,
    HttpSinkConfig, StdStream, StdioSink, TaskExporter,
};

/// Sink for a configured destination
pub fn sink_for(destination: &ExportDestination) -> Result<Box<dyn ExportSink>> {
    Ok(match destination {
        ExportDestination::Stdout => Box::new(StdioSink::new(StdStream::Stdout)),
        ExportDestination::File {
            path,
            append,
            create_dirs,
        } => {
            let mut config = FileSinkConfig::new(path.as_str());
            config.append = *append;
            config.create_dirs = *create_dirs;
            Box::new(FileSink::new(config))
        }
        ExportDestination::Http {
            url,
            timeout_secs,
            headers,
            bearer_token,
        } => {
            let mut config = HttpSinkConfig::new(url.as_str());
            config.timeout_secs = *timeout_secs;
            config.headers = headers.clone().into_iter().collect();
            config.bearer_token = bearer_token.clone();
            Box::new(HttpSink::new(config).context("Failed to create http sink")?)
        }
    })
}

pub fn exporter_options(config: &ExportConfig) -> ExporterOptions {
    ExporterOptions {
        batch_size: config.batch_size,
        include_actions: config.include_actions,
        include_metrics: config.include_metrics,
        max_action_depth: config.max_action_depth,
    }
}

/// Export every task of `input` through the configured destination
pub async fn handle_export(config: &ExportConfig, input: &Path) -> Result<ExportSummary> {
    let content = tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("Failed to read task results from {:?}", input))?;
    let tasks = parse_tasks(&content).context("Failed to parse task results")?;

    let sink = sink_for(&config.destination)?;
    let summary = TaskExporter::new(exporter_options(config))
        .export(&tasks, sink.as_ref())
        .await
        .context("Export failed")?;

    tracing::info!(
        target: "export",
        tasks = summary.tasks,
        documents = summary.documents,
        accepted = summary.accepted(),
        failed = summary.failed(),
        "Export finished"
    );
    Ok(summary)
}

//! JSON-lines file sink

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Instant;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::error::{ExportError, ExportResult};
use crate::sink::{BatchReport, ExportDocument, ExportSink};
use crate::sinks::to_json_lines;
use crate::template::TemplateEngine;

/// Configuration for the file sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSinkConfig {
    /// Path template, e.g. `exports/{{date}}/surge.jsonl`
    pub path_template: String,
    #[serde(default = "default_true")]
    pub create_dirs: bool,
    /// Append to an existing file instead of replacing it
    #[serde(default = "default_true")]
    pub append: bool,
    /// Extra template variables
    #[serde(default)]
    pub variables: HashMap<String, String>,
}

fn default_true() -> bool {
    true
}

impl FileSinkConfig {
    pub fn new(path_template: impl Into<String>) -> Self {
        Self {
            path_template: path_template.into(),
            create_dirs: true,
            append: true,
            variables: HashMap::new(),
        }
    }

    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(key.into(), value.into());
        self
    }
}

/// Appends batches to a JSON-lines file
///
/// Besides the configured variables the path template can use `date`
/// (`%Y%m%d`) and `timestamp` (`%Y%m%d_%H%M%S`), both in UTC.
#[derive(Debug)]
pub struct FileSink {
    config: FileSinkConfig,
    template_engine: TemplateEngine,
}

impl FileSink {
    pub fn new(config: FileSinkConfig) -> Self {
        Self {
            config,
            template_engine: TemplateEngine::new(),
        }
    }

    fn render_path(&self) -> ExportResult<PathBuf> {
        let now = chrono::Utc::now();
        let mut variables = self.config.variables.clone();
        variables
            .entry("date".to_string())
            .or_insert_with(|| now.format("%Y%m%d").to_string());
        variables
            .entry("timestamp".to_string())
            .or_insert_with(|| now.format("%Y%m%d_%H%M%S").to_string());

        let rendered = self
            .template_engine
            .render(&self.config.path_template, &variables)?;
        if rendered.contains('\0') {
            return Err(ExportError::filesystem(rendered, "validate", "path contains null bytes"));
        }
        Ok(PathBuf::from(rendered))
    }
}

#[async_trait]
impl ExportSink for FileSink {
    async fn export(&self, batch: &[ExportDocument]) -> ExportResult<BatchReport> {
        let started = Instant::now();
        let path = self.render_path()?;
        let location = path.to_string_lossy().to_string();

        if self.config.create_dirs {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| ExportError::filesystem(parent.to_string_lossy(), "create_dirs", e))?;
            }
        }

        let payload = to_json_lines(batch)?;
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(self.config.append)
            .truncate(!self.config.append)
            .open(&path)
            .await
            .map_err(|e| ExportError::filesystem(location.clone(), "open", e))?;
        file.write_all(&payload)
            .await
            .map_err(|e| ExportError::filesystem(location.clone(), "write", e))?;
        file.flush()
            .await
            .map_err(|e| ExportError::filesystem(location.clone(), "flush", e))?;

        tracing::debug!(
            target: "export",
            path = %location,
            documents = batch.len(),
            bytes = payload.len(),
            "Batch written to file"
        );

        Ok(BatchReport::accepted(self.sink_type(), batch.len(), started.elapsed()).with_location(location))
    }

    fn validate_config(&self) -> ExportResult<()> {
        if self.config.path_template.trim().is_empty() {
            return Err(ExportError::InvalidConfig("file path is empty".to_string()));
        }
        self.template_engine.validate(&self.config.path_template)
    }

    fn sink_type(&self) -> &'static str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_file_sink_appends_json_lines() {
        let temp_dir = TempDir::new().unwrap();
        let template = format!("{}/{{{{task}}}}/out.jsonl", temp_dir.path().display());
        let sink = FileSink::new(FileSinkConfig::new(template).with_variable("task", "task-1"));
        sink.validate_config().unwrap();

        let first = sink
            .export(&[ExportDocument::new("idx", "1", json!({"a": 1}))])
            .await
            .unwrap();
        sink.export(&[ExportDocument::new("idx", "2", json!({"a": 2}))])
            .await
            .unwrap();

        let path = temp_dir.path().join("task-1").join("out.jsonl");
        assert_eq!(first.location.as_deref(), path.to_str());

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<ExportDocument> = content
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].id, "2");
        assert_eq!(lines[1].body, json!({"a": 2}));
    }

    #[tokio::test]
    async fn test_file_sink_truncates_without_append() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out.jsonl");
        let mut config = FileSinkConfig::new(path.to_string_lossy());
        config.append = false;
        let sink = FileSink::new(config);

        for id in ["1", "2"] {
            sink.export(&[ExportDocument::new("idx", id, json!({}))])
                .await
                .unwrap();
        }

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
    }

    #[test]
    fn test_invalid_config() {
        assert!(FileSink::new(FileSinkConfig::new("  ")).validate_config().is_err());
        assert!(FileSink::new(FileSinkConfig::new("{{broken")).validate_config().is_err());
    }

    #[tokio::test]
    async fn test_missing_variable_fails_export() {
        let sink = FileSink::new(FileSinkConfig::new("/tmp/{{unknown}}.jsonl"));
        let err = sink.export(&[]).await.unwrap_err();
        assert!(matches!(err, ExportError::TemplateRender { .. }));
    }
}

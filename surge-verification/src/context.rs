//! Context building the `testr`/`stestr` command of a verification run

use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use surge_context::{Context, ContextPlugin, ContextRegistry, ContextResult, ContextSettings, RunContext};
use surge_plugin::{PluginDescriptor, PluginResult};
use tempfile::TempPath;

use crate::error::VerificationResult;
use crate::manager::VerifierManager;
use crate::run_args::RunArgs;
use crate::skip::expand_skip_list;

pub const TESTR_CONTEXT: &str = "testr";

/// Runs after every context that prepares the cloud under test
pub const TESTR_ORDER: i32 = 999;

/// Run-context key of the runner command line
pub const TESTR_CMD_KEY: &str = "testr_cmd";

/// Run-context key of the (prepared) run arguments
pub const RUN_ARGS_KEY: &str = "run_args";

/// Runner command line for the given arguments
///
/// `load_list_file` is the file holding the tests to run, if any.
pub fn build_command(uses_testr: bool, run_args: &RunArgs, load_list_file: Option<&Path>) -> Vec<String> {
    let tool = if uses_testr { "testr" } else { "stestr" };
    let mut command: Vec<String> = vec![tool.into(), "run".into(), "--subunit".into()];

    let concurrency = run_args.concurrency;
    if uses_testr && (concurrency == 0 || concurrency > 1) {
        command.push("--parallel".into());
    }
    if concurrency >= 1 {
        if concurrency == 1 && !uses_testr {
            command.push("--serial".into());
        } else {
            command.push("--concurrency".into());
            command.push(concurrency.to_string());
        }
    }

    if let Some(file) = load_list_file {
        command.push("--load-list".into());
        command.push(file.display().to_string());
    }
    if run_args.failed {
        command.push("--failing".into());
    }
    if let Some(pattern) = run_args.pattern.as_deref().filter(|p| !p.is_empty()) {
        command.push(pattern.to_string());
    }

    command
}

/// Factory of [`TestrContext`] instances bound to one verifier
pub struct TestrContextPlugin {
    manager: Arc<dyn VerifierManager>,
}

impl TestrContextPlugin {
    pub fn new(manager: Arc<dyn VerifierManager>) -> Self {
        Self { manager }
    }

    pub fn descriptor() -> PluginDescriptor {
        PluginDescriptor::new(TESTR_CONTEXT)
            .with_order(TESTR_ORDER)
            .with_description("Builds the testr/stestr command line of a verification run")
    }
}

impl ContextPlugin for TestrContextPlugin {
    fn config_schema(&self) -> Option<Value> {
        Some(json!({
            "type": "object",
            "properties": {
                "concurrency": {"type": "integer", "minimum": 0},
                "load_list": {"type": "array", "items": {"type": "string"}},
                "skip_list": {"type": "object"},
                "xfail_list": {"type": "object"},
                "failed": {"type": "boolean"},
                "pattern": {"type": "string"}
            }
        }))
    }

    fn create(&self, settings: ContextSettings) -> ContextResult<Box<dyn Context>> {
        Ok(Box::new(TestrContext {
            settings,
            manager: self.manager.clone(),
            tmp_files: Vec::new(),
        }))
    }
}

/// Register the testr context for `manager` on the default platform
pub async fn register_testr_context(
    registry: &ContextRegistry,
    manager: Arc<dyn VerifierManager>,
) -> PluginResult<()> {
    registry
        .register(
            TestrContextPlugin::descriptor(),
            Arc::new(TestrContextPlugin::new(manager)),
        )
        .await
}

/// Publishes the runner command under `testr_cmd`
///
/// Run arguments come from the run data when a verifier published them,
/// otherwise from the context configuration.
pub struct TestrContext {
    settings: ContextSettings,
    manager: Arc<dyn VerifierManager>,
    tmp_files: Vec<TempPath>,
}

impl TestrContext {
    fn run_args(&self, run: &RunContext) -> VerificationResult<RunArgs> {
        let raw = match run.data.get(RUN_ARGS_KEY) {
            Some(published) => published.clone(),
            None => self.settings.config.to_value(),
        };
        if raw.is_null() {
            return Ok(RunArgs::default());
        }
        Ok(serde_json::from_value(raw)?)
    }

    /// Apply the skip list to the load list, listing tests when none is given
    async fn apply_skip_list(&self, run_args: &mut RunArgs) -> VerificationResult<()> {
        if !run_args.has_skip_list() {
            return Ok(());
        }

        let load_list = match run_args.load_list.take() {
            Some(tests) if !tests.is_empty() => tests,
            _ => self.manager.list_tests("").await?,
        };
        let patterns = run_args.skip_list.take().unwrap_or_default();
        let skipped = expand_skip_list(&load_list, &patterns);

        let remaining: Vec<String> = load_list
            .into_iter()
            .filter(|test| !skipped.contains_key(test))
            .collect();
        tracing::debug!(
            target: "verification",
            skipped = skipped.len(),
            remaining = remaining.len(),
            "Applied skip list"
        );

        run_args.load_list = Some(remaining);
        run_args.skip_list = Some(skipped);
        Ok(())
    }

    async fn write_load_list(&mut self, tests: &[String]) -> VerificationResult<TempPath> {
        let path = tempfile::Builder::new()
            .prefix("surge-load-list-")
            .tempfile()?
            .into_temp_path();
        tokio::fs::write(&path, tests.join("\n")).await?;
        Ok(path)
    }

    async fn prepare(&mut self, run: &mut RunContext) -> VerificationResult<()> {
        let run_args = self.run_args(run)?;
        let mut run_args = self.manager.prepare_run_args(run_args);
        self.apply_skip_list(&mut run_args).await?;

        let load_list = run_args.load_list.clone().unwrap_or_default();
        let load_list_file = if load_list.is_empty() {
            None
        } else {
            let path = self.write_load_list(&load_list).await?;
            let file = path.to_path_buf();
            self.tmp_files.push(path);
            Some(file)
        };

        let command = build_command(self.manager.uses_testr(), &run_args, load_list_file.as_deref());
        tracing::info!(
            target: "verification",
            context = %self.settings.qualified_name(),
            command = %command.join(" "),
            "Prepared runner command"
        );

        run.publish(TESTR_CMD_KEY, json!(command));
        run.publish(RUN_ARGS_KEY, serde_json::to_value(&run_args)?);
        Ok(())
    }
}

#[async_trait]
impl Context for TestrContext {
    async fn setup(&mut self, run: &mut RunContext) -> ContextResult<()> {
        Ok(self.prepare(run).await?)
    }

    async fn cleanup(&mut self, _run: &mut RunContext) -> ContextResult<()> {
        let mut first_error = None;
        for path in self.tmp_files.drain(..) {
            let location = path.display().to_string();
            match path.close() {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(target: "verification", path = %location, error = %e, "Failed to remove load list");
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}

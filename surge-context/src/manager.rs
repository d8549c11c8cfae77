//! Context lifecycle manager
//!
//! Resolves every selector of a run configuration, sets the contexts up in
//! ascending order and cleans them up in exactly the reverse order.

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use surge_plugin::PluginKey;

use crate::error::{ContextError, ContextResult};
use crate::plugin::{Context, ContextRegistry, ContextSettings};
use crate::run::RunContext;

/// A resolved and instantiated context
struct ResolvedContext {
    key: PluginKey,
    order: i32,
    instance: Box<dyn Context>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ManagerState {
    Idle,
    SetUp,
    CleanedUp,
}

/// A context whose cleanup failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupFailure {
    /// Qualified `name@platform`
    pub context: String,
    pub error: String,
}

/// Outcome of a cleanup pass, in the order cleanups were attempted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupReport {
    pub cleaned: Vec<String>,
    pub failures: Vec<CleanupFailure>,
}

impl CleanupReport {
    /// True when every attempted cleanup succeeded
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of contexts whose cleanup was attempted
    pub fn attempted(&self) -> usize {
        self.cleaned.len() + self.failures.len()
    }
}

/// Drives setup and cleanup of the contexts configured for one run
pub struct ContextManager {
    registry: ContextRegistry,
    run: RunContext,
    completed: Vec<ResolvedContext>,
    state: ManagerState,
}

impl ContextManager {
    pub fn new(registry: ContextRegistry, run: RunContext) -> Self {
        Self {
            registry,
            run,
            completed: Vec::new(),
            state: ManagerState::Idle,
        }
    }

    pub fn run_context(&self) -> &RunContext {
        &self.run
    }

    pub fn run_context_mut(&mut self) -> &mut RunContext {
        &mut self.run
    }

    pub fn into_run_context(self) -> RunContext {
        self.run
    }

    /// Qualified names of contexts that completed setup, in setup order
    pub fn completed_contexts(&self) -> Vec<String> {
        self.completed.iter().map(|ctx| ctx.key.to_string()).collect()
    }

    /// Resolve, instantiate and order every configured context
    ///
    /// Fails before anything is instantiated when a selector does not
    /// resolve. Ties keep the declaration order of the configuration.
    async fn resolve_and_sort(&self) -> ContextResult<Vec<ResolvedContext>> {
        let mut registered = Vec::with_capacity(self.run.config.len());
        for selector in self.run.selectors() {
            let plugin = self.registry.resolve_str(selector).await?;
            registered.push((selector, plugin));
        }

        let mut contexts = Vec::with_capacity(registered.len());
        for (selector, plugin) in registered {
            let key = plugin.key();
            let settings = ContextSettings::from_run(
                key.clone(),
                selector,
                &plugin.plugin.default_config(),
                &self.run,
            );
            let instance = plugin.plugin.create(settings)?;
            contexts.push(ResolvedContext {
                key,
                order: plugin.order(),
                instance,
            });
        }

        contexts.sort_by_key(|ctx| ctx.order);
        Ok(contexts)
    }

    /// Qualified names of the configured contexts in setup order
    pub async fn setup_order(&self) -> ContextResult<Vec<String>> {
        Ok(self
            .resolve_and_sort()
            .await?
            .iter()
            .map(|ctx| ctx.key.to_string())
            .collect())
    }

    /// Set up every configured context in ascending order
    ///
    /// Stops at the first failure; contexts that completed setup before it
    /// stay recorded for [`ContextManager::cleanup`].
    pub async fn setup(&mut self) -> ContextResult<&RunContext> {
        if self.state != ManagerState::Idle {
            return Err(ContextError::AlreadySetUp);
        }
        self.state = ManagerState::SetUp;

        let contexts = self.resolve_and_sort().await?;
        tracing::info!(
            target: "context_manager",
            count = contexts.len(),
            "Setting up contexts"
        );

        for mut ctx in contexts {
            let started = Instant::now();
            tracing::info!(target: "context_manager", context = %ctx.key, "Context setup started");

            if let Err(e) = ctx.instance.setup(&mut self.run).await {
                tracing::error!(
                    target: "context_manager",
                    context = %ctx.key,
                    error = %e,
                    "Context {}.setup() failed",
                    ctx.key
                );
                return Err(ContextError::SetupFailed {
                    context: ctx.key.to_string(),
                    source: Box::new(e),
                });
            }

            tracing::info!(
                target: "context_manager",
                context = %ctx.key,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Context setup finished"
            );
            self.completed.push(ctx);
        }

        Ok(&self.run)
    }

    /// Clean up contexts in exact reverse setup order
    ///
    /// Failures are logged and collected; every context is attempted. When
    /// `setup()` never ran, every configured context is resolved and cleaned.
    pub async fn cleanup(&mut self) -> ContextResult<CleanupReport> {
        let contexts = match self.state {
            ManagerState::Idle => self.resolve_and_sort().await?,
            ManagerState::SetUp => std::mem::take(&mut self.completed),
            ManagerState::CleanedUp => return Ok(CleanupReport::default()),
        };
        self.state = ManagerState::CleanedUp;

        let mut report = CleanupReport::default();
        for mut ctx in contexts.into_iter().rev() {
            let started = Instant::now();
            tracing::info!(target: "context_manager", context = %ctx.key, "Context cleanup started");

            match ctx.instance.cleanup(&mut self.run).await {
                Ok(()) => {
                    tracing::info!(
                        target: "context_manager",
                        context = %ctx.key,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Context cleanup finished"
                    );
                    report.cleaned.push(ctx.key.to_string());
                }
                Err(e) => {
                    tracing::error!(
                        target: "context_manager",
                        context = %ctx.key,
                        error = %e,
                        "Context {}.cleanup() failed",
                        ctx.key
                    );
                    report.failures.push(CleanupFailure {
                        context: ctx.key.to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        Ok(report)
    }

    /// Set up, run `body`, and clean up on every exit path
    ///
    /// Setup and body errors are returned as is; cleanup problems are only
    /// logged so they never mask them.
    pub async fn run<T, E, F>(&mut self, body: F) -> Result<T, E>
    where
        E: From<ContextError>,
        F: for<'a> FnOnce(&'a mut RunContext) -> BoxFuture<'a, Result<T, E>>,
    {
        let setup = self.setup().await.map(|_| ());
        let outcome = match setup {
            Ok(()) => body(&mut self.run).await,
            Err(e) => Err(e.into()),
        };

        match self.cleanup().await {
            Ok(report) if !report.is_clean() => {
                tracing::warn!(
                    target: "context_manager",
                    failed = report.failures.len(),
                    attempted = report.attempted(),
                    "Some contexts failed to clean up"
                );
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!(target: "context_manager", error = %e, "Context cleanup aborted");
            }
        }

        outcome
    }
}

impl std::fmt::Debug for ContextManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextManager")
            .field("state", &self.state)
            .field("completed", &self.completed_contexts())
            .finish_non_exhaustive()
    }
}

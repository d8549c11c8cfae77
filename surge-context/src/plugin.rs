//! Context plugin traits

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;
use surge_plugin::{PluginKey, PluginRegistry};

use crate::config::ContextConfig;
use crate::error::{ContextError, ContextResult};
use crate::run::{RunContext, TaskRef};
use crate::validation;

/// Registry of context plugins
pub type ContextRegistry = PluginRegistry<dyn ContextPlugin>;

/// Everything a context instance is constructed with
#[derive(Debug, Clone)]
pub struct ContextSettings {
    /// Registry key the instance was resolved to
    pub key: PluginKey,
    /// Selector as written in the run configuration
    pub selector: String,
    /// Effective configuration for this context
    pub config: ContextConfig,
    pub task: Option<TaskRef>,
    pub owner_id: Option<String>,
}

impl ContextSettings {
    /// Extract the settings for `selector` from a run, merging over `defaults`
    pub fn from_run(key: PluginKey, selector: &str, defaults: &Value, run: &RunContext) -> Self {
        Self {
            key,
            selector: selector.to_string(),
            config: ContextConfig::from_raw(run.raw_config(selector), defaults),
            task: run.task.clone(),
            owner_id: run.owner_id().map(str::to_string),
        }
    }

    /// Qualified `name@platform` of the context
    pub fn qualified_name(&self) -> String {
        self.key.to_string()
    }
}

/// A live context instance
///
/// `setup` prepares fixtures and publishes them into the run context;
/// `cleanup` must tear down whatever `setup` created.
#[async_trait]
pub trait Context: Send + Sync {
    async fn setup(&mut self, run: &mut RunContext) -> ContextResult<()>;

    async fn cleanup(&mut self, run: &mut RunContext) -> ContextResult<()>;
}

/// Factory registered in the [`ContextRegistry`]
pub trait ContextPlugin: Send + Sync {
    /// Defaults merged under mapping configurations
    fn default_config(&self) -> Value {
        Value::Object(Default::default())
    }

    /// JSON schema the raw configuration must satisfy
    fn config_schema(&self) -> Option<Value> {
        None
    }

    /// Checks beyond the schema; returns one message per problem
    fn validate_config(&self, _config: &Value) -> Vec<String> {
        Vec::new()
    }

    /// Create an instance for one run
    fn create(&self, settings: ContextSettings) -> ContextResult<Box<dyn Context>>;
}

/// Scoped acquisition of a single context
///
/// Calls `setup`, runs `body` and then always calls `cleanup`. When `setup`
/// fails neither the body nor `cleanup` runs. A cleanup failure is returned
/// only when the body succeeded.
pub async fn with_context<T, E, F>(
    context: &mut dyn Context,
    run: &mut RunContext,
    body: F,
) -> Result<T, E>
where
    E: From<ContextError>,
    F: for<'a> FnOnce(&'a mut RunContext) -> BoxFuture<'a, Result<T, E>>,
{
    context.setup(run).await?;
    let outcome = body(run).await;
    let cleanup = context.cleanup(run).await;

    match (outcome, cleanup) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(err)) => Err(err.into()),
        (Err(err), cleanup) => {
            if let Err(cleanup_err) = cleanup {
                tracing::error!(
                    target: "context_manager",
                    error = %cleanup_err,
                    "Context cleanup failed after body error"
                );
            }
            Err(err)
        }
    }
}

/// Validate the configuration of the context addressed by `selector`
///
/// Returns an empty list when the configuration is valid.
pub async fn validate(registry: &ContextRegistry, selector: &str, config: &Value) -> Vec<String> {
    match registry.resolve_str(selector).await {
        Ok(registered) => validation::validate_plugin_config(registered.plugin.as_ref(), config),
        Err(err) => vec![err.to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use serde_json::json;
    use std::sync::{Arc, Mutex};
    use surge_plugin::PluginDescriptor;

    struct Journal {
        events: Arc<Mutex<Vec<String>>>,
        fail_setup: bool,
    }

    #[async_trait]
    impl Context for Journal {
        async fn setup(&mut self, run: &mut RunContext) -> ContextResult<()> {
            self.events.lock().unwrap().push("setup".into());
            if self.fail_setup {
                return Err(ContextError::execution_error("journal", "boom"));
            }
            run.publish("journal", json!(true));
            Ok(())
        }

        async fn cleanup(&mut self, _run: &mut RunContext) -> ContextResult<()> {
            self.events.lock().unwrap().push("cleanup".into());
            Ok(())
        }
    }

    struct DummyPlugin;

    impl ContextPlugin for DummyPlugin {
        fn default_config(&self) -> Value {
            json!({"alpha": "beta"})
        }

        fn config_schema(&self) -> Option<Value> {
            Some(json!({
                "type": "object",
                "properties": {"test": {"type": "integer"}},
                "additionalProperties": false
            }))
        }

        fn create(&self, _settings: ContextSettings) -> ContextResult<Box<dyn Context>> {
            Ok(Box::new(Journal {
                events: Arc::default(),
                fail_setup: false,
            }))
        }
    }

    #[tokio::test]
    async fn test_with_context_runs_cleanup() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let mut context = Journal {
            events: events.clone(),
            fail_setup: false,
        };
        let mut run = RunContext::default();

        let value: Result<u32, ContextError> = with_context(&mut context, &mut run, |run| {
            async move {
                assert_eq!(run.data.get("journal"), Some(&json!(true)));
                Ok(7)
            }
            .boxed()
        })
        .await;

        assert_eq!(value.unwrap(), 7);
        assert_eq!(*events.lock().unwrap(), vec!["setup", "cleanup"]);
    }

    #[tokio::test]
    async fn test_with_context_cleans_up_after_body_error() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let mut context = Journal {
            events: events.clone(),
            fail_setup: false,
        };
        let mut run = RunContext::default();

        let result: Result<(), ContextError> = with_context(&mut context, &mut run, |_| {
            async { Err(ContextError::generic("body failed")) }.boxed()
        })
        .await;

        assert_eq!(result.unwrap_err().to_string(), "body failed");
        assert_eq!(*events.lock().unwrap(), vec!["setup", "cleanup"]);
    }

    #[tokio::test]
    async fn test_with_context_skips_body_when_setup_fails() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let mut context = Journal {
            events: events.clone(),
            fail_setup: true,
        };
        let mut run = RunContext::default();
        let mut body_ran = false;

        let result: Result<(), ContextError> = with_context(&mut context, &mut run, |_| {
            body_ran = true;
            async { Ok(()) }.boxed()
        })
        .await;

        assert!(result.is_err());
        assert!(!body_ran);
        assert_eq!(*events.lock().unwrap(), vec!["setup"]);
    }

    #[tokio::test]
    async fn test_validate_through_registry() {
        let registry = ContextRegistry::new();
        registry
            .register(PluginDescriptor::new("dummy"), Arc::new(DummyPlugin))
            .await
            .unwrap();

        assert!(validate(&registry, "dummy", &json!({"test": 2})).await.is_empty());
        assert_eq!(validate(&registry, "dummy", &json!({"nonexisting": 2})).await.len(), 1);

        let missing = validate(&registry, "dummy@nowhere", &json!({})).await;
        assert_eq!(missing, vec!["Plugin 'dummy@nowhere' not found".to_string()]);
    }

    #[test]
    fn test_settings_from_run() {
        let config = json!({"dummy@foo": {"ab": "cd"}});
        let run = RunContext::new(TaskRef::new("task-1"), config.as_object().cloned().unwrap());
        let settings = ContextSettings::from_run(
            PluginKey::new("dummy", "foo"),
            "dummy@foo",
            &DummyPlugin.default_config(),
            &run,
        );

        assert_eq!(settings.qualified_name(), "dummy@foo");
        assert_eq!(settings.config.to_value(), json!({"alpha": "beta", "ab": "cd"}));
        assert_eq!(settings.owner_id.as_deref(), Some("task-1"));
    }
}

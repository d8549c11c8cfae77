//! `surge verify`

use anyhow::{anyhow, Context, Result};
use futures::FutureExt;
use serde_json::Map;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use surge_config::VerificationConfig;
use surge_context::{ContextManager, ContextRegistry, RunContext, TaskRef};
use surge_verification::context::TESTR_CMD_KEY;
use surge_verification::{register_testr_context, RunArgs, SkipList, TestrLauncher, TESTR_CONTEXT};
use tokio::io::{AsyncRead, AsyncWrite};

/// Command line options of a verification run
#[derive(Debug, Clone, Default)]
pub struct VerifyOptions {
    pub repo_dir: Option<PathBuf>,
    pub concurrency: Option<u32>,
    pub pattern: Option<String>,
    pub skip_list: Option<PathBuf>,
    pub failed: bool,
    pub dry_run: bool,
}

/// Read a YAML mapping of test patterns to skip reasons
pub fn load_skip_list(path: &Path) -> Result<SkipList> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read skip list from {:?}", path))?;
    if content.trim().is_empty() {
        return Ok(SkipList::new());
    }
    serde_yaml::from_str(&content).with_context(|| format!("Invalid skip list in {:?}", path))
}

/// Run arguments from the command line, falling back to configuration
pub fn run_args(config: &VerificationConfig, options: &VerifyOptions) -> Result<RunArgs> {
    let mut args = RunArgs::default().with_concurrency(options.concurrency.unwrap_or(config.concurrency));
    args.pattern = options.pattern.clone();
    args.failed = options.failed;
    if let Some(path) = &options.skip_list {
        args.skip_list = Some(load_skip_list(path)?);
    }
    Ok(args)
}

/// Set up the testr context, run the tests and clean up
///
/// Returns the exit code of the runner, or 0 for a dry run.
pub async fn handle_verify(config: &VerificationConfig, options: VerifyOptions) -> Result<i32> {
    let repo_dir = options
        .repo_dir
        .clone()
        .or_else(|| config.repo_dir.clone())
        .ok_or_else(|| anyhow!("No test repository given; pass --repo-dir or set verification.repo_dir"))?;
    let base_dir = config.base_dir().cloned().unwrap_or_else(|| repo_dir.clone());

    let launcher = config
        .env
        .iter()
        .fold(TestrLauncher::new(repo_dir, base_dir), |launcher, (key, value)| {
            launcher.with_env(key.as_str(), value.as_str())
        });
    if !options.dry_run {
        launcher.init().await?;
    }

    let registry = ContextRegistry::new();
    register_testr_context(&registry, Arc::new(launcher.clone())).await?;

    let mut contexts = Map::new();
    contexts.insert(
        TESTR_CONTEXT.to_string(),
        serde_json::to_value(run_args(config, &options)?)?,
    );
    let verification = uuid::Uuid::new_v4().to_string();
    let run = RunContext::new(TaskRef::new(verification.clone()), contexts);
    tracing::info!(target: "verification", verification = %verification, "Starting verification");

    let dry_run = options.dry_run;
    let mut manager = ContextManager::new(registry, run);
    let outcome = manager
        .run::<i32, anyhow::Error, _>(move |run: &mut RunContext| {
            async move {
                if dry_run {
                    println!("{}", run.data.get(TESTR_CMD_KEY).cloned().unwrap_or_default());
                    return Ok(0);
                }

                let mut child = launcher.run(run)?;
                let stdout = forward(child.stdout.take(), tokio::io::stdout());
                let stderr = forward(child.stderr.take(), tokio::io::stderr());
                tokio::try_join!(stdout, stderr)?;
                let status = child.wait().await?;
                tracing::info!(target: "verification", status = ?status.code(), "Test runner finished");
                Ok(status.code().unwrap_or(1))
            }
            .boxed()
        })
        .await;
    outcome
}

/// Copy a child stream to `out` until it closes
async fn forward<R, W>(stream: Option<R>, mut out: W) -> std::io::Result<u64>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    match stream {
        Some(mut stream) => tokio::io::copy(&mut stream, &mut out).await,
        None => Ok(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_args_prefer_command_line() {
        let config = VerificationConfig {
            concurrency: 2,
            ..Default::default()
        };

        let args = run_args(&config, &VerifyOptions::default()).unwrap();
        assert_eq!(args.concurrency, 2);

        let options = VerifyOptions {
            concurrency: Some(1),
            pattern: Some("smoke".to_string()),
            failed: true,
            ..Default::default()
        };
        let args = run_args(&config, &options).unwrap();
        assert_eq!(args.concurrency, 1);
        assert_eq!(args.pattern.as_deref(), Some("smoke"));
        assert!(args.failed);
    }

    #[test]
    fn test_load_skip_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("skip.yaml");
        std::fs::write(&path, "tempest.api.image: \"no glance\"\ntest_resize: ~\n").unwrap();

        let skip = load_skip_list(&path).unwrap();
        assert_eq!(skip["tempest.api.image"].as_deref(), Some("no glance"));
        assert_eq!(skip["test_resize"], None);
    }

    #[tokio::test]
    async fn test_forward_copies_stream() {
        let mut out = Vec::new();
        let copied = forward(Some(&b"subunit"[..]), &mut out).await.unwrap();
        assert_eq!(copied, 7);
        assert_eq!(out, b"subunit");

        assert_eq!(forward(None::<&[u8]>, &mut out).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_verify_requires_repo_dir() {
        let err = handle_verify(&VerificationConfig::default(), VerifyOptions::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("--repo-dir"));
    }

    #[tokio::test]
    async fn test_dry_run_builds_command() {
        let dir = tempfile::tempdir().unwrap();
        let options = VerifyOptions {
            repo_dir: Some(dir.path().to_path_buf()),
            concurrency: Some(1),
            dry_run: true,
            ..Default::default()
        };
        let code = handle_verify(&VerificationConfig::default(), options).await.unwrap();
        assert_eq!(code, 0);
    }
}

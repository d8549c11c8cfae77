//! Launcher of the `testr`/`stestr` test runner

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use surge_context::RunContext;
use tokio::process::{Child, Command};

use crate::context::TESTR_CMD_KEY;
use crate::error::{VerificationError, VerificationResult};
use crate::manager::VerifierManager;

/// Shape of a test id as printed by the runner's list command
static TEST_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z_.0-9]+(\[[a-zA-Z\-_,=0-9]*\])?$").expect("test name pattern is valid")
});

/// Whether a line of runner output is a test id
pub fn is_test_name(line: &str) -> bool {
    TEST_NAME_RE.is_match(line)
}

/// Runs the test runner inside a test repository
#[derive(Debug, Clone)]
pub struct TestrLauncher {
    repo_dir: PathBuf,
    base_dir: PathBuf,
    environ: HashMap<String, String>,
    use_testr: bool,
}

impl TestrLauncher {
    /// `testr` is used when `repo_dir` carries a `.testr.conf`, `stestr` otherwise
    pub fn new(repo_dir: impl Into<PathBuf>, base_dir: impl Into<PathBuf>) -> Self {
        let repo_dir = repo_dir.into();
        let use_testr = repo_dir.join(".testr.conf").exists();
        Self {
            repo_dir,
            base_dir: base_dir.into(),
            environ: HashMap::new(),
            use_testr,
        }
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environ.insert(key.into(), value.into());
        self
    }

    pub fn tool(&self) -> &'static str {
        if self.use_testr {
            "testr"
        } else {
            "stestr"
        }
    }

    pub fn repo_dir(&self) -> &Path {
        &self.repo_dir
    }

    fn repository_dir(&self) -> PathBuf {
        self.base_dir.join(".testrepository")
    }

    fn command(&self, args: &[String]) -> VerificationResult<Command> {
        let (program, rest) = args
            .split_first()
            .ok_or_else(|| VerificationError::MissingCommand(TESTR_CMD_KEY.to_string()))?;
        let mut cmd = Command::new(program);
        cmd.args(rest).current_dir(&self.repo_dir).envs(&self.environ);
        Ok(cmd)
    }

    /// Run `args` to completion and return its stdout
    async fn check_output(&self, args: &[String]) -> VerificationResult<String> {
        let output = self
            .command(args)?
            .output()
            .await
            .map_err(|source| VerificationError::Spawn {
                command: args.join(" "),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VerificationError::command_failed(
                args,
                output.status.code(),
                stderr.trim(),
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Initialise the test repository unless it already exists
    ///
    /// A partially created repository is removed when initialisation fails.
    pub async fn init(&self) -> VerificationResult<()> {
        let repository = self.repository_dir();
        if tokio::fs::metadata(&repository)
            .await
            .map(|meta| meta.is_dir())
            .unwrap_or(false)
        {
            return Ok(());
        }

        tracing::info!(target: "verification", tool = self.tool(), repo = %self.repo_dir.display(), "Initializing test repository");
        let args = vec![self.tool().to_string(), "init".to_string()];
        if let Err(e) = self.check_output(&args).await {
            tracing::error!(target: "verification", error = %e, "Test repository initialization failed");
            if repository.exists() {
                tokio::fs::remove_dir_all(&repository).await?;
            }
            return Err(VerificationError::InitFailed {
                tool: self.tool().to_string(),
                reason: e.to_string(),
            });
        }
        Ok(())
    }

    /// Spawn the command published by the testr context
    ///
    /// Stdout is piped for a subunit parser and stderr is piped next to it,
    /// so runner errors reach the caller too. The caller owns the child and
    /// must drain both streams.
    pub fn run(&self, run: &RunContext) -> VerificationResult<Child> {
        let args: Vec<String> = run
            .data
            .get(TESTR_CMD_KEY)
            .cloned()
            .map(serde_json::from_value)
            .transpose()?
            .ok_or_else(|| VerificationError::MissingCommand(TESTR_CMD_KEY.to_string()))?;

        tracing::info!(target: "verification", command = %args.join(" "), "Starting test runner");
        self.command(&args)?
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| VerificationError::Spawn {
                command: args.join(" "),
                source,
            })
    }
}

#[async_trait]
impl VerifierManager for TestrLauncher {
    fn uses_testr(&self) -> bool {
        self.use_testr
    }

    async fn list_tests(&self, pattern: &str) -> VerificationResult<Vec<String>> {
        let list = if self.use_testr { "list-tests" } else { "list" };
        let mut args = vec![self.tool().to_string(), list.to_string()];
        if !pattern.is_empty() {
            args.push(pattern.to_string());
        }

        let output = self.check_output(&args).await?;
        Ok(output
            .lines()
            .map(str::trim)
            .filter(|line| is_test_name(line))
            .map(str::to_string)
            .collect())
    }
}

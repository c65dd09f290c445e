//! Process invocation.
//!
//! An [`Invoker`] turns a program path plus an argument array into a spawned
//! subprocess, with:
//! - a real implementation on `tokio::process`, relaying child output
//!   line-by-line to tracing,
//! - a mock implementation for testing.
//!
//! No shell is involved: arguments reach the child verbatim, so values
//! containing spaces or metacharacters stay single tokens.

use std::process::Stdio;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::command::{
    CalculateCheckSumAttrs, FutureRollbackCountSqlAttrs, GenerateChangeLogAttrs, LiquibaseCommand,
    UpdateAttrs,
};
use crate::config::LiquibaseConfig;
use crate::error::{InvokeError, Result};

/// How a tool invocation ended.
///
/// `code` is `None` when the child was killed by a signal. A nonzero code is
/// still a resolved result, not an error; see [`InvokeError`] for what does
/// reject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolExit {
    pub code: Option<i32>,
}

impl ToolExit {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Trait for subprocess execution (testable).
#[async_trait]
pub trait Invoker: Send + Sync {
    async fn invoke(&self, program: &str, args: &[String]) -> Result<ToolExit>;
}

/// Real invoker using `tokio::process`.
pub struct RealInvoker;

#[async_trait]
impl Invoker for RealInvoker {
    async fn invoke(&self, program: &str, args: &[String]) -> Result<ToolExit> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| InvokeError::spawn(program, e))?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let out_relay = tokio::spawn(relay_lines(stdout, StreamTag::Stdout));
        let err_relay = tokio::spawn(relay_lines(stderr, StreamTag::Stderr));

        let status = child.wait().await?;
        let _ = out_relay.await;
        let _ = err_relay.await;

        Ok(ToolExit {
            code: status.code(),
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum StreamTag {
    Stdout,
    Stderr,
}

/// Forward each line of a child stream to tracing. Side effect only; lines
/// are not buffered into the invocation result.
async fn relay_lines<R>(stream: Option<R>, tag: StreamTag)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let Some(stream) = stream else {
        return;
    };
    let mut lines = BufReader::new(stream).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        match tag {
            StreamTag::Stdout => info!(stream = "stdout", "{line}"),
            StreamTag::Stderr => warn!(stream = "stderr", "{line}"),
        }
    }
}

/// Mock invoker for testing. Records every invocation and returns queued
/// exits, defaulting to exit 0 when the queue is empty.
#[derive(Default)]
pub struct MockInvoker {
    exits: Mutex<Vec<ToolExit>>,
    calls: Mutex<Vec<(String, Vec<String>)>>,
}

impl MockInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an exit to return on a subsequent invocation.
    pub fn add_exit(&self, exit: ToolExit) {
        self.exits.lock().unwrap().push(exit);
    }

    /// Every `(program, args)` pair seen so far.
    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Invoker for MockInvoker {
    async fn invoke(&self, program: &str, args: &[String]) -> Result<ToolExit> {
        self.calls
            .lock()
            .unwrap()
            .push((program.to_string(), args.to_vec()));
        let mut exits = self.exits.lock().unwrap();
        if exits.is_empty() {
            Ok(ToolExit { code: Some(0) })
        } else {
            Ok(exits.remove(0))
        }
    }
}

/// The liquibase invoker: a merged, read-only configuration plus an
/// [`Invoker`] to run commands with.
///
/// Each command method returns a future that settles when the subprocess
/// exits (or fails to launch); the caller is never blocked. No mutual
/// exclusion is provided between invocations — two un-awaited calls may run
/// concurrently against the same database, and serializing them is the
/// caller's responsibility.
pub struct Liquibase {
    config: LiquibaseConfig,
    invoker: Arc<dyn Invoker>,
}

impl Liquibase {
    pub fn new(config: LiquibaseConfig) -> Self {
        Self::with_invoker(config, Arc::new(RealInvoker))
    }

    pub fn with_invoker(config: LiquibaseConfig, invoker: Arc<dyn Invoker>) -> Self {
        Self { config, invoker }
    }

    pub fn config(&self) -> &LiquibaseConfig {
        &self.config
    }

    /// Run any supported command. Resolves with the tool's exit code
    /// (nonzero included), rejects only when the process cannot be launched.
    pub async fn run(&self, command: &LiquibaseCommand) -> Result<ToolExit> {
        debug!(command = command.name(), "{}", command.command_line(&self.config));
        let args = command.build_args(&self.config);
        self.invoker.invoke(&self.config.liquibase, &args).await
    }

    /// Apply pending changesets (`update`).
    pub async fn update(&self, attrs: UpdateAttrs) -> Result<ToolExit> {
        self.run(&LiquibaseCommand::Update(attrs)).await
    }

    /// Compute a changeset checksum (`calculateCheckSum`).
    pub async fn calculate_checksum(&self, attrs: CalculateCheckSumAttrs) -> Result<ToolExit> {
        self.run(&LiquibaseCommand::CalculateCheckSum(attrs)).await
    }

    /// Preview rollback SQL for future changesets (`futureRollbackCountSQL`).
    pub async fn future_rollback_count_sql(
        &self,
        attrs: FutureRollbackCountSqlAttrs,
    ) -> Result<ToolExit> {
        self.run(&LiquibaseCommand::FutureRollbackCountSql(attrs))
            .await
    }

    /// Reverse-engineer a changelog (`generateChangeLog`).
    pub async fn generate_changelog(&self, attrs: GenerateChangeLogAttrs) -> Result<ToolExit> {
        self.run(&LiquibaseCommand::GenerateChangeLog(attrs)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_invoker_returns_queued_exit() {
        let mock = MockInvoker::new();
        mock.add_exit(ToolExit { code: Some(3) });

        let exit = mock.invoke("liquibase", &[]).await.unwrap();
        assert_eq!(exit.code, Some(3));
        assert!(!exit.success());
    }

    #[tokio::test]
    async fn mock_invoker_defaults_to_zero() {
        let mock = MockInvoker::new();
        let exit = mock.invoke("liquibase", &[]).await.unwrap();
        assert!(exit.success());
    }

    #[tokio::test]
    async fn update_invokes_tool_path_with_built_args() {
        let mock = Arc::new(MockInvoker::new());
        let liquibase = Liquibase::with_invoker(
            LiquibaseConfig {
                liquibase: "echo".into(),
                change_log_file: "x.sql".into(),
                ..Default::default()
            },
            mock.clone(),
        );

        let exit = liquibase
            .update(UpdateAttrs {
                extra: vec![("verbose".into(), "true".into())],
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(exit.success());

        let calls = mock.calls();
        assert_eq!(calls.len(), 1);
        let (program, args) = &calls[0];
        assert_eq!(program, "echo");
        assert_eq!(
            args,
            &vec![
                "--changeLogFile=x.sql".to_string(),
                "update".to_string(),
                r#"--verbose="true""#.to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn nonzero_exit_resolves_instead_of_rejecting() {
        let mock = Arc::new(MockInvoker::new());
        mock.add_exit(ToolExit { code: Some(1) });
        let liquibase = Liquibase::with_invoker(LiquibaseConfig::default(), mock);

        let exit = liquibase.update(UpdateAttrs::default()).await.unwrap();
        assert_eq!(exit.code, Some(1));
    }

    #[tokio::test]
    async fn each_invocation_spawns_exactly_once() {
        let mock = Arc::new(MockInvoker::new());
        let liquibase = Liquibase::with_invoker(LiquibaseConfig::default(), mock.clone());

        liquibase
            .calculate_checksum(CalculateCheckSumAttrs::default())
            .await
            .unwrap();
        liquibase
            .generate_changelog(GenerateChangeLogAttrs::default())
            .await
            .unwrap();

        let calls = mock.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].1.contains(&"calculateCheckSum".to_string()));
        assert!(calls[1].1.contains(&"generateChangeLog".to_string()));
    }
}

// src/exec/shell.rs

//! Shell-command task action.

use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;

use anyhow::{bail, Context};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::debug;

use crate::exec::{ExecutionContext, TaskAction};

/// Runs a command line through the platform shell.
///
/// The engine never inspects what the command does; stdout and stderr are
/// consumed (so pipe buffers never fill) and logged at debug level. A
/// non-zero exit status is an action failure.
#[derive(Debug, Clone)]
pub struct ShellAction {
    cmd: String,
}

impl ShellAction {
    pub fn new(cmd: impl Into<String>) -> Self {
        Self { cmd: cmd.into() }
    }

    pub fn command(&self) -> &str {
        &self.cmd
    }
}

impl TaskAction for ShellAction {
    fn run(
        &self,
        ctx: ExecutionContext,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>> {
        let cmd = self.cmd.clone();
        Box::pin(run_command(cmd, ctx))
    }
}

async fn run_command(cmd: String, ctx: ExecutionContext) -> anyhow::Result<()> {
    debug!(
        task = %ctx.task,
        run_id = ctx.run_id,
        attempt = ctx.attempt,
        cmd = %cmd,
        "starting command"
    );

    // Build a shell command appropriate for the platform.
    let mut command = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(&cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(&cmd);
        c
    };

    command
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = command
        .spawn()
        .with_context(|| format!("spawning process for task '{}'", ctx.task))?;

    if let Some(stdout) = child.stdout.take() {
        spawn_line_logger(stdout, ctx.task.clone(), ctx.run_id, "stdout");
    }
    if let Some(stderr) = child.stderr.take() {
        spawn_line_logger(stderr, ctx.task.clone(), ctx.run_id, "stderr");
    }

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for process of task '{}'", ctx.task))?;

    if status.success() {
        Ok(())
    } else {
        bail!("command exited with status {}", status.code().unwrap_or(-1));
    }
}

fn spawn_line_logger(
    pipe: impl tokio::io::AsyncRead + Unpin + Send + 'static,
    task: String,
    run_id: u64,
    stream: &'static str,
) {
    tokio::spawn(async move {
        let reader = BufReader::new(pipe);
        let mut lines = reader.lines();
        while let Ok(Some(line)) = lines.next_line().await {
            debug!(task = %task, run_id, "{stream}: {line}");
        }
    });
}

#[cfg(test)]
#[cfg(unix)]
mod tests {
    use super::*;

    fn ctx() -> ExecutionContext {
        ExecutionContext {
            run_id: 1,
            task: "shell".to_string(),
            attempt: 1,
        }
    }

    #[tokio::test]
    async fn exit_zero_succeeds() {
        let action = ShellAction::new("true");
        assert!(action.run(ctx()).await.is_ok());
    }

    #[tokio::test]
    async fn non_zero_exit_is_an_error() {
        let action = ShellAction::new("exit 3");
        let err = action.run(ctx()).await.unwrap_err();
        assert!(err.to_string().contains("status 3"));
    }
}

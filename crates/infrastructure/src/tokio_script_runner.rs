use std::process::Stdio;

use async_trait::async_trait;
use outpost_application::{ScriptExit, ScriptInvocation, ScriptRunner};
use outpost_core::{AppError, AppResult};
use tokio::process::Command;

/// Runs job scripts as child processes of the worker.
///
/// The interpreter is spawned directly with the script as its only argument.
/// Stdout and stderr both append to the invocation's log file.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScriptRunner;

impl TokioScriptRunner {
    /// Creates a script runner.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

async fn open_log(invocation: &ScriptInvocation) -> AppResult<(Stdio, Stdio)> {
    let log_error = |error: std::io::Error| {
        AppError::Io(format!(
            "failed to open job log '{}': {error}",
            invocation.log_path.display()
        ))
    };
    let stdout = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&invocation.log_path)
        .await
        .map_err(log_error)?
        .into_std()
        .await;
    let stderr = stdout.try_clone().map_err(log_error)?;

    Ok((Stdio::from(stdout), Stdio::from(stderr)))
}

#[async_trait]
impl ScriptRunner for TokioScriptRunner {
    async fn run_script(&self, invocation: ScriptInvocation) -> AppResult<ScriptExit> {
        let (stdout, stderr) = open_log(&invocation).await?;

        let mut child = Command::new(&invocation.program)
            .arg(&invocation.script)
            .current_dir(&invocation.working_dir)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .kill_on_drop(true)
            .spawn()
            .map_err(|error| {
                AppError::Io(format!(
                    "failed to start '{}' for '{}': {error}",
                    invocation.program,
                    invocation.script.display()
                ))
            })?;

        tracing::debug!(
            program = %invocation.program,
            script = %invocation.script.display(),
            pid = ?child.id(),
            "started job script"
        );

        let status = match tokio::time::timeout(invocation.timeout, child.wait()).await {
            Ok(status) => status.map_err(|error| {
                AppError::Io(format!("failed to wait for job script: {error}"))
            })?,
            Err(_) => {
                if let Err(error) = child.kill().await {
                    tracing::warn!(error = %error, "failed to kill timed-out job script");
                }
                return Ok(ScriptExit::TimedOut);
            }
        };

        Ok(match status.code() {
            Some(code) => ScriptExit::Code(code),
            None => ScriptExit::Terminated,
        })
    }
}

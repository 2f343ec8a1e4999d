use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use outpost_core::AppResult;

/// Unpacks a job archive into a workspace directory.
#[async_trait]
pub trait ArchiveExtractor: Send + Sync {
    /// Extracts all archive entries below `destination`.
    async fn extract(&self, archive: Vec<u8>, destination: &Path) -> AppResult<()>;
}

/// One script execution request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptInvocation {
    /// Interpreter program, spawned directly without a shell.
    pub program: String,
    /// Script path passed as the single interpreter argument.
    pub script: PathBuf,
    /// Working directory of the child process.
    pub working_dir: PathBuf,
    /// File receiving stdout and stderr, opened in append mode.
    pub log_path: PathBuf,
    /// Wall-clock budget for this invocation.
    pub timeout: Duration,
}

/// How a script invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptExit {
    /// Process exited with a status code.
    Code(i32),
    /// Process was terminated by a signal.
    Terminated,
    /// Process outlived its timeout and was killed.
    TimedOut,
}

impl ScriptExit {
    /// Returns true only for exit code zero.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Code(0))
    }
}

/// Runs job scripts as bounded subprocesses.
#[async_trait]
pub trait ScriptRunner: Send + Sync {
    /// Runs the script and waits for it or for the timeout, whichever is first.
    async fn run_script(&self, invocation: ScriptInvocation) -> AppResult<ScriptExit>;
}

/// Purges the shared temporary-files area after a job.
#[async_trait]
pub trait TempDirPurger: Send + Sync {
    /// Removes everything inside the temporary area.
    async fn purge(&self) -> AppResult<()>;
}

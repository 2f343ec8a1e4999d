use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use outpost_core::AppResult;
use outpost_domain::{EndpointAddress, JobReference, JobSettings, WorkerToken, workspace_files};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::install_cache::InstallCache;
use crate::job_log::JobLog;
use crate::ports::{
    ArchiveExtractor, CoordinatorClient, ScriptExit, ScriptInvocation, ScriptRunner,
    TempDirPurger,
};
use crate::workspace::Workspace;

mod phases;

/// Process-wide execution settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionSettings {
    /// Parent directory of job workspaces.
    pub workspace_root: PathBuf,
    /// Program used to run install and run scripts.
    pub interpreter: String,
    /// Per-phase timeout when the job ships no settings.
    pub default_timeout: Duration,
    /// Purge the shared temporary area after every job.
    pub clear_temp_dir: bool,
}

/// Everything a successful job produced.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectedResults {
    /// Job log with collection annotations.
    pub log: JobLog,
    /// Parsed result records.
    pub records: Vec<Value>,
    /// Parsed log messages.
    pub messages: Vec<Value>,
    /// Binary artifacts listed in the manifest.
    pub binary_files: Vec<String>,
}

/// Classification of one job attempt, derived from phase exits only.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    /// Install (if any) and run exited with status zero.
    Success(CollectedResults),
    /// A phase exited non-zero, was killed, or timed out.
    Failure {
        /// Job log with failure annotations.
        log: JobLog,
    },
}

/// Outcome plus the workspace still holding the job's files.
#[derive(Debug)]
pub struct ExecutedJob {
    /// Workspace to report from and clean up afterwards.
    pub workspace: Workspace,
    /// Success or failure of the attempt.
    pub outcome: JobOutcome,
}

/// Materialises job workspaces and runs their phases.
#[derive(Clone)]
pub struct JobExecutor {
    client: Arc<dyn CoordinatorClient>,
    extractor: Arc<dyn ArchiveExtractor>,
    runner: Arc<dyn ScriptRunner>,
    temp_dir_purger: Option<Arc<dyn TempDirPurger>>,
    settings: ExecutionSettings,
}

impl JobExecutor {
    /// Creates a job executor.
    #[must_use]
    pub fn new(
        client: Arc<dyn CoordinatorClient>,
        extractor: Arc<dyn ArchiveExtractor>,
        runner: Arc<dyn ScriptRunner>,
        settings: ExecutionSettings,
    ) -> Self {
        Self {
            client,
            extractor,
            runner,
            temp_dir_purger: None,
            settings,
        }
    }

    /// Adds the purger used when temp-directory clearing is enabled.
    #[must_use]
    pub fn with_temp_dir_purger(mut self, temp_dir_purger: Arc<dyn TempDirPurger>) -> Self {
        self.temp_dir_purger = Some(temp_dir_purger);
        self
    }

    /// Fetches, unpacks, and runs one job.
    ///
    /// On error no workspace is left behind. On success the caller owns the
    /// returned workspace and must pass it to [`JobExecutor::cleanup`].
    pub async fn execute(
        &self,
        endpoint: &EndpointAddress,
        token: &WorkerToken,
        job: &JobReference,
        install_cache: &mut InstallCache,
    ) -> AppResult<ExecutedJob> {
        let archive = self.client.download_archive(endpoint, token, job).await?;
        let workspace = Workspace::create(&self.settings.workspace_root, job).await?;

        if let Err(error) = self.prepare(&workspace, archive).await {
            self.cleanup(workspace).await;
            return Err(error);
        }

        let outcome = self.run_phases(job, &workspace, install_cache).await;
        Ok(ExecutedJob { workspace, outcome })
    }

    async fn prepare(&self, workspace: &Workspace, archive: Vec<u8>) -> AppResult<()> {
        self.extractor.extract(archive, workspace.root()).await?;
        workspace.reset_log().await
    }

    async fn run_phases(
        &self,
        job: &JobReference,
        workspace: &Workspace,
        install_cache: &mut InstallCache,
    ) -> JobOutcome {
        let timeout = self.resolve_timeout(workspace).await;
        let mut annotations = Vec::new();

        let installed = self
            .install(job, workspace, timeout, install_cache, &mut annotations)
            .await;

        let succeeded = if installed {
            info!(job = %job, "executing job");
            let exit = self
                .run_phase(workspace, workspace_files::RUN_SCRIPT, timeout, &mut annotations)
                .await;
            exit.is_success()
        } else {
            false
        };

        let mut log = JobLog::new(workspace.read_log().await);
        for note in annotations {
            log.annotate(note);
        }

        if succeeded {
            info!(job = %job, "job executed successfully");
            JobOutcome::Success(self.collect(workspace, log).await)
        } else {
            warn!(job = %job, "job failed");
            JobOutcome::Failure { log }
        }
    }

    async fn resolve_timeout(&self, workspace: &Workspace) -> Duration {
        let fallback = self.settings.default_timeout;
        let document = match workspace.read_if_exists(workspace_files::JOB_SETTINGS).await {
            Ok(Some(document)) => document,
            Ok(None) => {
                info!(
                    timeout_seconds = fallback.as_secs_f64(),
                    "no job timeout configured, using default"
                );
                return fallback;
            }
            Err(error) => {
                warn!(error = %error, "job settings unreadable, using default timeout");
                return fallback;
            }
        };

        let timeout = JobSettings::from_json(String::from_utf8_lossy(&document).as_ref())
            .and_then(|settings| settings.timeout());
        match timeout {
            Ok(Some(timeout)) => {
                info!(timeout_seconds = timeout.as_secs_f64(), "using job timeout");
                timeout
            }
            Ok(None) => {
                debug!("job settings carry no timeout, using default");
                fallback
            }
            Err(error) => {
                warn!(error = %error, "job settings invalid, using default timeout");
                fallback
            }
        }
    }

    /// Deletes the workspace and, when enabled, purges the temporary area.
    pub async fn cleanup(&self, workspace: Workspace) {
        if cfg!(windows) {
            debug!(
                workspace = %workspace.root().display(),
                "workspace cleanup is not attempted on this platform"
            );
            return;
        }

        let root = workspace.root().to_path_buf();
        if let Err(error) = workspace.remove().await {
            warn!(workspace = %root.display(), error = %error, "failed to remove workspace");
        }

        if self.settings.clear_temp_dir
            && let Some(purger) = &self.temp_dir_purger
            && let Err(error) = purger.purge().await
        {
            warn!(error = %error, "failed to clear temporary directory");
        }
    }
}

fn timeout_note(timeout: Duration) -> String {
    format!("Worker Timeout Expired after {}s", timeout.as_secs_f64())
}

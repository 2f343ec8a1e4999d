use std::sync::Arc;

use outpost_core::{AppError, AppResult};
use outpost_domain::{
    EndpointAddress, ErrorSubmission, JobReference, ResultSubmission, WorkerToken,
};
use tracing::{info, warn};

use crate::job_executor::{CollectedResults, JobOutcome};
use crate::job_log::JobLog;
use crate::ports::CoordinatorClient;
use crate::workspace::Workspace;

/// Uploads job outcomes to the coordinator that issued the job.
#[derive(Clone)]
pub struct ResultReporter {
    client: Arc<dyn CoordinatorClient>,
}

impl ResultReporter {
    /// Creates a result reporter.
    #[must_use]
    pub fn new(client: Arc<dyn CoordinatorClient>) -> Self {
        Self { client }
    }

    /// Reports one outcome.
    ///
    /// Authentication loss and transport failures propagate; any other
    /// rejection of the final submission is logged and dropped.
    pub async fn report(
        &self,
        endpoint: &EndpointAddress,
        token: &WorkerToken,
        job: &JobReference,
        workspace: &Workspace,
        outcome: JobOutcome,
    ) -> AppResult<()> {
        match outcome {
            JobOutcome::Success(results) => {
                self.report_success(endpoint, token, job, workspace, results)
                    .await
            }
            JobOutcome::Failure { log } => self.report_failure(endpoint, token, job, log).await,
        }
    }

    /// Reports an attempt that failed before any script ran, using the
    /// error text as the error log.
    pub async fn report_aborted(
        &self,
        endpoint: &EndpointAddress,
        token: &WorkerToken,
        job: &JobReference,
        error: &AppError,
    ) -> AppResult<()> {
        warn!(job = %job, error = %error, "job could not be prepared, sending error log");
        let submission = ErrorSubmission {
            error_log: error.to_string(),
        };
        let submitted = self
            .client
            .submit_error(endpoint, token, job, &submission)
            .await;
        settle(job, submitted, "error log")
    }

    async fn report_success(
        &self,
        endpoint: &EndpointAddress,
        token: &WorkerToken,
        job: &JobReference,
        workspace: &Workspace,
        results: CollectedResults,
    ) -> AppResult<()> {
        let CollectedResults {
            mut log,
            records,
            messages,
            binary_files,
        } = results;

        info!(job = %job, files = binary_files.len(), "sending results");
        for file_name in &binary_files {
            let uploaded = match workspace.read_artifact(file_name).await {
                Ok(contents) => {
                    self.client
                        .upload_binary_file(endpoint, token, job, file_name, contents)
                        .await
                }
                Err(error) => Err(error),
            };

            match uploaded {
                Ok(()) => info!(job = %job, file = %file_name, "binary file sent"),
                Err(error) => {
                    warn!(job = %job, file = %file_name, error = %error, "posting binary file failed");
                    log.annotate(format!("Posting file {file_name} failed"));
                }
            }
        }

        let submission = ResultSubmission {
            log: log.into_string(),
            records,
            log_messages: messages,
        };
        let submitted = self
            .client
            .submit_results(endpoint, token, job, &submission)
            .await;
        settle(job, submitted, "results")
    }

    async fn report_failure(
        &self,
        endpoint: &EndpointAddress,
        token: &WorkerToken,
        job: &JobReference,
        log: JobLog,
    ) -> AppResult<()> {
        warn!(job = %job, "an error occurred in job, sending error log");
        let submission = ErrorSubmission {
            error_log: log.into_string(),
        };
        let submitted = self
            .client
            .submit_error(endpoint, token, job, &submission)
            .await;
        settle(job, submitted, "error log")
    }
}

fn settle(job: &JobReference, submitted: AppResult<()>, what: &str) -> AppResult<()> {
    match submitted {
        Ok(()) => {
            info!(job = %job, "{what} sent successfully");
            Ok(())
        }
        Err(error @ (AppError::Unauthorized(_) | AppError::Transport(_))) => Err(error),
        Err(error) => {
            warn!(job = %job, error = %error, "{what} could not be sent");
            Ok(())
        }
    }
}

use async_trait::async_trait;
use outpost_core::AppResult;
use outpost_domain::{
    EndpointAddress, ErrorSubmission, JobReference, RegistrationRequest, RegistrationResponse,
    ResultSubmission, WorkerToken,
};

/// Port for every request the worker sends to a coordinator.
///
/// Implementations map HTTP 401/403 to `AppError::Unauthorized` and
/// connection-level failures to `AppError::Transport`.
#[async_trait]
pub trait CoordinatorClient: Send + Sync {
    /// Registers the worker; succeeds only on `201 Created`.
    async fn register_worker(
        &self,
        endpoint: &EndpointAddress,
        token: &WorkerToken,
        request: &RegistrationRequest,
    ) -> AppResult<RegistrationResponse>;

    /// Asks for a pending job; `Some` when the coordinator redirected to one.
    async fn poll_job(
        &self,
        endpoint: &EndpointAddress,
        token: &WorkerToken,
    ) -> AppResult<Option<JobReference>>;

    /// Downloads the job archive.
    async fn download_archive(
        &self,
        endpoint: &EndpointAddress,
        token: &WorkerToken,
        job: &JobReference,
    ) -> AppResult<Vec<u8>>;

    /// Uploads one binary artifact over a fresh connection.
    async fn upload_binary_file(
        &self,
        endpoint: &EndpointAddress,
        token: &WorkerToken,
        job: &JobReference,
        file_name: &str,
        contents: Vec<u8>,
    ) -> AppResult<()>;

    /// Submits the results of a successful job.
    async fn submit_results(
        &self,
        endpoint: &EndpointAddress,
        token: &WorkerToken,
        job: &JobReference,
        submission: &ResultSubmission,
    ) -> AppResult<()>;

    /// Submits the log of a failed job.
    async fn submit_error(
        &self,
        endpoint: &EndpointAddress,
        token: &WorkerToken,
        job: &JobReference,
        submission: &ErrorSubmission,
    ) -> AppResult<()>;
}

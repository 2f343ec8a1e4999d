use std::time::Duration;

use async_trait::async_trait;
use outpost_application::CoordinatorClient;
use outpost_core::{AppError, AppResult};
use outpost_domain::{
    EndpointAddress, ErrorSubmission, JobReference, RegistrationRequest, RegistrationResponse,
    ResultSubmission, WorkerToken, workspace_files,
};
use reqwest::{StatusCode, header};

const WORKER_TOKEN_HEADER: &str = "Worker-Token";

/// HTTP implementation of the coordinator protocol.
///
/// Redirects are never followed so job offers stay visible. Binary uploads
/// go through a client that keeps no idle connections, so every upload
/// opens a fresh one.
pub struct HttpCoordinatorClient {
    http_client: reqwest::Client,
    upload_client: reqwest::Client,
}

impl HttpCoordinatorClient {
    /// Creates a coordinator client with the given connect timeout.
    pub fn new(connect_timeout: Duration) -> AppResult<Self> {
        let http_client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|error| AppError::Internal(format!("failed to build HTTP client: {error}")))?;
        let upload_client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(connect_timeout)
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|error| {
                AppError::Internal(format!("failed to build upload HTTP client: {error}"))
            })?;

        Ok(Self {
            http_client,
            upload_client,
        })
    }

    async fn send(
        &self,
        builder: reqwest::RequestBuilder,
        token: &WorkerToken,
        action: &str,
    ) -> AppResult<reqwest::Response> {
        builder
            .header(WORKER_TOKEN_HEADER, token.as_str())
            .send()
            .await
            .map_err(|error| AppError::Transport(format!("failed to call {action}: {error}")))
    }
}

/// Maps 401/403 to `Unauthorized` and other unexpected statuses to `Protocol`.
async fn reject_status(response: reqwest::Response, action: &str) -> AppError {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return AppError::Unauthorized(format!(
            "{action} returned status {}",
            status.as_u16()
        ));
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<body unavailable>".to_owned());
    AppError::Protocol(format!(
        "{action} returned status {}: {body}",
        status.as_u16()
    ))
}

async fn require_success(response: reqwest::Response, action: &str) -> AppResult<()> {
    if response.status().is_success() {
        return Ok(());
    }

    Err(reject_status(response, action).await)
}

#[async_trait]
impl CoordinatorClient for HttpCoordinatorClient {
    async fn register_worker(
        &self,
        endpoint: &EndpointAddress,
        token: &WorkerToken,
        request: &RegistrationRequest,
    ) -> AppResult<RegistrationResponse> {
        let url = endpoint.resource_url(&["workers"])?;
        let response = self
            .send(self.http_client.post(url).json(request), token, "worker registration")
            .await?;

        if response.status() != StatusCode::CREATED {
            return Err(reject_status(response, "worker registration").await);
        }

        response
            .json::<RegistrationResponse>()
            .await
            .map_err(|error| {
                AppError::Protocol(format!("failed to parse registration response: {error}"))
            })
    }

    async fn poll_job(
        &self,
        endpoint: &EndpointAddress,
        token: &WorkerToken,
    ) -> AppResult<Option<JobReference>> {
        let url = endpoint.resource_url(&["random_job"])?;
        let response = self
            .send(self.http_client.get(url), token, "job poll")
            .await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(reject_status(response, "job poll").await);
        }

        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty());

        match location {
            Some(location) if status.is_redirection() => JobReference::new(location).map(Some),
            _ => Ok(None),
        }
    }

    async fn download_archive(
        &self,
        endpoint: &EndpointAddress,
        token: &WorkerToken,
        job: &JobReference,
    ) -> AppResult<Vec<u8>> {
        let url = endpoint.job_url(job, &[workspace_files::ARCHIVE])?;
        let response = self
            .send(self.http_client.get(url), token, "archive download")
            .await?;

        if !response.status().is_success() {
            return Err(reject_status(response, "archive download").await);
        }

        response
            .bytes()
            .await
            .map(|bytes| bytes.to_vec())
            .map_err(|error| AppError::Transport(format!("failed to read job archive: {error}")))
    }

    async fn upload_binary_file(
        &self,
        endpoint: &EndpointAddress,
        token: &WorkerToken,
        job: &JobReference,
        file_name: &str,
        contents: Vec<u8>,
    ) -> AppResult<()> {
        let url = endpoint.job_url(job, &["binaryfiles", file_name])?;
        let builder = self
            .upload_client
            .post(url)
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .body(contents);
        let response = self.send(builder, token, "binary file upload").await?;

        require_success(response, "binary file upload").await
    }

    async fn submit_results(
        &self,
        endpoint: &EndpointAddress,
        token: &WorkerToken,
        job: &JobReference,
        submission: &ResultSubmission,
    ) -> AppResult<()> {
        let url = endpoint.job_url(job, &["results"])?;
        let response = self
            .send(self.http_client.put(url).json(submission), token, "result submission")
            .await?;

        require_success(response, "result submission").await
    }

    async fn submit_error(
        &self,
        endpoint: &EndpointAddress,
        token: &WorkerToken,
        job: &JobReference,
        submission: &ErrorSubmission,
    ) -> AppResult<()> {
        let url = endpoint.job_url(job, &["error"])?;
        let response = self
            .send(self.http_client.put(url).json(submission), token, "error submission")
            .await?;

        require_success(response, "error submission").await
    }
}

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;

use async_trait::async_trait;
use tokio::sync::Mutex;

use outpost_core::{AppError, AppResult};
use outpost_domain::{
    EndpointAddress, ErrorSubmission, JobReference, RegistrationRequest, RegistrationResponse,
    ResultSubmission, WorkerToken,
};

use crate::ports::{
    ArchiveExtractor, CoordinatorClient, ScriptExit, ScriptInvocation, ScriptRunner,
    TempDirPurger,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Rejection {
    Unauthorized,
    Transport,
    Protocol,
}

impl Rejection {
    fn into_error(self, action: &str) -> AppError {
        match self {
            Self::Unauthorized => AppError::Unauthorized(format!("{action} answered 401")),
            Self::Transport => AppError::Transport(format!("{action} connection refused")),
            Self::Protocol => AppError::Protocol(format!("{action} answered 500")),
        }
    }
}

#[derive(Default)]
pub(crate) struct FakeCoordinator {
    pub(crate) tokens_to_issue: Mutex<VecDeque<String>>,
    pub(crate) reject_registration: Mutex<Option<Rejection>>,
    pub(crate) registrations: Mutex<Vec<(EndpointAddress, Vec<String>)>>,
    pub(crate) pending_jobs: Mutex<HashMap<EndpointAddress, VecDeque<String>>>,
    pub(crate) poll_rejections: Mutex<HashMap<EndpointAddress, VecDeque<Rejection>>>,
    pub(crate) request_tokens: Mutex<Vec<(String, EndpointAddress, String)>>,
    pub(crate) failing_uploads: Mutex<HashSet<String>>,
    pub(crate) uploads: Mutex<Vec<(String, Vec<u8>)>>,
    pub(crate) submission_rejection: Mutex<Option<Rejection>>,
    pub(crate) results: Mutex<Vec<(JobReference, ResultSubmission)>>,
    pub(crate) errors: Mutex<Vec<(JobReference, ErrorSubmission)>>,
}

impl FakeCoordinator {
    pub(crate) async fn issue_tokens<const N: usize>(&self, tokens: [&str; N]) {
        self.tokens_to_issue
            .lock()
            .await
            .extend(tokens.iter().map(|token| (*token).to_owned()));
    }

    pub(crate) async fn enqueue_job(&self, endpoint: &EndpointAddress, location: &str) {
        self.pending_jobs
            .lock()
            .await
            .entry(endpoint.clone())
            .or_default()
            .push_back(location.to_owned());
    }

    pub(crate) async fn reject_next_poll(&self, endpoint: &EndpointAddress, rejection: Rejection) {
        self.poll_rejections
            .lock()
            .await
            .entry(endpoint.clone())
            .or_default()
            .push_back(rejection);
    }

    pub(crate) async fn tokens_used(&self, action: &str, endpoint: &EndpointAddress) -> Vec<String> {
        self.request_tokens
            .lock()
            .await
            .iter()
            .filter(|(recorded_action, recorded_endpoint, _)| {
                recorded_action == action && recorded_endpoint == endpoint
            })
            .map(|(_, _, token)| token.clone())
            .collect()
    }

    async fn record(&self, action: &str, endpoint: &EndpointAddress, token: &WorkerToken) {
        self.request_tokens.lock().await.push((
            action.to_owned(),
            endpoint.clone(),
            token.as_str().to_owned(),
        ));
    }
}

#[async_trait]
impl CoordinatorClient for FakeCoordinator {
    async fn register_worker(
        &self,
        endpoint: &EndpointAddress,
        token: &WorkerToken,
        request: &RegistrationRequest,
    ) -> AppResult<RegistrationResponse> {
        self.record("register", endpoint, token).await;
        if let Some(rejection) = *self.reject_registration.lock().await {
            return Err(rejection.into_error("registration"));
        }

        self.registrations
            .lock()
            .await
            .push((endpoint.clone(), request.capabilities.clone()));
        let token = self
            .tokens_to_issue
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| "default-token".to_owned());
        Ok(RegistrationResponse { token })
    }

    async fn poll_job(
        &self,
        endpoint: &EndpointAddress,
        token: &WorkerToken,
    ) -> AppResult<Option<JobReference>> {
        self.record("poll", endpoint, token).await;
        if let Some(rejection) = self
            .poll_rejections
            .lock()
            .await
            .get_mut(endpoint)
            .and_then(VecDeque::pop_front)
        {
            return Err(rejection.into_error("poll"));
        }

        let location = self
            .pending_jobs
            .lock()
            .await
            .get_mut(endpoint)
            .and_then(VecDeque::pop_front);
        location.map(JobReference::new).transpose()
    }

    async fn download_archive(
        &self,
        endpoint: &EndpointAddress,
        token: &WorkerToken,
        _job: &JobReference,
    ) -> AppResult<Vec<u8>> {
        self.record("download", endpoint, token).await;
        Ok(b"archive".to_vec())
    }

    async fn upload_binary_file(
        &self,
        endpoint: &EndpointAddress,
        token: &WorkerToken,
        _job: &JobReference,
        file_name: &str,
        contents: Vec<u8>,
    ) -> AppResult<()> {
        self.record("upload", endpoint, token).await;
        if self.failing_uploads.lock().await.contains(file_name) {
            return Err(AppError::Protocol(format!("upload of {file_name} answered 500")));
        }
        self.uploads
            .lock()
            .await
            .push((file_name.to_owned(), contents));
        Ok(())
    }

    async fn submit_results(
        &self,
        endpoint: &EndpointAddress,
        token: &WorkerToken,
        job: &JobReference,
        submission: &ResultSubmission,
    ) -> AppResult<()> {
        self.record("results", endpoint, token).await;
        self.results
            .lock()
            .await
            .push((job.clone(), submission.clone()));
        match *self.submission_rejection.lock().await {
            Some(rejection) => Err(rejection.into_error("results")),
            None => Ok(()),
        }
    }

    async fn submit_error(
        &self,
        endpoint: &EndpointAddress,
        token: &WorkerToken,
        job: &JobReference,
        submission: &ErrorSubmission,
    ) -> AppResult<()> {
        self.record("error", endpoint, token).await;
        self.errors
            .lock()
            .await
            .push((job.clone(), submission.clone()));
        match *self.submission_rejection.lock().await {
            Some(rejection) => Err(rejection.into_error("error")),
            None => Ok(()),
        }
    }
}

/// Writes a fixed set of files instead of unpacking a real archive.
#[derive(Default)]
pub(crate) struct FakeExtractor {
    pub(crate) files: Mutex<Vec<(String, Vec<u8>)>>,
    pub(crate) fail: Mutex<bool>,
}

impl FakeExtractor {
    pub(crate) async fn with_file(&self, name: &str, contents: &str) {
        self.files
            .lock()
            .await
            .push((name.to_owned(), contents.as_bytes().to_vec()));
    }
}

#[async_trait]
impl ArchiveExtractor for FakeExtractor {
    async fn extract(&self, _archive: Vec<u8>, destination: &Path) -> AppResult<()> {
        if *self.fail.lock().await {
            return Err(AppError::Validation("invalid job archive".to_owned()));
        }
        for (name, contents) in self.files.lock().await.iter() {
            tokio::fs::write(destination.join(name), contents)
                .await
                .map_err(|error| AppError::Io(error.to_string()))?;
        }
        Ok(())
    }
}

/// Scripted runner: appends a line to the log and writes configured outputs.
#[derive(Default)]
pub(crate) struct FakeScriptRunner {
    pub(crate) exits: Mutex<HashMap<String, ScriptExit>>,
    pub(crate) outputs: Mutex<HashMap<String, Vec<(String, String)>>>,
    pub(crate) invocations: Mutex<Vec<ScriptInvocation>>,
}

impl FakeScriptRunner {
    pub(crate) async fn exit_with(&self, script: &str, exit: ScriptExit) {
        self.exits.lock().await.insert(script.to_owned(), exit);
    }

    pub(crate) async fn writes(&self, script: &str, file: &str, contents: &str) {
        self.outputs
            .lock()
            .await
            .entry(script.to_owned())
            .or_default()
            .push((file.to_owned(), contents.to_owned()));
    }

    pub(crate) async fn runs_of(&self, script: &str) -> usize {
        self.invocations
            .lock()
            .await
            .iter()
            .filter(|invocation| invocation.script.to_str() == Some(script))
            .count()
    }
}

#[async_trait]
impl ScriptRunner for FakeScriptRunner {
    async fn run_script(&self, invocation: ScriptInvocation) -> AppResult<ScriptExit> {
        let script = invocation.script.to_string_lossy().into_owned();
        let mut log = tokio::fs::read(&invocation.log_path)
            .await
            .unwrap_or_default();
        log.extend_from_slice(format!("ran {script}\n").as_bytes());
        tokio::fs::write(&invocation.log_path, log)
            .await
            .map_err(|error| AppError::Io(error.to_string()))?;

        if let Some(outputs) = self.outputs.lock().await.get(&script) {
            for (file, contents) in outputs {
                tokio::fs::write(invocation.working_dir.join(file), contents)
                    .await
                    .map_err(|error| AppError::Io(error.to_string()))?;
            }
        }

        let exit = self
            .exits
            .lock()
            .await
            .get(&script)
            .copied()
            .unwrap_or(ScriptExit::Code(0));
        self.invocations.lock().await.push(invocation);
        Ok(exit)
    }
}

#[derive(Default)]
pub(crate) struct FakeTempDirPurger {
    pub(crate) purges: Mutex<usize>,
}

#[async_trait]
impl TempDirPurger for FakeTempDirPurger {
    async fn purge(&self) -> AppResult<()> {
        *self.purges.lock().await += 1;
        Ok(())
    }
}

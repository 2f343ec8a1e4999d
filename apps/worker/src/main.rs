//! Outpost worker runtime.

#![forbid(unsafe_code)]

mod supervisor;
mod worker_config;

use std::sync::Arc;

use outpost_application::{
    ExecutionSettings, JobExecutor, PollLoop, PollLoopSettings, Registrar, StopReason,
};
use outpost_core::AppError;
use outpost_infrastructure::{
    FsTempDirPurger, HttpCoordinatorClient, TokioScriptRunner, ZipArchiveExtractor,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::worker_config::WorkerConfig;

/// Exit status signalling that the worker stopped because it found no work.
const IDLE_EXIT_CODE: i32 = 1;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = WorkerConfig::load()?;

    if config.worker_instances > 1 {
        info!(
            instances = config.worker_instances,
            "starting worker instances in separate processes"
        );
        return supervisor::run_instances(config.worker_instances).await;
    }

    let mut poll_loop = build_poll_loop(&config)?;

    let endpoints: Vec<String> = config.endpoints.iter().map(ToString::to_string).collect();
    info!(
        endpoints = ?endpoints,
        capabilities = ?config.capabilities.as_slice(),
        idle_limit = ?config.idle_limit,
        job_timeout_seconds = config.job_timeout.as_secs(),
        clear_temp_dir = config.clear_temp_dir,
        temp_dir = %config.temp_dir.display(),
        workspace_root = %config.workspace_root.display(),
        interpreter = %config.interpreter,
        "outpost-worker started"
    );
    if endpoints.is_empty() {
        warn!("no coordinator endpoints configured, worker will idle until its limit");
    }

    let StopReason::IdleTimeout { idle_for } = poll_loop.run().await;
    warn!(
        idle_seconds = idle_for.as_secs(),
        "no job found within the idle limit, exiting"
    );
    std::process::exit(IDLE_EXIT_CODE);
}

fn build_poll_loop(config: &WorkerConfig) -> Result<PollLoop, AppError> {
    let client = Arc::new(HttpCoordinatorClient::new(config.connect_timeout)?);
    let executor = JobExecutor::new(
        client.clone(),
        Arc::new(ZipArchiveExtractor::new()),
        Arc::new(TokioScriptRunner::new()),
        ExecutionSettings {
            workspace_root: config.workspace_root.clone(),
            interpreter: config.interpreter.clone(),
            default_timeout: config.job_timeout,
            clear_temp_dir: config.clear_temp_dir,
        },
    )
    .with_temp_dir_purger(Arc::new(FsTempDirPurger::new(config.temp_dir.clone())));

    Ok(PollLoop::new(
        client.clone(),
        Registrar::new(client, config.capabilities.clone()),
        executor,
        PollLoopSettings {
            endpoints: config.endpoints.clone(),
            idle_limit: config.idle_limit,
            idle_poll_interval: config.idle_poll_interval,
            failure_backoff: config.failure_backoff,
        },
    ))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

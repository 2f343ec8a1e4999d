use std::sync::Arc;
use std::time::Duration;

use outpost_core::{AppError, AppResult};
use outpost_domain::{EndpointAddress, IdleLimit, JobReference};
use tracing::{debug, info, warn};

use crate::install_cache::InstallCache;
use crate::job_executor::JobExecutor;
use crate::ports::CoordinatorClient;
use crate::registrar::Registrar;
use crate::result_reporter::ResultReporter;
use crate::token_store::TokenStore;

mod idle_clock;

pub use idle_clock::IdleClock;

/// Poll loop configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollLoopSettings {
    /// Coordinators in polling order.
    pub endpoints: Vec<EndpointAddress>,
    /// Self-termination policy.
    pub idle_limit: IdleLimit,
    /// Sleep after a cycle in which no endpoint had work.
    pub idle_poll_interval: Duration,
    /// Sleep after a transport failure.
    pub failure_backoff: Duration,
}

/// Result of one poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// At least one job was dispatched; the idle clock was reset.
    JobsDispatched(usize),
    /// No endpoint had work; the loop slept the idle interval.
    Idle,
    /// A coordinator was unreachable; the loop slept the failure backoff.
    TransportFailure,
}

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// No job was found for longer than the idle limit.
    IdleTimeout {
        /// Time since the last job, or since start.
        idle_for: Duration,
    },
}

/// Top-level driver: poll, execute, report, and self-terminate when idle.
pub struct PollLoop {
    client: Arc<dyn CoordinatorClient>,
    registrar: Registrar,
    executor: JobExecutor,
    reporter: ResultReporter,
    settings: PollLoopSettings,
    tokens: TokenStore,
    install_cache: InstallCache,
    idle_clock: IdleClock,
}

impl PollLoop {
    /// Creates a poll loop with fresh per-process state.
    #[must_use]
    pub fn new(
        client: Arc<dyn CoordinatorClient>,
        registrar: Registrar,
        executor: JobExecutor,
        settings: PollLoopSettings,
    ) -> Self {
        let reporter = ResultReporter::new(client.clone());
        Self {
            client,
            registrar,
            executor,
            reporter,
            settings,
            tokens: TokenStore::new(),
            install_cache: InstallCache::new(),
            idle_clock: IdleClock::start(),
        }
    }

    /// Returns the token store.
    #[must_use]
    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Returns the install cache.
    #[must_use]
    pub fn install_cache(&self) -> &InstallCache {
        &self.install_cache
    }

    /// Returns the idle clock.
    #[must_use]
    pub fn idle_clock(&self) -> &IdleClock {
        &self.idle_clock
    }

    /// Registers against every endpoint, logging failures without aborting.
    pub async fn register_all(&mut self) {
        for endpoint in &self.settings.endpoints {
            if let Err(error) = self.registrar.register(endpoint, &mut self.tokens).await {
                warn!(endpoint = %endpoint, error = %error, "could not register as worker");
            }
        }
    }

    /// Registers, then polls until the idle limit is exceeded.
    pub async fn run(&mut self) -> StopReason {
        self.register_all().await;

        loop {
            if let Some(stop) = self.check_idle() {
                return stop;
            }
            self.run_cycle().await;
        }
    }

    /// Returns a stop reason once the idle limit is exceeded.
    #[must_use]
    pub fn check_idle(&self) -> Option<StopReason> {
        let idle_for = self.idle_clock.idle_for();
        debug!(
            idle_limit = ?self.settings.idle_limit,
            idle_seconds = idle_for.as_secs_f64(),
            remaining = ?self.settings.idle_limit.remaining(idle_for),
            "idle check"
        );

        if self.settings.idle_limit.is_exceeded(idle_for) {
            warn!(
                idle_limit = ?self.settings.idle_limit,
                idle_seconds = idle_for.as_secs_f64(),
                "max idle time exceeded"
            );
            return Some(StopReason::IdleTimeout { idle_for });
        }

        None
    }

    /// Polls every endpoint once in configured order.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        let endpoints = self.settings.endpoints.clone();
        let mut jobs_dispatched = 0_usize;

        for endpoint in &endpoints {
            let token = self.tokens.get(endpoint);
            let job = match self.client.poll_job(endpoint, &token).await {
                Ok(Some(job)) => job,
                Ok(None) => {
                    info!(endpoint = %endpoint, "no pending job at this time");
                    continue;
                }
                Err(error) => {
                    match self.recover(endpoint, error, jobs_dispatched).await {
                        Some(outcome) => return outcome,
                        None => continue,
                    }
                }
            };

            info!(endpoint = %endpoint, job = %job, "pending job found");

            match self.dispatch(endpoint, &job).await {
                Ok(true) => jobs_dispatched = jobs_dispatched.saturating_add(1),
                Ok(false) => {}
                Err(error) => {
                    if let Some(outcome) = self.recover(endpoint, error, jobs_dispatched).await {
                        return outcome;
                    }
                }
            }
        }

        if jobs_dispatched > 0 {
            self.idle_clock.reset();
            return CycleOutcome::JobsDispatched(jobs_dispatched);
        }

        tokio::time::sleep(self.settings.idle_poll_interval).await;
        CycleOutcome::Idle
    }

    /// Executes and reports one job.
    ///
    /// Returns false when the job could not be fetched or unpacked; the
    /// failure is reported as the job's error and the job does not count
    /// as dispatched.
    async fn dispatch(&mut self, endpoint: &EndpointAddress, job: &JobReference) -> AppResult<bool> {
        let token = self.tokens.get(endpoint);
        let executed = match self
            .executor
            .execute(endpoint, &token, job, &mut self.install_cache)
            .await
        {
            Ok(executed) => executed,
            Err(error) if error.is_not_registered() || error.is_transport() => return Err(error),
            Err(error) => {
                self.reporter
                    .report_aborted(endpoint, &token, job, &error)
                    .await?;
                return Ok(false);
            }
        };

        let reported = self
            .reporter
            .report(endpoint, &token, job, &executed.workspace, executed.outcome)
            .await;
        self.executor.cleanup(executed.workspace).await;
        reported.map(|()| true)
    }

    /// Handles a failed step; returns an outcome when the cycle must end.
    async fn recover(
        &mut self,
        endpoint: &EndpointAddress,
        error: AppError,
        jobs_dispatched: usize,
    ) -> Option<CycleOutcome> {
        if error.is_not_registered() {
            warn!(endpoint = %endpoint, "worker not registered, registering again");
            let registered = self.registrar.register(endpoint, &mut self.tokens).await;
            return match registered {
                Ok(_) => None,
                Err(error) if error.is_transport() => {
                    Some(self.back_off(endpoint, &error, jobs_dispatched).await)
                }
                Err(error) => {
                    warn!(endpoint = %endpoint, error = %error, "could not register as worker");
                    None
                }
            };
        }

        if error.is_transport() {
            return Some(self.back_off(endpoint, &error, jobs_dispatched).await);
        }

        warn!(endpoint = %endpoint, error = %error, "job attempt aborted");
        None
    }

    async fn back_off(
        &mut self,
        endpoint: &EndpointAddress,
        error: &AppError,
        jobs_dispatched: usize,
    ) -> CycleOutcome {
        warn!(
            endpoint = %endpoint,
            error = %error,
            backoff_seconds = self.settings.failure_backoff.as_secs_f64(),
            "coordinator not responding, backing off"
        );
        if jobs_dispatched > 0 {
            self.idle_clock.reset();
        }
        tokio::time::sleep(self.settings.failure_backoff).await;
        CycleOutcome::TransportFailure
    }
}

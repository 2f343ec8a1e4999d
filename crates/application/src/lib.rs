//! Job execution lifecycle: registration, polling, execution, and reporting.

#![forbid(unsafe_code)]

mod install_cache;
mod job_executor;
mod job_log;
mod poll_loop;
mod ports;
mod registrar;
mod result_reporter;
mod token_store;
mod workspace;

#[cfg(test)]
mod test_fakes;

pub use install_cache::InstallCache;
pub use job_executor::{CollectedResults, ExecutedJob, ExecutionSettings, JobExecutor, JobOutcome};
pub use job_log::JobLog;
pub use poll_loop::{CycleOutcome, IdleClock, PollLoop, PollLoopSettings, StopReason};
pub use ports::{
    ArchiveExtractor, CoordinatorClient, ScriptExit, ScriptInvocation, ScriptRunner,
    TempDirPurger,
};
pub use registrar::Registrar;
pub use result_reporter::ResultReporter;
pub use token_store::TokenStore;
pub use workspace::{OptionalRead, Workspace};

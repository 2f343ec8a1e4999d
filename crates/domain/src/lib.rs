//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod endpoint;
mod idle;
mod job;
mod worker;

/// File names that make up a job workspace.
pub mod workspace_files;

pub use endpoint::EndpointAddress;
pub use idle::IdleLimit;
pub use job::{ErrorSubmission, JobReference, JobSettings, ResultSubmission};
pub use worker::{Capabilities, RegistrationRequest, RegistrationResponse, WorkerToken};

//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod fs_temp_dir_purger;
mod http_coordinator_client;
mod tokio_script_runner;
mod zip_archive_extractor;

#[cfg(test)]
mod test_server;

pub use fs_temp_dir_purger::FsTempDirPurger;
pub use http_coordinator_client::HttpCoordinatorClient;
pub use tokio_script_runner::TokioScriptRunner;
pub use zip_archive_extractor::ZipArchiveExtractor;

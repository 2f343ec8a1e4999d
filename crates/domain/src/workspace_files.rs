/// Archive resource fetched below a job reference.
pub const ARCHIVE: &str = "experiment.zip";

/// Optional one-time installation script.
pub const INSTALL_SCRIPT: &str = "install.py";

/// The job's main script.
pub const RUN_SCRIPT: &str = "experiment.py";

/// Optional per-job settings (`{"timeout": <minutes>}`).
pub const JOB_SETTINGS: &str = "config.json";

/// Combined stdout/stderr of both phases, created by the worker.
pub const LOG: &str = "log.txt";

/// Optional manifest of binary artifacts, one file name per line.
pub const BINARY_MANIFEST: &str = "binary_files.txt";

/// Structured result records written by the job.
pub const RESULTS: &str = "result.json";

/// Log messages written by the job.
pub const MESSAGES: &str = "messages.json";

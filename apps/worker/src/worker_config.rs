use std::env;
use std::path::PathBuf;
use std::time::Duration;

use outpost_core::{AppError, AppResult};
use outpost_domain::{Capabilities, EndpointAddress, IdleLimit};

const DEFAULT_PRIMARY_ENDPOINT: &str = "localhost:63658";

/// Runtime configuration of one worker process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    pub endpoints: Vec<EndpointAddress>,
    pub capabilities: Capabilities,
    pub idle_limit: IdleLimit,
    pub job_timeout: Duration,
    pub clear_temp_dir: bool,
    pub temp_dir: PathBuf,
    pub worker_instances: usize,
    pub workspace_root: PathBuf,
    pub interpreter: String,
    pub idle_poll_interval: Duration,
    pub failure_backoff: Duration,
    pub connect_timeout: Duration,
}

impl WorkerConfig {
    pub fn load() -> AppResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let primary = lookup("OUTPOST_PRIMARY_ENDPOINT")
            .unwrap_or_else(|| DEFAULT_PRIMARY_ENDPOINT.to_owned());
        let secondary = lookup("OUTPOST_SECONDARY_ENDPOINT").unwrap_or_default();
        let endpoints = [primary, secondary]
            .iter()
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
            .map(EndpointAddress::parse)
            .collect::<AppResult<Vec<_>>>()?;

        let capabilities =
            Capabilities::parse_list(lookup("OUTPOST_CAPABILITIES").unwrap_or_default().as_str());
        let idle_limit =
            IdleLimit::from_seconds(parse_env(&lookup, "OUTPOST_MAX_IDLE_SECONDS", 3600_i64)?)?;
        let job_timeout_seconds = parse_env(&lookup, "OUTPOST_JOB_TIMEOUT_SECONDS", 600_u64)?;
        let clear_temp_dir = parse_env_bool(&lookup, "OUTPOST_CLEAR_TEMP_DIR", false)?;
        let temp_dir = lookup("OUTPOST_TEMP_DIR")
            .filter(|value| !value.trim().is_empty())
            .map_or_else(env::temp_dir, PathBuf::from);
        let worker_instances = parse_env(&lookup, "OUTPOST_WORKER_INSTANCES", 1_usize)?;
        let workspace_root = lookup("OUTPOST_WORKSPACE_ROOT")
            .filter(|value| !value.trim().is_empty())
            .map_or_else(|| PathBuf::from("."), PathBuf::from);
        let interpreter = lookup("OUTPOST_INTERPRETER")
            .map(|value| value.trim().to_owned())
            .unwrap_or_else(|| "python3".to_owned());
        let idle_poll_interval_ms = parse_env(&lookup, "OUTPOST_IDLE_POLL_INTERVAL_MS", 10_000_u64)?;
        let failure_backoff_ms = parse_env(&lookup, "OUTPOST_FAILURE_BACKOFF_MS", 120_000_u64)?;
        let connect_timeout_seconds = parse_env(&lookup, "OUTPOST_CONNECT_TIMEOUT_SECONDS", 15_u64)?;

        if job_timeout_seconds == 0 {
            return Err(AppError::Validation(
                "OUTPOST_JOB_TIMEOUT_SECONDS must be greater than zero".to_owned(),
            ));
        }

        if worker_instances == 0 {
            return Err(AppError::Validation(
                "OUTPOST_WORKER_INSTANCES must be greater than zero".to_owned(),
            ));
        }

        if interpreter.is_empty() {
            return Err(AppError::Validation(
                "OUTPOST_INTERPRETER must not be empty".to_owned(),
            ));
        }

        if connect_timeout_seconds == 0 {
            return Err(AppError::Validation(
                "OUTPOST_CONNECT_TIMEOUT_SECONDS must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            endpoints,
            capabilities,
            idle_limit,
            job_timeout: Duration::from_secs(job_timeout_seconds),
            clear_temp_dir,
            temp_dir,
            worker_instances,
            workspace_root,
            interpreter,
            idle_poll_interval: Duration::from_millis(idle_poll_interval_ms),
            failure_backoff: Duration::from_millis(failure_backoff_ms),
            connect_timeout: Duration::from_secs(connect_timeout_seconds),
        })
    }
}

fn parse_env<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> AppResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name).filter(|value| !value.trim().is_empty()) {
        Some(value) => value.trim().parse::<T>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        None => Ok(default),
    }
}

fn parse_env_bool(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: bool,
) -> AppResult<bool> {
    let Some(value) = lookup(name).filter(|value| !value.trim().is_empty()) else {
        return Ok(default);
    };

    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(AppError::Validation(format!(
            "invalid {name} value '{value}': expected true or false"
        ))),
    }
}

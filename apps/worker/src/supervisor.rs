use std::env;

use outpost_core::{AppError, AppResult};
use tokio::process::Command;
use tracing::{info, warn};

const WORKER_INSTANCES_VAR: &str = "OUTPOST_WORKER_INSTANCES";

/// Starts `instances` copies of this binary as single workers and waits for all.
///
/// Children inherit the environment and arguments of this process.
pub async fn run_instances(instances: usize) -> AppResult<()> {
    let program = env::current_exe().map_err(|error| {
        AppError::Io(format!("failed to resolve worker executable: {error}"))
    })?;

    let mut children = Vec::with_capacity(instances);
    for instance in 1..=instances {
        let spawned = Command::new(&program)
            .args(env::args_os().skip(1))
            .env(WORKER_INSTANCES_VAR, "1")
            .spawn();
        match spawned {
            Ok(child) => {
                info!(instance, pid = ?child.id(), "worker instance started");
                children.push((instance, child));
            }
            Err(error) => {
                warn!(instance, error = %error, "failed to start worker instance");
            }
        }
    }

    if children.is_empty() {
        return Err(AppError::Io(format!(
            "none of the {instances} worker instances could be started"
        )));
    }

    for (instance, mut child) in children {
        match child.wait().await {
            Ok(status) => info!(instance, status = %status, "worker instance exited"),
            Err(error) => warn!(instance, error = %error, "failed to wait for worker instance"),
        }
    }

    info!("all worker instances exited");
    Ok(())
}

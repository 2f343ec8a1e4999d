use super::*;

impl JobExecutor {
    /// Runs the install script unless its content was installed before.
    ///
    /// Returns false when installation was attempted and failed.
    pub(super) async fn install(
        &self,
        job: &JobReference,
        workspace: &Workspace,
        timeout: Duration,
        install_cache: &mut InstallCache,
        annotations: &mut Vec<String>,
    ) -> bool {
        let script = match workspace.read_if_exists(workspace_files::INSTALL_SCRIPT).await {
            Ok(Some(script)) => script,
            Ok(None) => return true,
            Err(error) => {
                warn!(job = %job, error = %error, "install script unreadable");
                annotations.push("Error during installation.".to_owned());
                return false;
            }
        };

        if install_cache.seen(&script) {
            info!(job = %job, "install script already executed, skipping installation");
            return true;
        }

        info!(job = %job, "installing");
        let exit = self
            .run_phase(workspace, workspace_files::INSTALL_SCRIPT, timeout, annotations)
            .await;
        if exit.is_success() {
            return true;
        }

        install_cache.forget(&script);
        annotations.push("Error during installation.".to_owned());
        false
    }

    /// Runs one script and records timeout or start failures as annotations.
    pub(super) async fn run_phase(
        &self,
        workspace: &Workspace,
        script: &str,
        timeout: Duration,
        annotations: &mut Vec<String>,
    ) -> ScriptExit {
        let invocation = ScriptInvocation {
            program: self.settings.interpreter.clone(),
            script: PathBuf::from(script),
            working_dir: workspace.root().to_path_buf(),
            log_path: workspace.path(workspace_files::LOG),
            timeout,
        };

        match self.runner.run_script(invocation).await {
            Ok(ScriptExit::TimedOut) => {
                warn!(script, timeout_seconds = timeout.as_secs_f64(), "timeout expired");
                annotations.push(timeout_note(timeout));
                ScriptExit::TimedOut
            }
            Ok(exit) => {
                debug!(script, exit = ?exit, "script finished");
                exit
            }
            Err(error) => {
                warn!(script, error = %error, "failed to start script");
                annotations.push(format!("Could not start {script}: {error}"));
                ScriptExit::Code(1)
            }
        }
    }

    pub(super) async fn collect(&self, workspace: &Workspace, mut log: JobLog) -> CollectedResults {
        let manifest = workspace.read_binary_manifest().await;
        if manifest.is_absent() {
            info!("no binary files listed");
            log.annotate("No binary files sent to server");
        }

        let records = workspace.read_json_list(workspace_files::RESULTS).await;
        if let Some(reason) = &records.absence {
            log.annotate(format!(
                "{reason}. The job probably never reached its completion call."
            ));
        }

        let messages = workspace.read_json_list(workspace_files::MESSAGES).await;
        if let Some(reason) = &messages.absence {
            debug!(reason = %reason, "no job messages");
        }

        CollectedResults {
            log,
            records: records.value,
            messages: messages.value,
            binary_files: manifest.value,
        }
    }
}

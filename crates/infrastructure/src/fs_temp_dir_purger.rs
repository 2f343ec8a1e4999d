use std::path::PathBuf;

use async_trait::async_trait;
use outpost_application::TempDirPurger;
use outpost_core::{AppError, AppResult};

/// Removes every entry inside a temporary directory, keeping the directory.
///
/// Entries that cannot be removed are logged and skipped; other processes
/// may still hold them open.
#[derive(Debug, Clone)]
pub struct FsTempDirPurger {
    dir: PathBuf,
}

impl FsTempDirPurger {
    /// Creates a purger for `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl TempDirPurger for FsTempDirPurger {
    async fn purge(&self) -> AppResult<()> {
        let mut entries = tokio::fs::read_dir(&self.dir).await.map_err(|error| {
            AppError::Io(format!(
                "failed to list temporary directory '{}': {error}",
                self.dir.display()
            ))
        })?;

        let mut removed = 0_usize;
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(error) => {
                    tracing::warn!(dir = %self.dir.display(), error = %error, "stopped listing temporary directory");
                    break;
                }
            };

            let path = entry.path();
            let is_dir = entry
                .file_type()
                .await
                .map(|file_type| file_type.is_dir())
                .unwrap_or(false);
            let outcome = if is_dir {
                tokio::fs::remove_dir_all(&path).await
            } else {
                tokio::fs::remove_file(&path).await
            };

            match outcome {
                Ok(()) => removed += 1,
                Err(error) => {
                    tracing::warn!(path = %path.display(), error = %error, "could not remove temporary entry");
                }
            }
        }

        tracing::debug!(dir = %self.dir.display(), removed, "purged temporary directory");
        Ok(())
    }
}

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use outpost_core::{AppError, AppResult};
use outpost_domain::{JobReference, workspace_files};
use serde_json::Value;
use uuid::Uuid;

/// Value of an optional workspace file, with a note when it was unusable.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionalRead<T> {
    /// File content, or the default when the file was absent or invalid.
    pub value: T,
    /// Why the default was used; `None` when the file was read.
    pub absence: Option<String>,
}

impl<T> OptionalRead<T> {
    fn present(value: T) -> Self {
        Self {
            value,
            absence: None,
        }
    }

    fn absent(value: T, reason: impl Into<String>) -> Self {
        Self {
            value,
            absence: Some(reason.into()),
        }
    }

    /// Returns true when the default value was substituted.
    #[must_use]
    pub fn is_absent(&self) -> bool {
        self.absence.is_some()
    }
}

/// Directory scoped to exactly one job attempt.
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Creates a fresh, uniquely named workspace below `parent`.
    pub async fn create(parent: &Path, job: &JobReference) -> AppResult<Self> {
        let suffix = Uuid::new_v4().simple().to_string();
        let root = parent.join(job.workspace_dir_name(&suffix[..12]));

        tokio::fs::create_dir_all(&root).await.map_err(|error| {
            AppError::Io(format!(
                "failed to create workspace '{}': {error}",
                root.display()
            ))
        })?;

        Ok(Self { root })
    }

    /// Returns the workspace directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        self.root.as_path()
    }

    /// Returns the path of a file inside the workspace.
    #[must_use]
    pub fn path(&self, file_name: &str) -> PathBuf {
        self.root.join(file_name)
    }

    /// Reads a workspace file, returning `None` when it does not exist.
    pub async fn read_if_exists(&self, file_name: &str) -> AppResult<Option<Vec<u8>>> {
        match tokio::fs::read(self.path(file_name)).await {
            Ok(contents) => Ok(Some(contents)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(error) => Err(AppError::Io(format!(
                "failed to read '{file_name}' in '{}': {error}",
                self.root.display()
            ))),
        }
    }

    /// Truncates the job log so both phases append to an empty file.
    pub async fn reset_log(&self) -> AppResult<()> {
        tokio::fs::write(self.path(workspace_files::LOG), b"")
            .await
            .map_err(|error| AppError::Io(format!("failed to create job log: {error}")))
    }

    /// Returns the job log as text; invalid UTF-8 is replaced.
    pub async fn read_log(&self) -> String {
        match self.read_if_exists(workspace_files::LOG).await {
            Ok(Some(contents)) => String::from_utf8_lossy(&contents).into_owned(),
            Ok(None) | Err(_) => String::new(),
        }
    }

    /// Reads a JSON array file, defaulting to an empty list.
    pub async fn read_json_list(&self, file_name: &str) -> OptionalRead<Vec<Value>> {
        let contents = match self.read_if_exists(file_name).await {
            Ok(Some(contents)) => contents,
            Ok(None) => return OptionalRead::absent(Vec::new(), format!("{file_name} does not exist")),
            Err(error) => return OptionalRead::absent(Vec::new(), error.to_string()),
        };

        match serde_json::from_slice::<Value>(&contents) {
            Ok(Value::Array(items)) => OptionalRead::present(items),
            Ok(_) => OptionalRead::absent(Vec::new(), format!("{file_name} is not a JSON list")),
            Err(error) => {
                OptionalRead::absent(Vec::new(), format!("{file_name} is not valid JSON: {error}"))
            }
        }
    }

    /// Reads the binary artifact manifest, one file name per line.
    pub async fn read_binary_manifest(&self) -> OptionalRead<Vec<String>> {
        match self.read_if_exists(workspace_files::BINARY_MANIFEST).await {
            Ok(Some(contents)) => OptionalRead::present(
                String::from_utf8_lossy(&contents)
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(ToOwned::to_owned)
                    .collect(),
            ),
            Ok(None) => OptionalRead::absent(
                Vec::new(),
                format!("{} does not exist", workspace_files::BINARY_MANIFEST),
            ),
            Err(error) => OptionalRead::absent(Vec::new(), error.to_string()),
        }
    }

    /// Reads a binary artifact listed in the manifest.
    ///
    /// Names must stay inside the workspace.
    pub async fn read_artifact(&self, file_name: &str) -> AppResult<Vec<u8>> {
        let is_plain_name = Path::new(file_name)
            .components()
            .all(|component| matches!(component, std::path::Component::Normal(_)));
        if !is_plain_name {
            return Err(AppError::Validation(format!(
                "artifact '{file_name}' escapes the workspace"
            )));
        }

        self.read_if_exists(file_name)
            .await?
            .ok_or_else(|| AppError::Io(format!("artifact '{file_name}' does not exist")))
    }

    /// Deletes the workspace directory and everything in it.
    pub async fn remove(self) -> AppResult<()> {
        tokio::fs::remove_dir_all(&self.root).await.map_err(|error| {
            AppError::Io(format!(
                "failed to remove workspace '{}': {error}",
                self.root.display()
            ))
        })
    }
}

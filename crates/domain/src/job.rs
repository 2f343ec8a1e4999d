use std::fmt::{Display, Formatter};
use std::time::Duration;

use outpost_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Coordinator-issued locator of one pending unit of work.
///
/// Taken verbatim from the `Location` header of a poll response and valid
/// for a single execution attempt.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobReference(NonEmptyString);

impl JobReference {
    /// Wraps a job location.
    pub fn new(location: impl Into<String>) -> AppResult<Self> {
        NonEmptyString::new(location).map(Self)
    }

    /// Returns the raw location.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Derives a workspace directory name from the reference plus a unique suffix.
    ///
    /// Every character outside `[A-Za-z0-9_-]` becomes `_`, so the result is a
    /// single path component.
    #[must_use]
    pub fn workspace_dir_name(&self, unique_suffix: &str) -> String {
        let sanitized: String = self
            .as_str()
            .chars()
            .map(|character| {
                if character.is_ascii_alphanumeric() || character == '-' || character == '_' {
                    character
                } else {
                    '_'
                }
            })
            .collect();

        format!("sim{sanitized}-{unique_suffix}")
    }
}

impl Display for JobReference {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Optional per-job settings shipped inside the job archive.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct JobSettings {
    /// Per-phase timeout in minutes.
    #[serde(default)]
    pub timeout: Option<f64>,
}

impl JobSettings {
    /// Parses the settings document.
    pub fn from_json(document: &str) -> AppResult<Self> {
        serde_json::from_str(document)
            .map_err(|error| AppError::Validation(format!("invalid job settings: {error}")))
    }

    /// Returns the configured per-phase timeout, if any.
    pub fn timeout(&self) -> AppResult<Option<Duration>> {
        let Some(minutes) = self.timeout else {
            return Ok(None);
        };

        Duration::try_from_secs_f64(minutes * 60.0)
            .map(Some)
            .map_err(|error| {
                AppError::Validation(format!("invalid job timeout '{minutes}' minutes: {error}"))
            })
    }
}

/// Body of `PUT {job}/results`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResultSubmission {
    /// Combined job log plus worker annotations.
    pub log: String,
    /// Parsed contents of the job's result records.
    pub records: Vec<Value>,
    /// Parsed contents of the job's log messages.
    pub log_messages: Vec<Value>,
}

/// Body of `PUT {job}/error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ErrorSubmission {
    /// Combined job log plus worker annotations.
    pub error_log: String,
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use proptest::prelude::*;
    use serde_json::json;

    use super::{ErrorSubmission, JobReference, JobSettings, ResultSubmission};

    #[test]
    fn workspace_name_replaces_slashes() {
        let job = JobReference::new("/jobs/42").unwrap_or_else(|_| unreachable!());
        assert_eq!(job.workspace_dir_name("abc"), "sim_jobs_42-abc");
    }

    #[test]
    fn settings_timeout_is_converted_from_minutes() {
        let settings = JobSettings::from_json(r#"{"timeout": 2}"#);
        assert!(settings.is_ok());
        let timeout = settings.unwrap_or_default().timeout();
        assert_eq!(timeout.ok().flatten(), Some(Duration::from_secs(120)));
    }

    #[test]
    fn settings_without_timeout_fall_back() {
        let settings = JobSettings::from_json(r#"{"seed": 1}"#).unwrap_or_default();
        assert_eq!(settings.timeout().ok().flatten(), None);
    }

    #[test]
    fn negative_timeout_is_rejected() {
        let settings = JobSettings::from_json(r#"{"timeout": -1}"#).unwrap_or_default();
        assert!(settings.timeout().is_err());
    }

    #[test]
    fn submissions_use_coordinator_field_names() {
        let results = ResultSubmission {
            log: "ok".to_owned(),
            records: vec![json!({"x": 1})],
            log_messages: Vec::new(),
        };
        assert_eq!(
            serde_json::to_value(&results).unwrap_or_default(),
            json!({"Log": "ok", "Records": [{"x": 1}], "LogMessages": []})
        );

        let error = ErrorSubmission {
            error_log: "boom".to_owned(),
        };
        assert_eq!(
            serde_json::to_value(&error).unwrap_or_default(),
            json!({"ErrorLog": "boom"})
        );
    }

    proptest! {
        #[test]
        fn workspace_name_is_single_path_component(location in "\\PC{1,40}", suffix in "[a-f0-9]{8}") {
            prop_assume!(!location.trim().is_empty());
            let job = JobReference::new(location).unwrap_or_else(|_| unreachable!());
            let name = job.workspace_dir_name(suffix.as_str());
            prop_assert!(name.starts_with("sim"));
            prop_assert!(name.ends_with(suffix.as_str()));
            prop_assert!(name
                .chars()
                .all(|character| character.is_ascii_alphanumeric() || character == '-' || character == '_'));
        }
    }
}

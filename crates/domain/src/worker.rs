use std::fmt::{Display, Formatter};

use outpost_core::{AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

const UNAUTHENTICATED_TOKEN: &str = "?";

/// Opaque credential issued by a coordinator on registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkerToken(String);

impl WorkerToken {
    /// Wraps a token returned by a coordinator.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        NonEmptyString::new(value).map(|value| Self(value.into()))
    }

    /// Returns the sentinel sent before any registration succeeded.
    #[must_use]
    pub fn unauthenticated() -> Self {
        Self(UNAUTHENTICATED_TOKEN.to_owned())
    }

    /// Returns true for the unauthenticated sentinel.
    #[must_use]
    pub fn is_unauthenticated(&self) -> bool {
        self.0 == UNAUTHENTICATED_TOKEN
    }

    /// Returns the header value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for WorkerToken {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Ordered, immutable list of what this worker can run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities(Vec<String>);

impl Capabilities {
    /// Creates a capability set, dropping blank entries while keeping order.
    #[must_use]
    pub fn new(values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self(
            values
                .into_iter()
                .map(Into::into)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
                .collect(),
        )
    }

    /// Parses a comma- or whitespace-separated capability list.
    #[must_use]
    pub fn parse_list(value: &str) -> Self {
        Self::new(value.split(|character: char| character == ',' || character.is_whitespace()))
    }

    /// Returns the capabilities in configured order.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        self.0.as_slice()
    }
}

/// Body of `POST /workers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RegistrationRequest {
    /// Capabilities advertised to the coordinator.
    pub capabilities: Vec<String>,
}

impl From<&Capabilities> for RegistrationRequest {
    fn from(value: &Capabilities) -> Self {
        Self {
            capabilities: value.as_slice().to_vec(),
        }
    }
}

/// Body of a `201 Created` answer to `POST /workers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RegistrationResponse {
    /// Token to attach to every later request.
    pub token: String,
}

use std::fmt::{Display, Formatter};

use outpost_core::{AppError, AppResult};
use url::Url;

use crate::JobReference;

/// Address of one coordinator instance.
///
/// Accepts bare `host:port` values and normalises them to `http://`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EndpointAddress(Url);

impl EndpointAddress {
    /// Parses and validates a coordinator address.
    pub fn parse(value: &str) -> AppResult<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "endpoint address must not be empty".to_owned(),
            ));
        }

        let candidate = if trimmed.contains("://") {
            trimmed.to_owned()
        } else {
            format!("http://{trimmed}")
        };

        let url = Url::parse(candidate.as_str()).map_err(|error| {
            AppError::Validation(format!("invalid endpoint address '{trimmed}': {error}"))
        })?;

        if url.host_str().is_none() {
            return Err(AppError::Validation(format!(
                "endpoint address '{trimmed}' has no host"
            )));
        }

        Ok(Self(url))
    }

    /// Builds a URL for a coordinator resource below the endpoint base path.
    pub fn resource_url(&self, segments: &[&str]) -> AppResult<Url> {
        let mut url = self.0.clone();
        push_segments(&mut url, segments)?;
        Ok(url)
    }

    /// Builds a URL for a resource below a job reference.
    ///
    /// The reference is resolved against the endpoint first, so both
    /// path-only and absolute `Location` values work.
    pub fn job_url(&self, job: &JobReference, segments: &[&str]) -> AppResult<Url> {
        let mut url = self.0.join(job.as_str()).map_err(|error| {
            AppError::Protocol(format!(
                "job reference '{}' cannot be resolved against {self}: {error}",
                job.as_str()
            ))
        })?;
        push_segments(&mut url, segments)?;
        Ok(url)
    }
}

fn push_segments(url: &mut Url, segments: &[&str]) -> AppResult<()> {
    let display = url.to_string();
    url.path_segments_mut()
        .map_err(|()| AppError::Validation(format!("'{display}' cannot be a base URL")))?
        .pop_if_empty()
        .extend(segments);
    Ok(())
}

impl Display for EndpointAddress {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0.as_str().trim_end_matches('/'))
    }
}

use std::collections::HashMap;

use outpost_domain::{EndpointAddress, WorkerToken};

/// Latest token per coordinator endpoint.
///
/// Owned by the poll loop; lookups for unknown endpoints yield the
/// unauthenticated sentinel.
#[derive(Debug, Default)]
pub struct TokenStore {
    tokens: HashMap<EndpointAddress, WorkerToken>,
}

impl TokenStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the most recent token for the endpoint.
    #[must_use]
    pub fn get(&self, endpoint: &EndpointAddress) -> WorkerToken {
        self.tokens
            .get(endpoint)
            .cloned()
            .unwrap_or_else(WorkerToken::unauthenticated)
    }

    /// Replaces the token for the endpoint.
    pub fn set(&mut self, endpoint: EndpointAddress, token: WorkerToken) {
        self.tokens.insert(endpoint, token);
    }
}

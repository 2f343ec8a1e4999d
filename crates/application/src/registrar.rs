use std::sync::Arc;

use outpost_core::AppResult;
use outpost_domain::{Capabilities, EndpointAddress, RegistrationRequest, WorkerToken};
use tracing::info;

use crate::ports::CoordinatorClient;
use crate::token_store::TokenStore;

/// Registers the worker against coordinators and records issued tokens.
#[derive(Clone)]
pub struct Registrar {
    client: Arc<dyn CoordinatorClient>,
    capabilities: Capabilities,
}

impl Registrar {
    /// Creates a registrar advertising a fixed capability set.
    #[must_use]
    pub fn new(client: Arc<dyn CoordinatorClient>, capabilities: Capabilities) -> Self {
        Self {
            client,
            capabilities,
        }
    }

    /// Registers against one endpoint and stores the returned token.
    ///
    /// The store is left untouched on failure; retry policy belongs to the caller.
    pub async fn register(
        &self,
        endpoint: &EndpointAddress,
        tokens: &mut TokenStore,
    ) -> AppResult<WorkerToken> {
        let response = self
            .client
            .register_worker(
                endpoint,
                &tokens.get(endpoint),
                &RegistrationRequest::from(&self.capabilities),
            )
            .await?;

        let token = WorkerToken::new(response.token)?;
        tokens.set(endpoint.clone(), token.clone());

        info!(endpoint = %endpoint, token = %token, "registered as worker");
        Ok(token)
    }
}

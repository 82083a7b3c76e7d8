//! Service-related API endpoints

use dtflood_core::dto::service::ServiceDefinition;
use tracing::debug;

use crate::OscarClient;
use crate::error::{ClientError, Result};

impl OscarClient {
    /// Get a deployed service by name
    ///
    /// A missing service surfaces as an error for which
    /// [`ClientError::is_not_found`] holds.
    pub async fn get_service(&self, name: &str) -> Result<ServiceDefinition> {
        debug!("Fetching OSCAR service '{}'", name);
        let response = self
            .get(&format!("/system/services/{}", name))
            .send()
            .await?;

        match self.handle_response(response).await {
            Err(e) if e.is_not_found() => Err(ClientError::NotFound(format!("service '{}'", name))),
            other => other,
        }
    }

    /// Deploy a new service
    ///
    /// The definition must carry its script body, not a path.
    pub async fn create_service(&self, service: &ServiceDefinition) -> Result<()> {
        debug!("Creating OSCAR service '{}'", service.name);
        let response = self.post("/system/services").json(service).send().await?;

        self.handle_empty_response(response).await
    }
}

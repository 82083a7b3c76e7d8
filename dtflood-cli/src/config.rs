//! Configuration module
//!
//! Connection settings shared by all commands, collected from global flags
//! and `DTFLOOD_*` environment variables.

use anyhow::Result;
use dtflood_client::OscarClient;
use dtflood_core::domain::credentials::Credentials;
use dtflood_dispatch::DispatchError;
use tracing::info;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// OSCAR cluster URL
    pub endpoint: Option<String>,

    /// First usable credential among user/password, token, refresh token
    pub credentials: Option<Credentials>,

    /// OIDC token endpoint for refresh token exchange
    pub token_url: String,
}

impl Config {
    pub fn new(
        endpoint: Option<String>,
        user: Option<String>,
        password: Option<String>,
        token: Option<String>,
        refresh_token: Option<String>,
        token_url: String,
    ) -> Self {
        Self {
            endpoint: endpoint.filter(|e| !e.is_empty()),
            credentials: Credentials::from_parts(user, password, token, refresh_token),
            token_url,
        }
    }

    /// Builds an authenticated OSCAR client
    ///
    /// Fails with `MissingCredentials` when no credentials were given.
    pub async fn oscar_client(&self) -> Result<OscarClient> {
        let endpoint = self
            .endpoint
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("--endpoint (or DTFLOOD_ENDPOINT) is required"))?;
        let credentials = self
            .credentials
            .as_ref()
            .ok_or(DispatchError::MissingCredentials)?;

        info!("Connecting to OSCAR at {}", endpoint);
        Ok(dtflood_dispatch::connect(endpoint, credentials, &self.token_url).await?)
    }
}

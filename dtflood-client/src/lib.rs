//! dtflood HTTP Client
//!
//! Type-safe HTTP clients for the two remote collaborators of a dispatch:
//! the OSCAR execution cluster and the MinIO object store that backs its
//! services.
//!
//! # Example
//!
//! ```no_run
//! use dtflood_client::{Auth, OscarClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = OscarClient::new("https://oscar.example.org")
//!         .with_auth(Auth::basic("oscar", "secret"));
//!
//!     let info = client.cluster_info().await?;
//!     println!("OSCAR version: {}", info.version);
//!     Ok(())
//! }
//! ```

pub mod auth;
mod cluster;
pub mod error;
mod services;
pub mod storage;

// Re-export commonly used types
pub use auth::{Auth, DEFAULT_TOKEN_URL};
pub use error::{ClientError, Result};
pub use storage::{MinioClient, NotificationStream};

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

/// HTTP client for the OSCAR REST API
///
/// Covers the endpoints a dispatch needs:
/// - Cluster health and configuration
/// - Service lookup and creation
#[derive(Debug, Clone)]
pub struct OscarClient {
    /// Base URL of the cluster (e.g., "https://oscar.example.org")
    base_url: String,
    /// HTTP client instance
    client: Client,
    /// Credentials attached to every request
    auth: Auth,
}

impl OscarClient {
    /// Create a new client without credentials
    ///
    /// # Example
    /// ```
    /// use dtflood_client::OscarClient;
    ///
    /// let client = OscarClient::new("https://oscar.example.org");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            auth: Auth::None,
        }
    }

    /// Attach credentials to all subsequent requests
    pub fn with_auth(mut self, auth: Auth) -> Self {
        self.auth = auth;
        self
    }

    /// Get the base URL of the cluster
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get(&self, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.auth.apply(self.client.get(url))
    }

    fn post(&self, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.auth.apply(self.client.post(url))
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Handle an API response whose body is irrelevant (e.g., creation)
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(())
    }
}

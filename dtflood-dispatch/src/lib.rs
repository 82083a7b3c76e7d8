//! dtflood Dispatch
//!
//! Submits a directory of model inputs to a remote OSCAR service and waits
//! for its output.
//!
//! Architecture:
//! - Packager: tar / untar job directories
//! - Repositories: trait seams over the OSCAR API and the object store
//! - Services: service resolution (lookup or create from template) and the
//!   dispatcher that drives one job through its states
//!
//! A dispatch is a strictly sequential cycle:
//! package, resolve service, upload, await notification, download, unpack.

pub mod config;
pub mod error;
pub mod packager;
pub mod repository;
pub mod service;

pub use config::DispatchConfig;
pub use error::{DispatchError, Result};
pub use repository::{HttpServiceRepository, MinioConnector};
pub use service::{DispatchOutcome, JobDispatcher, ServiceResolver};

use dtflood_client::{Auth, OscarClient};
use dtflood_core::domain::credentials::Credentials;
use std::path::Path;
use std::sync::Arc;

/// Builds an authenticated OSCAR client
///
/// Refresh tokens are exchanged at `token_url` first.
pub async fn connect(
    endpoint: &str,
    credentials: &Credentials,
    token_url: &str,
) -> Result<OscarClient> {
    let http = reqwest::Client::new();
    let auth = Auth::from_credentials(&http, credentials, token_url)
        .await
        .map_err(DispatchError::Unauthorized)?;

    Ok(OscarClient::with_client(endpoint, http).with_auth(auth))
}

/// Runs one full dispatch against a live cluster
///
/// Convenience wrapper wiring the HTTP repositories into a
/// [`JobDispatcher`].
///
/// # Returns
/// The outcome, whose `output_dir` holds exactly the remote output
pub async fn submit_and_await(
    input_dir: &Path,
    config: DispatchConfig,
    client: OscarClient,
) -> Result<DispatchOutcome> {
    let repository = Arc::new(HttpServiceRepository::new(client));
    let mut dispatcher = JobDispatcher::new(config, repository, Arc::new(MinioConnector::default()));

    dispatcher.submit_and_await(input_dir).await
}

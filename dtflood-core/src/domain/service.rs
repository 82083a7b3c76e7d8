//! Remote execution service types

use serde::{Deserialize, Serialize};
use std::fmt;

use super::storage::StoragePath;

/// Default region assumed by MinIO deployments
pub const DEFAULT_REGION: &str = "us-east-1";

/// Resolved view of a named remote execution service
///
/// Authoritative state lives in the remote service; this is a read-only
/// snapshot taken at resolution time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    pub name: String,
    /// Where input archives are uploaded
    pub input: StoragePath,
    /// Where the service writes its output archives
    pub output: StoragePath,
    /// Credentials for the object store backing both locations
    pub storage: StorageProvider,
}

/// Connection details of an S3-compatible storage provider
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageProvider {
    /// Base URL including scheme (e.g., "https://minio.example.org")
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
}

impl StorageProvider {
    pub fn new(
        endpoint: impl Into<String>,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            region: DEFAULT_REGION.to_string(),
        }
    }

    /// Overrides the signing region (ignored when empty)
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        let region = region.into();
        if !region.is_empty() {
            self.region = region;
        }
        self
    }
}

// Keep the secret out of logs.
impl fmt::Debug for StorageProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageProvider")
            .field("endpoint", &self.endpoint)
            .field("access_key", &self.access_key)
            .field("secret_key", &"***")
            .field("region", &self.region)
            .finish()
    }
}

/// How a service descriptor was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    /// The service was already deployed
    Existing,
    /// The service was missing and has been created from its template
    Created,
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Existing => f.write_str("existing"),
            Resolution::Created => f.write_str("created"),
        }
    }
}

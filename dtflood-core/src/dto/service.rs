//! OSCAR service DTOs

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Provider id used by OSCAR for its bundled MinIO
pub const DEFAULT_MINIO_PROVIDER: &str = "default";

/// Service definition as returned by `GET /system/services/{name}`
/// and accepted by `POST /system/services`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceDefinition {
    pub name: String,

    /// Script body (inlined before creation; the FDL holds a file path)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,

    #[serde(default)]
    pub input: Vec<StorageIo>,

    #[serde(default)]
    pub output: Vec<StorageIo>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_providers: Option<StorageProviders>,

    /// Image, resources, environment and other fields owned by OSCAR
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ServiceDefinition {
    /// MinIO credentials the service declares for its default provider
    pub fn default_minio(&self) -> Option<&MinioProvider> {
        self.storage_providers
            .as_ref()
            .and_then(|providers| providers.minio.get(DEFAULT_MINIO_PROVIDER))
    }
}

/// One input or output binding of a service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageIo {
    /// e.g. "minio.default"
    pub storage_provider: String,
    /// `bucket/prefix`
    pub path: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suffix: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prefix: Vec<String>,
}

/// Storage providers keyed by kind then id
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageProviders {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub minio: BTreeMap<String, MinioProvider>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// MinIO provider credentials
#[derive(Clone, Serialize, Deserialize)]
pub struct MinioProvider {
    pub endpoint: String,
    #[serde(default)]
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verify: Option<bool>,
}

impl std::fmt::Debug for MinioProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MinioProvider")
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .field("access_key", &self.access_key)
            .field("secret_key", &"***")
            .finish()
    }
}

/// OSCAR function definition language document used as a service template
///
/// ```yaml
/// functions:
///   oscar:
///   - my-cluster:
///       name: wflow
///       script: wflow_script.sh
///       input: [...]
///       output: [...]
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct FdlDocument {
    pub functions: FdlFunctions,

    /// Providers shared by every service of the document
    #[serde(default)]
    pub storage_providers: Option<StorageProviders>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FdlFunctions {
    /// Each entry maps a cluster id to one service definition
    #[serde(default)]
    pub oscar: Vec<BTreeMap<String, ServiceDefinition>>,
}

impl FdlDocument {
    /// All service definitions in document order, with shared storage
    /// providers copied into services that do not declare their own
    pub fn into_services(self) -> Vec<ServiceDefinition> {
        let shared = self.storage_providers;
        self.functions
            .oscar
            .into_iter()
            .flat_map(|entry| entry.into_values())
            .map(|mut service| {
                if service.storage_providers.is_none() {
                    service.storage_providers = shared.clone();
                }
                service
            })
            .collect()
    }
}

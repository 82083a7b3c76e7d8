//! OSCAR cluster DTOs

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::service::MinioProvider;

/// Response of `GET /system/info`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterInfo {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub git_commit: String,
    #[serde(default)]
    pub architecture: String,
    #[serde(default)]
    pub kubernetes_version: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response of `GET /system/config`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    #[serde(default)]
    pub minio_provider: Option<MinioProvider>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

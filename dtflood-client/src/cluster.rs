//! Cluster-level API endpoints

use dtflood_core::dto::cluster::{ClusterConfig, ClusterInfo};

use crate::OscarClient;
use crate::error::Result;

impl OscarClient {
    /// Get cluster version information
    ///
    /// Used as a connectivity and credentials check before anything else.
    pub async fn cluster_info(&self) -> Result<ClusterInfo> {
        let response = self.get("/system/info").send().await?;

        self.handle_response(response).await
    }

    /// Get the cluster configuration, including its MinIO provider
    pub async fn cluster_config(&self) -> Result<ClusterConfig> {
        let response = self.get("/system/config").send().await?;

        self.handle_response(response).await
    }
}

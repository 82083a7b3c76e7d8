//! Services repository
//!
//! Handles communication with the OSCAR cluster:
//! - Health check
//! - Service lookup and creation
//! - Cluster-wide storage configuration

use async_trait::async_trait;
use dtflood_client::{OscarClient, Result};
use dtflood_core::dto::cluster::ClusterInfo;
use dtflood_core::dto::service::{MinioProvider, ServiceDefinition};

/// Repository trait for OSCAR service operations
#[async_trait]
pub trait ServiceRepository: Send + Sync {
    /// Base URL of the cluster, for diagnostics
    fn endpoint(&self) -> &str;

    /// Fetches cluster information; fails when the cluster is unreachable
    /// or rejects the credentials
    async fn cluster_info(&self) -> Result<ClusterInfo>;

    /// Fetches a service by name
    ///
    /// A missing service is an error for which `is_not_found()` holds.
    async fn get_service(&self, name: &str) -> Result<ServiceDefinition>;

    /// Deploys a service whose script is already inlined
    async fn create_service(&self, service: &ServiceDefinition) -> Result<()>;

    /// MinIO provider configured for the whole cluster, if any
    async fn cluster_minio(&self) -> Result<Option<MinioProvider>>;
}

/// HTTP implementation of ServiceRepository
pub struct HttpServiceRepository {
    client: OscarClient,
}

impl HttpServiceRepository {
    pub fn new(client: OscarClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ServiceRepository for HttpServiceRepository {
    fn endpoint(&self) -> &str {
        self.client.base_url()
    }

    async fn cluster_info(&self) -> Result<ClusterInfo> {
        self.client.cluster_info().await
    }

    async fn get_service(&self, name: &str) -> Result<ServiceDefinition> {
        self.client.get_service(name).await
    }

    async fn create_service(&self, service: &ServiceDefinition) -> Result<()> {
        self.client.create_service(service).await
    }

    async fn cluster_minio(&self) -> Result<Option<MinioProvider>> {
        Ok(self.client.cluster_config().await?.minio_provider)
    }
}

//! Service resolution
//!
//! Looks a named service up on the cluster and, when it is missing, creates
//! it once from its template. Creation is a side effect of a failed lookup
//! and is not guarded against two callers racing to create the same service.

use dtflood_client::ClientError;
use dtflood_core::domain::service::{Resolution, ServiceDescriptor, StorageProvider};
use dtflood_core::domain::storage::StoragePath;
use dtflood_core::dto::cluster::ClusterInfo;
use dtflood_core::dto::service::{MinioProvider, ServiceDefinition, StorageIo};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{DispatchError, Result};
use crate::repository::ServiceRepository;
use crate::service::template;

/// Resolves service names into descriptors
pub struct ServiceResolver {
    repository: Arc<dyn ServiceRepository>,
}

impl ServiceResolver {
    pub fn new(repository: Arc<dyn ServiceRepository>) -> Self {
        Self { repository }
    }

    /// Verifies that the cluster answers and accepts the credentials
    pub async fn check_connection(&self) -> Result<ClusterInfo> {
        info!("Checking OSCAR connection status");

        match self.repository.cluster_info().await {
            Ok(info) => {
                info!(
                    "Connected to OSCAR {} (kubernetes {})",
                    info.version, info.kubernetes_version
                );
                Ok(info)
            }
            Err(e) if e.is_unauthorized() => Err(DispatchError::Unauthorized(e)),
            Err(e) => Err(DispatchError::ClusterUnreachable {
                endpoint: self.repository.endpoint().to_string(),
                source: e,
            }),
        }
    }

    /// Returns the descriptor of `name`, creating the service from
    /// `<template_dir>/<name>.yaml` if it does not exist yet
    pub async fn resolve(
        &self,
        name: &str,
        template_dir: &Path,
    ) -> Result<(ServiceDescriptor, Resolution)> {
        info!("Checking OSCAR service status");

        let (definition, resolution) = match self.repository.get_service(name).await {
            Ok(definition) => {
                info!("OSCAR service {} already exists", name);
                (definition, Resolution::Existing)
            }
            Err(e) if e.is_not_found() => {
                info!("OSCAR service {} not found, creating it", name);
                (self.create(name, template_dir).await?, Resolution::Created)
            }
            Err(e) => return Err(lookup_error(name, e)),
        };

        let descriptor = self.describe(&definition).await?;
        info!(
            "OSCAR service {} input={} output={}",
            name, descriptor.input, descriptor.output
        );

        Ok((descriptor, resolution))
    }

    async fn create(&self, name: &str, template_dir: &Path) -> Result<ServiceDefinition> {
        let definitions = template::load_template(template_dir, name)?;

        // Creation errors (409 from a concurrent caller) only matter if the
        // service is still missing afterwards.
        let mut failures = Vec::new();
        for definition in &definitions {
            match self.repository.create_service(definition).await {
                Ok(()) => info!("OSCAR service {} created", definition.name),
                Err(e) => {
                    warn!("Creating OSCAR service {} failed: {}", definition.name, e);
                    failures.push(format!("{}: {}", definition.name, e));
                }
            }
        }

        self.repository.get_service(name).await.map_err(|e| {
            if failures.is_empty() {
                return lookup_error(name, e);
            }
            DispatchError::ServiceUnavailable {
                service: name.to_string(),
                reason: format!("creation failed ({}), lookup failed: {}", failures.join("; "), e),
            }
        })
    }

    /// Builds a descriptor from the definition the cluster reports
    async fn describe(&self, definition: &ServiceDefinition) -> Result<ServiceDescriptor> {
        let invalid = |reason: &str| DispatchError::InvalidService {
            service: definition.name.clone(),
            reason: reason.to_string(),
        };

        let input = first_path(&definition.input).ok_or_else(|| invalid("no input storage declared"))?;
        let output =
            first_path(&definition.output).ok_or_else(|| invalid("no output storage declared"))?;

        let minio = match definition.default_minio() {
            Some(minio) => minio.clone(),
            None => {
                warn!(
                    "Service {} carries no MinIO credentials, using cluster provider",
                    definition.name
                );
                self.repository
                    .cluster_minio()
                    .await
                    .map_err(|e| lookup_error(&definition.name, e))?
                    .ok_or_else(|| invalid("no MinIO provider on service or cluster"))?
            }
        };

        Ok(ServiceDescriptor {
            name: definition.name.clone(),
            input,
            output,
            storage: storage_provider(&minio),
        })
    }
}

fn first_path(bindings: &[StorageIo]) -> Option<StoragePath> {
    bindings.first().and_then(|io| StoragePath::parse(&io.path))
}

/// OSCAR reports endpoints with a scheme; bare hosts are assumed to be TLS.
fn storage_provider(minio: &MinioProvider) -> StorageProvider {
    let endpoint = if minio.endpoint.contains("://") {
        minio.endpoint.clone()
    } else {
        format!("https://{}", minio.endpoint)
    };

    StorageProvider::new(endpoint, &minio.access_key, &minio.secret_key).with_region(&minio.region)
}

fn lookup_error(service: &str, error: ClientError) -> DispatchError {
    if error.is_unauthorized() {
        return DispatchError::Unauthorized(error);
    }

    DispatchError::ServiceUnavailable {
        service: service.to_string(),
        reason: error.to_string(),
    }
}

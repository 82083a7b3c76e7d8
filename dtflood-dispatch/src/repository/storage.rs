//! Object storage repository
//!
//! Wraps the MinIO client behind traits so the dispatcher only sees
//! upload, download and subscribe.

use async_trait::async_trait;
use dtflood_client::{MinioClient, NotificationStream, Result};
use dtflood_core::domain::notification::NotificationEvent;
use dtflood_core::domain::service::StorageProvider;
use std::path::Path;
use std::sync::Arc;

/// Repository trait for object storage operations
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Uploads a local file; returns the number of bytes sent
    async fn upload(&self, bucket: &str, key: &str, file: &Path) -> Result<u64>;

    /// Downloads an object to a local file; returns the number of bytes written
    async fn download(&self, bucket: &str, key: &str, dest: &Path) -> Result<u64>;

    /// Opens a notification subscription on `bucket/prefix`
    async fn subscribe(
        &self,
        bucket: &str,
        prefix: &str,
        events: &[&str],
    ) -> Result<Box<dyn EventStream>>;
}

/// Source of bucket notification events
#[async_trait]
pub trait EventStream: Send {
    /// Next event, or `None` once the subscription has closed
    async fn next_event(&mut self) -> Result<Option<NotificationEvent>>;
}

/// Opens an object store for the provider a service declares
pub trait StoreConnector: Send + Sync {
    fn connect(&self, provider: &StorageProvider) -> Arc<dyn ObjectStore>;
}

/// MinIO implementation of ObjectStore
pub struct MinioObjectStore {
    client: MinioClient,
}

impl MinioObjectStore {
    pub fn new(client: MinioClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStore for MinioObjectStore {
    async fn upload(&self, bucket: &str, key: &str, file: &Path) -> Result<u64> {
        self.client.put_object(bucket, key, file).await
    }

    async fn download(&self, bucket: &str, key: &str, dest: &Path) -> Result<u64> {
        self.client.get_object(bucket, key, dest).await
    }

    async fn subscribe(
        &self,
        bucket: &str,
        prefix: &str,
        events: &[&str],
    ) -> Result<Box<dyn EventStream>> {
        let stream = self.client.listen(bucket, prefix, events).await?;
        Ok(Box::new(stream))
    }
}

#[async_trait]
impl EventStream for NotificationStream {
    async fn next_event(&mut self) -> Result<Option<NotificationEvent>> {
        NotificationStream::next_event(self).await
    }
}

/// Connects to MinIO over HTTP
#[derive(Debug, Default, Clone)]
pub struct MinioConnector;

impl StoreConnector for MinioConnector {
    fn connect(&self, provider: &StorageProvider) -> Arc<dyn ObjectStore> {
        Arc::new(MinioObjectStore::new(MinioClient::new(provider.clone())))
    }
}

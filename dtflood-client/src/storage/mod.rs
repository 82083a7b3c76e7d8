//! MinIO object storage client
//!
//! A minimal S3-compatible client covering what a dispatch needs: object
//! upload, object download, and the MinIO-specific bucket notification
//! listener. All requests are path-style and presigned.

mod notification;
pub mod presign;

pub use notification::NotificationStream;

use dtflood_core::domain::service::StorageProvider;
use reqwest::header::CONTENT_LENGTH;
use reqwest::{Body, Client};
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{ClientError, Result};
use presign::{HttpMethod, PresignedUrlBuilder};

/// Client for one S3-compatible storage provider
#[derive(Debug, Clone)]
pub struct MinioClient {
    provider: StorageProvider,
    client: Client,
}

impl MinioClient {
    pub fn new(provider: StorageProvider) -> Self {
        Self::with_client(provider, Client::new())
    }

    /// Create a client with a custom HTTP client
    ///
    /// Do not set a request timeout on it: the notification listener keeps
    /// its response open for as long as the wait lasts.
    pub fn with_client(provider: StorageProvider, client: Client) -> Self {
        Self { provider, client }
    }

    pub fn endpoint(&self) -> &str {
        &self.provider.endpoint
    }

    fn presign(&self, method: HttpMethod, bucket: &str, key: &str) -> PresignedUrlBuilder {
        PresignedUrlBuilder::new(&self.provider.endpoint, bucket, key)
            .method(method)
            .access_key(&self.provider.access_key)
            .secret_key(&self.provider.secret_key)
            .region(&self.provider.region)
    }

    /// Upload a local file to `bucket/key`
    ///
    /// # Returns
    /// Number of bytes uploaded
    pub async fn put_object(&self, bucket: &str, key: &str, file: &Path) -> Result<u64> {
        let source = tokio::fs::File::open(file).await?;
        let size = source.metadata().await?.len();
        let url = self.presign(HttpMethod::Put, bucket, key).build()?;

        // The body is streamed from disk; MinIO needs the length up front.
        debug!("PUT {}/{} ({} bytes)", bucket, key, size);
        let response = self
            .client
            .put(&url)
            .header(CONTENT_LENGTH, size)
            .body(Body::from(source))
            .send()
            .await?;
        check_status(response).await?;

        info!("Uploaded {} to {}/{}", file.display(), bucket, key);
        Ok(size)
    }

    /// Download `bucket/key` into a local file, replacing it if present
    ///
    /// # Returns
    /// Number of bytes written
    pub async fn get_object(&self, bucket: &str, key: &str, dest: &Path) -> Result<u64> {
        let url = self.presign(HttpMethod::Get, bucket, key).build()?;

        debug!("GET {}/{}", bucket, key);
        let response = self.client.get(&url).send().await?;
        let mut response = match check_status(response).await {
            Err(e) if e.is_not_found() => {
                return Err(ClientError::NotFound(format!("object {}/{}", bucket, key)));
            }
            other => other?,
        };

        let mut file = tokio::fs::File::create(dest).await?;
        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        info!("Downloaded {}/{} to {}", bucket, key, dest.display());
        Ok(written)
    }

    /// Subscribe to object events under `bucket/prefix`
    ///
    /// Events are only delivered while the returned stream is alive; anything
    /// written before this call returns is missed.
    pub async fn listen(
        &self,
        bucket: &str,
        prefix: &str,
        events: &[&str],
    ) -> Result<NotificationStream> {
        let mut builder = self
            .presign(HttpMethod::Get, bucket, "")
            .query("prefix", prefix)
            .query("suffix", "");
        for event in events {
            builder = builder.query("events", event);
        }
        let url = builder.build()?;

        debug!("Listening on {}/{} for {:?}", bucket, prefix, events);
        let response = self.client.get(&url).send().await?;
        let response = check_status(response).await?;

        Ok(NotificationStream::new(response))
    }
}

/// Turns non-success responses into API errors
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(ClientError::api_error(status.as_u16(), error_text))
}

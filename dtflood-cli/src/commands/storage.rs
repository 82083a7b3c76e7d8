//! Direct object storage flags shared by `upload` and `wait`

use clap::Args;
use dtflood_client::MinioClient;
use dtflood_core::domain::service::StorageProvider;
use dtflood_core::domain::storage::StoragePath;

/// MinIO connection flags
#[derive(Args, Debug, Clone)]
pub struct StorageArgs {
    /// MinIO endpoint URL
    #[arg(long, env = "DTFLOOD_STORAGE_ENDPOINT")]
    pub storage_endpoint: String,

    /// MinIO access key
    #[arg(long, env = "DTFLOOD_ACCESS_KEY")]
    pub access_key: String,

    /// MinIO secret key
    #[arg(long, env = "DTFLOOD_SECRET_KEY", hide_env_values = true)]
    pub secret_key: String,

    /// Signing region
    #[arg(long, env = "DTFLOOD_REGION", default_value = "")]
    pub region: String,
}

impl StorageArgs {
    pub fn client(&self) -> MinioClient {
        let provider =
            StorageProvider::new(&self.storage_endpoint, &self.access_key, &self.secret_key)
                .with_region(&self.region);
        MinioClient::new(provider)
    }
}

/// Parses a `bucket/prefix` flag value
pub fn parse_storage_path(value: &str) -> Result<StoragePath, String> {
    StoragePath::parse(value).ok_or_else(|| format!("'{}' does not name a bucket", value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_storage_path() {
        let path = parse_storage_path("wflow/in").unwrap();
        assert_eq!(path.bucket, "wflow");
        assert_eq!(path.prefix, "in");

        assert!(parse_storage_path("/").is_err());
    }
}

//! Presigned URLs for S3-compatible requests.
//!
//! Every object-store call is authenticated with AWS Signature Version 4
//! carried in the query string. This lets long-lived requests such as the
//! MinIO notification listener be plain GETs without header signing.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// HTTP methods supported for presigned URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Put,
}

impl HttpMethod {
    fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Put => "PUT",
        }
    }
}

/// Maximum expiration time for presigned URLs (7 days in seconds).
const MAX_EXPIRES_SECONDS: u64 = 604800;

/// Default expiration time (1 hour in seconds).
const DEFAULT_EXPIRES_SECONDS: u64 = 3600;

const DEFAULT_REGION: &str = "us-east-1";

const SERVICE: &str = "s3";

/// Errors that can occur during presigned URL generation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PresignError {
    #[error("Access key is required")]
    MissingAccessKey,
    #[error("Secret key is required")]
    MissingSecretKey,
    #[error("Bucket name is invalid")]
    InvalidBucket,
    #[error("Endpoint URL is invalid")]
    InvalidEndpoint,
}

/// Builder for presigned path-style URLs.
///
/// An empty key addresses the bucket itself.
pub struct PresignedUrlBuilder {
    endpoint: String,
    bucket: String,
    key: String,
    method: HttpMethod,
    expires_seconds: u64,
    access_key: String,
    secret_key: String,
    region: String,
    query: Vec<(String, String)>,
    timestamp: Option<DateTime<Utc>>,
}

impl PresignedUrlBuilder {
    pub fn new(endpoint: &str, bucket: &str, key: &str) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            bucket: bucket.to_string(),
            key: key.trim_start_matches('/').to_string(),
            method: HttpMethod::Get,
            expires_seconds: DEFAULT_EXPIRES_SECONDS,
            access_key: String::new(),
            secret_key: String::new(),
            region: DEFAULT_REGION.to_string(),
            query: Vec::new(),
            timestamp: None,
        }
    }

    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    /// Capped at 7 days.
    pub fn expires_in_seconds(mut self, seconds: u64) -> Self {
        self.expires_seconds = seconds.min(MAX_EXPIRES_SECONDS);
        self
    }

    pub fn access_key(mut self, key: &str) -> Self {
        self.access_key = key.to_string();
        self
    }

    pub fn secret_key(mut self, key: &str) -> Self {
        self.secret_key = key.to_string();
        self
    }

    pub fn region(mut self, region: &str) -> Self {
        self.region = region.to_string();
        self
    }

    /// Add an API query parameter; it is covered by the signature.
    ///
    /// A name may repeat (MinIO takes one `events` entry per filter).
    pub fn query(mut self, name: &str, value: &str) -> Self {
        self.query.push((name.to_string(), value.to_string()));
        self
    }

    /// Set a specific timestamp (for testing).
    pub fn timestamp(mut self, ts: DateTime<Utc>) -> Self {
        self.timestamp = Some(ts);
        self
    }

    pub fn build(self) -> Result<String, PresignError> {
        if self.access_key.is_empty() {
            return Err(PresignError::MissingAccessKey);
        }
        if self.secret_key.is_empty() {
            return Err(PresignError::MissingSecretKey);
        }
        if self.bucket.is_empty() || self.bucket.contains('/') {
            return Err(PresignError::InvalidBucket);
        }

        let now = self.timestamp.unwrap_or_else(Utc::now);
        let date_str = now.format("%Y%m%d").to_string();
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();

        let credential_scope = format!("{}/{}/{}/aws4_request", date_str, self.region, SERVICE);

        let canonical_uri = if self.key.is_empty() {
            format!("/{}", self.bucket)
        } else {
            format!("/{}/{}", self.bucket, self.key)
        };
        let encoded_uri = uri_encode_path(&canonical_uri);

        let mut query_params = self.query;
        query_params.extend([
            ("X-Amz-Algorithm".to_string(), "AWS4-HMAC-SHA256".to_string()),
            (
                "X-Amz-Credential".to_string(),
                format!("{}/{}", self.access_key, credential_scope),
            ),
            ("X-Amz-Date".to_string(), amz_date.clone()),
            ("X-Amz-Expires".to_string(), self.expires_seconds.to_string()),
            ("X-Amz-SignedHeaders".to_string(), "host".to_string()),
        ]);

        let canonical_query_string = build_canonical_query_string(&query_params);

        let host = extract_host(&self.endpoint)?;
        let canonical_headers = format!("host:{}\n", host);

        let canonical_request = format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            self.method.as_str(),
            encoded_uri,
            canonical_query_string,
            canonical_headers,
            "host",
            "UNSIGNED-PAYLOAD"
        );

        let string_to_sign = format!(
            "AWS4-HMAC-SHA256\n{}\n{}\n{}",
            amz_date,
            credential_scope,
            hex_sha256(canonical_request.as_bytes())
        );

        let signature = calculate_signature(
            &self.secret_key,
            &date_str,
            &self.region,
            SERVICE,
            &string_to_sign,
        );

        Ok(format!(
            "{}{}?{}&X-Amz-Signature={}",
            self.endpoint, encoded_uri, canonical_query_string, signature
        ))
    }
}

/// URI-encode a path (preserving slashes).
fn uri_encode_path(path: &str) -> String {
    encode(path, true)
}

/// URI-encode a query parameter name or value.
fn uri_encode_value(value: &str) -> String {
    encode(value, false)
}

fn encode(input: &str, keep_slash: bool) -> String {
    use std::fmt::Write;
    let mut result = String::with_capacity(input.len() * 3);
    for b in input.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                result.push(b as char);
            }
            b'/' if keep_slash => result.push('/'),
            _ => {
                let _ = write!(result, "%{:02X}", b);
            }
        }
    }
    result
}

/// Encoded pairs sorted by name, then value.
fn build_canonical_query_string(params: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (uri_encode_value(k), uri_encode_value(v)))
        .collect();
    encoded.sort();

    encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

fn hex_sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

fn calculate_signature(
    secret_key: &str,
    date: &str,
    region: &str,
    service: &str,
    string_to_sign: &str,
) -> String {
    let k_date = hmac_sha256(format!("AWS4{}", secret_key).as_bytes(), date.as_bytes());
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    let k_signing = hmac_sha256(&k_service, b"aws4_request");
    hex::encode(hmac_sha256(&k_signing, string_to_sign.as_bytes()))
}

fn extract_host(endpoint: &str) -> Result<String, PresignError> {
    let host = endpoint
        .strip_prefix("http://")
        .or_else(|| endpoint.strip_prefix("https://"))
        .unwrap_or(endpoint);

    let host = host.split('/').next().unwrap_or(host);

    if host.is_empty() {
        return Err(PresignError::InvalidEndpoint);
    }

    Ok(host.to_string())
}

//! Object storage addressing

use serde::{Deserialize, Serialize};
use std::fmt;

/// A bucket plus an optional key prefix, as declared by a service
///
/// OSCAR declares storage locations as a single `bucket/some/prefix` string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoragePath {
    pub bucket: String,
    pub prefix: String,
}

impl StoragePath {
    /// Splits a `bucket/prefix/...` string into bucket and prefix
    ///
    /// Leading and trailing slashes are ignored. Returns `None` when no
    /// bucket name is present.
    pub fn parse(path: &str) -> Option<Self> {
        let trimmed = path.trim_matches('/');
        let (bucket, prefix) = match trimmed.split_once('/') {
            Some((bucket, prefix)) => (bucket, prefix.trim_matches('/')),
            None => (trimmed, ""),
        };

        if bucket.is_empty() {
            return None;
        }

        Some(Self {
            bucket: bucket.to_string(),
            prefix: prefix.to_string(),
        })
    }

    /// Full object key for a file name placed under this prefix
    pub fn key_for(&self, file_name: &str) -> String {
        if self.prefix.is_empty() {
            file_name.to_string()
        } else {
            format!("{}/{}", self.prefix, file_name)
        }
    }
}

impl fmt::Display for StoragePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.prefix.is_empty() {
            write!(f, "{}", self.bucket)
        } else {
            write!(f, "{}/{}", self.bucket, self.prefix)
        }
    }
}

//! Bucket notification events and matching

use serde::{Deserialize, Serialize};

/// Event filter for newly written objects
pub const OBJECT_CREATED: &str = "s3:ObjectCreated:*";

/// A single object event delivered by a bucket notification subscription
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEvent {
    /// S3 event name (e.g., "s3:ObjectCreated:Put")
    pub event_name: String,
    pub bucket: String,
    /// Decoded object key
    pub key: String,
    pub size: Option<u64>,
}

impl NotificationEvent {
    pub fn is_created(&self) -> bool {
        self.event_name.starts_with("s3:ObjectCreated:")
    }

    /// Whether this event belongs to the given submission
    pub fn matches(&self, execution_id: &str) -> bool {
        !execution_id.is_empty() && self.key.contains(execution_id)
    }

    /// Last path segment of the key
    pub fn file_name(&self) -> &str {
        self.key.rsplit('/').next().unwrap_or(&self.key)
    }
}

/// Selects the first event whose key contains `execution_id`
///
/// Events before and after the match are ignored.
pub fn first_match<'a, I>(events: I, execution_id: &str) -> Option<&'a NotificationEvent>
where
    I: IntoIterator<Item = &'a NotificationEvent>,
{
    events.into_iter().find(|event| event.matches(execution_id))
}

/// Decodes an object key as MinIO escapes it in event records
///
/// MinIO query-escapes keys, so `/` arrives as `%2F` and spaces as `+`.
/// Malformed escapes are kept verbatim.
pub fn decode_key(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' if i + 2 < bytes.len() => {
                match (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                    (Some(hi), Some(lo)) => {
                        out.push((hi << 4) | lo);
                        i += 3;
                    }
                    _ => {
                        out.push(b'%');
                        i += 1;
                    }
                }
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }

    String::from_utf8(out).unwrap_or_else(|_| raw.to_string())
}

fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

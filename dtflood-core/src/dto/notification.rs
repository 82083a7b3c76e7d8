//! MinIO bucket notification frames
//!
//! `ListenBucketNotification` streams one JSON document per line. Keep-alive
//! frames are blank lines or documents without records.

use serde::Deserialize;

use crate::domain::notification::{NotificationEvent, decode_key};

/// One line of the notification stream
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationFrame {
    #[serde(rename = "Records", default)]
    pub records: Option<Vec<EventRecord>>,
}

impl NotificationFrame {
    /// Decodes one stream line; blank lines yield no events
    pub fn parse_line(line: &str) -> serde_json::Result<Vec<NotificationEvent>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Vec::new());
        }

        let frame: NotificationFrame = serde_json::from_str(line)?;
        Ok(frame
            .records
            .unwrap_or_default()
            .into_iter()
            .map(NotificationEvent::from)
            .collect())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub event_name: String,
    #[serde(default)]
    pub event_time: Option<chrono::DateTime<chrono::Utc>>,
    pub s3: S3Entity,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Entity {
    pub bucket: BucketEntity,
    pub object: ObjectEntity,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BucketEntity {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObjectEntity {
    pub key: String,
    #[serde(default)]
    pub size: Option<u64>,
}

impl From<EventRecord> for NotificationEvent {
    fn from(record: EventRecord) -> Self {
        Self {
            event_name: record.event_name,
            bucket: record.s3.bucket.name,
            key: decode_key(&record.s3.object.key),
            size: record.s3.object.size,
        }
    }
}

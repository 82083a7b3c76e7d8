//! MinIO bucket notification stream

use dtflood_core::domain::notification::NotificationEvent;
use dtflood_core::dto::notification::NotificationFrame;
use std::collections::VecDeque;
use tracing::{debug, warn};

use crate::error::Result;

/// Live subscription to `ListenBucketNotification`
///
/// Reads the chunked response body, splits it into lines and yields one
/// event at a time. The stream ends when the server closes the connection.
pub struct NotificationStream {
    response: Option<reqwest::Response>,
    buffer: Vec<u8>,
    pending: VecDeque<NotificationEvent>,
}

impl NotificationStream {
    pub(crate) fn new(response: reqwest::Response) -> Self {
        Self {
            response: Some(response),
            buffer: Vec::new(),
            pending: VecDeque::new(),
        }
    }

    /// Waits for the next event
    ///
    /// Returns `Ok(None)` once the server has closed the stream.
    pub async fn next_event(&mut self) -> Result<Option<NotificationEvent>> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Ok(Some(event));
            }

            if let Some(line) = self.take_line() {
                self.push_line(&line);
                continue;
            }

            let Some(response) = self.response.as_mut() else {
                return Ok(None);
            };

            match response.chunk().await? {
                Some(chunk) => self.buffer.extend_from_slice(&chunk),
                None => {
                    debug!("Notification stream closed by server");
                    self.response = None;
                    if !self.buffer.is_empty() {
                        let rest = std::mem::take(&mut self.buffer);
                        self.push_line(&String::from_utf8_lossy(&rest));
                    }
                }
            }
        }
    }

    /// Removes one complete line from the buffer
    fn take_line(&mut self) -> Option<String> {
        let pos = self.buffer.iter().position(|b| *b == b'\n')?;
        let line: Vec<u8> = self.buffer.drain(..=pos).collect();
        Some(String::from_utf8_lossy(&line).into_owned())
    }

    fn push_line(&mut self, line: &str) {
        match NotificationFrame::parse_line(line) {
            Ok(events) => self.pending.extend(events),
            Err(e) => warn!("Skipping malformed notification frame: {}", e),
        }
    }
}

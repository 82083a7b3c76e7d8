//! Job submission domain types

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Lifecycle of a single submission
///
/// The dispatcher walks these states strictly in order; there is no
/// cancellation or retry edge. Failure is represented by an error, not a
/// state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum JobState {
    Unsubmitted,
    Packaged,
    ServiceResolved,
    Uploaded,
    AwaitingNotification,
    Downloaded,
    Unpacked,
}

impl JobState {
    /// The only state reachable from this one
    pub fn next(self) -> Option<JobState> {
        match self {
            JobState::Unsubmitted => Some(JobState::Packaged),
            JobState::Packaged => Some(JobState::ServiceResolved),
            JobState::ServiceResolved => Some(JobState::Uploaded),
            JobState::Uploaded => Some(JobState::AwaitingNotification),
            JobState::AwaitingNotification => Some(JobState::Downloaded),
            JobState::Downloaded => Some(JobState::Unpacked),
            JobState::Unpacked => None,
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobState::Unsubmitted => "UNSUBMITTED",
            JobState::Packaged => "PACKAGED",
            JobState::ServiceResolved => "SERVICE_RESOLVED",
            JobState::Uploaded => "UPLOADED",
            JobState::AwaitingNotification => "AWAITING_NOTIFICATION",
            JobState::Downloaded => "DOWNLOADED",
            JobState::Unpacked => "UNPACKED",
        };
        f.write_str(name)
    }
}

/// Object key under which one submission is uploaded
///
/// Shaped `<execution id>_<archive file name>`. The execution id is a
/// random UUID in simple (hyphenless) form, so it never contains `_` and
/// keys from concurrent callers cannot collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UploadKey {
    execution_id: String,
    file_name: String,
}

impl UploadKey {
    /// Generates a fresh key for an archive file name
    pub fn generate(file_name: &str) -> Self {
        Self::with_execution_id(Uuid::new_v4().simple().to_string(), file_name)
    }

    /// Builds a key from a known execution id
    pub fn with_execution_id(execution_id: impl Into<String>, file_name: &str) -> Self {
        Self {
            execution_id: execution_id.into(),
            file_name: file_name.to_string(),
        }
    }

    /// Identifier the remote service carries over into its output key
    pub fn execution_id(&self) -> &str {
        &self.execution_id
    }
}

impl fmt::Display for UploadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.execution_id, self.file_name)
    }
}

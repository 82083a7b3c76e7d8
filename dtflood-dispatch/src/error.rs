//! Error types for dispatching

use dtflood_client::ClientError;
use dtflood_core::domain::job::JobState;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::packager::PackageError;

/// Result type alias for dispatch operations
pub type Result<T> = std::result::Result<T, DispatchError>;

/// Everything that aborts a dispatch
///
/// None of these are retried.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Local packaging or unpacking failed
    #[error(transparent)]
    Package(#[from] PackageError),

    /// No usable credentials were supplied
    #[error("Introduce the credentials user/password or token")]
    MissingCredentials,

    /// The cluster did not answer the health check
    #[error("OSCAR cluster not found at {endpoint}: {source}")]
    ClusterUnreachable {
        endpoint: String,
        #[source]
        source: ClientError,
    },

    /// The cluster or token endpoint refused the credentials
    #[error("Authentication failed: {0}")]
    Unauthorized(#[source] ClientError),

    /// The service could neither be found nor created
    #[error("OSCAR service '{service}' unavailable: {reason}")]
    ServiceUnavailable { service: String, reason: String },

    /// The service template could not be read or rendered
    #[error("Invalid service template {path}: {reason}")]
    Template { path: PathBuf, reason: String },

    /// The service does not declare usable storage
    #[error("Service '{service}' is misconfigured: {reason}")]
    InvalidService { service: String, reason: String },

    /// Object storage request failed
    #[error("Object storage error: {0}")]
    Storage(#[source] ClientError),

    /// The notification stream ended before the output appeared
    #[error("Notification stream closed before output for execution {execution_id} appeared")]
    StreamClosed { execution_id: String },

    /// The output did not appear within the configured deadline
    #[error("Timed out after {0:?} waiting for output")]
    WaitTimedOut(Duration),

    /// A state transition skipped or repeated a step
    #[error("Invalid job state transition {from} -> {to}")]
    InvalidState { from: JobState, to: JobState },

    /// A blocking task panicked or was cancelled
    #[error("Background task failed: {0}")]
    TaskFailed(String),

    /// Local file access failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DispatchError {
    /// Process exit code for this failure
    pub fn exit_code(&self) -> i32 {
        match self {
            DispatchError::MissingCredentials => 2,
            DispatchError::WaitTimedOut(_) => 124,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(DispatchError::MissingCredentials.exit_code(), 2);
        assert_eq!(
            DispatchError::WaitTimedOut(Duration::from_secs(5)).exit_code(),
            124
        );
        assert_eq!(
            DispatchError::StreamClosed {
                execution_id: "abc".to_string()
            }
            .exit_code(),
            1
        );
    }

    #[test]
    fn test_invalid_state_message() {
        let err = DispatchError::InvalidState {
            from: JobState::Packaged,
            to: JobState::Uploaded,
        };
        assert_eq!(
            err.to_string(),
            "Invalid job state transition PACKAGED -> UPLOADED"
        );
    }
}

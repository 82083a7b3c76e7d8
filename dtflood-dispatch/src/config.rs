//! Dispatch configuration
//!
//! Typed settings for one dispatch. Built by the CLI from flags and
//! environment variables.

use dtflood_core::domain::notification::OBJECT_CREATED;
use std::path::PathBuf;
use std::time::Duration;

/// Settings for submitting a job to one OSCAR service
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Name of the remote service
    pub service: String,

    /// Directory holding `<service>.yaml` and its script, used when the
    /// service has to be created
    pub template_dir: PathBuf,

    /// Where the output archive is downloaded and unpacked
    pub output_dir: PathBuf,

    /// Upper bound on the notification wait (None = wait indefinitely)
    pub wait_timeout: Option<Duration>,

    /// Event filters passed to the notification subscription
    pub listen_events: Vec<String>,
}

impl DispatchConfig {
    /// Creates a configuration with defaults
    pub fn new(
        service: impl Into<String>,
        template_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            service: service.into(),
            template_dir: template_dir.into(),
            output_dir: output_dir.into(),
            wait_timeout: None,
            listen_events: vec![OBJECT_CREATED.to_string()],
        }
    }

    /// Bounds the notification wait
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.wait_timeout = timeout;
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.service.is_empty() {
            anyhow::bail!("service name cannot be empty");
        }

        if self.service.contains('/') {
            anyhow::bail!("service name cannot contain '/'");
        }

        if self.output_dir.as_os_str().is_empty() {
            anyhow::bail!("output directory cannot be empty");
        }

        if self.wait_timeout.is_some_and(|t| t.is_zero()) {
            anyhow::bail!("wait timeout must be greater than 0");
        }

        if self.listen_events.is_empty() {
            anyhow::bail!("at least one notification event filter is required");
        }

        Ok(())
    }
}

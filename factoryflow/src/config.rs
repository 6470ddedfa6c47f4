//! Workflow configuration.
//!
//! A [`WorkflowConfig`] is supplied once per run and never mutated.
//! Missing fields fall back to the defaults below when deserialized.

use crate::errors::ConfigError;
use crate::utils::durations;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default number of additional attempts after a failed one.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default pause between attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Default location for generated projects.
pub const DEFAULT_OUTPUT_DIR: &str = "./generated_apps";

/// Immutable settings for one workflow run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Topic keyword the whole run is about.
    pub topic: String,
    /// Optional market category narrowing the topic.
    pub category: Option<String>,
    /// Where generated projects are placed.
    pub output_dir: PathBuf,
    /// Retry budget per stage.
    pub max_retries: u32,
    /// Pause between attempts, in seconds when serialized.
    #[serde(with = "durations::secs")]
    pub retry_delay: Duration,
    /// Upper bound for a single attempt. `None` waits indefinitely.
    #[serde(with = "durations::opt_secs")]
    pub stage_timeout: Option<Duration>,
    /// Hand the final report to the storage sink.
    pub save_to_storage: bool,
    /// Hand the final report to the report-publishing sink.
    pub publish_report: bool,
    /// Emit lifecycle events to the engine's event sink.
    pub enable_monitoring: bool,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            topic: String::new(),
            category: None,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            stage_timeout: None,
            save_to_storage: true,
            publish_report: true,
            enable_monitoring: true,
        }
    }
}

impl WorkflowConfig {
    /// Creates a config for a topic with default settings.
    #[must_use]
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            ..Self::default()
        }
    }

    /// Sets the category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Sets the output directory.
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Sets the retry budget.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the delay between attempts.
    #[must_use]
    pub const fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Sets the per-attempt timeout.
    #[must_use]
    pub const fn with_stage_timeout(mut self, timeout: Duration) -> Self {
        self.stage_timeout = Some(timeout);
        self
    }

    /// Enables or disables the storage sink.
    #[must_use]
    pub const fn with_storage(mut self, enabled: bool) -> Self {
        self.save_to_storage = enabled;
        self
    }

    /// Enables or disables the report-publishing sink.
    #[must_use]
    pub const fn with_report_publishing(mut self, enabled: bool) -> Self {
        self.publish_report = enabled;
        self
    }

    /// Enables or disables monitoring events.
    #[must_use]
    pub const fn with_monitoring(mut self, enabled: bool) -> Self {
        self.enable_monitoring = enabled;
        self
    }

    /// Checks the config can drive a run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.topic.trim().is_empty() {
            return Err(ConfigError::EmptyTopic);
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::EmptyOutputDir);
        }
        Ok(())
    }

    /// The category to use when none was discovered upstream.
    #[must_use]
    pub fn category_or_default(&self) -> &str {
        self.category.as_deref().unwrap_or("productivity")
    }

    /// A compact view for reports.
    #[must_use]
    pub fn summary(&self) -> ConfigSummary {
        ConfigSummary {
            topic: self.topic.clone(),
            category: self.category.clone(),
            output_dir: self.output_dir.display().to_string(),
            max_retries: self.max_retries,
            retry_delay_secs: self.retry_delay.as_secs_f64(),
            stage_timeout_secs: self.stage_timeout.map(|t| t.as_secs_f64()),
        }
    }
}

/// The part of the config that is echoed into the final report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigSummary {
    /// Topic keyword.
    pub topic: String,
    /// Category, if any.
    pub category: Option<String>,
    /// Output directory.
    pub output_dir: String,
    /// Retry budget per stage.
    pub max_retries: u32,
    /// Delay between attempts in seconds.
    pub retry_delay_secs: f64,
    /// Per-attempt timeout in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage_timeout_secs: Option<f64>,
}

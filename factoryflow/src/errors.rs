//! Error types for the factoryflow engine.
//!
//! Errors are split by where they are caught:
//! - [`InitError`] when a collaborator cannot be constructed (triggers mock substitution)
//! - [`StageError`] inside the retry loop
//! - [`SinkError`] inside the sink wrappers
//! - [`ConfigError`] before a run starts
//!
//! None of them escape [`crate::pipeline::WorkflowEngine::execute`].

use crate::core::StageId;
use std::time::Duration;
use thiserror::Error;

/// The umbrella error type for factoryflow operations.
#[derive(Debug, Error)]
pub enum FactoryflowError {
    /// The workflow configuration is invalid.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// A collaborator could not be constructed.
    #[error("{0}")]
    Init(#[from] InitError),

    /// A stage failed.
    #[error("{0}")]
    Stage(#[from] StageError),

    /// A sink failed.
    #[error("{0}")]
    Sink(#[from] SinkError),
}

/// Raised when a real collaborator cannot be built, e.g. missing credentials.
#[derive(Debug, Clone, Error)]
#[error("{collaborator} unavailable: {reason}")]
pub struct InitError {
    /// Which collaborator failed to initialize.
    pub collaborator: String,
    /// Why it failed.
    pub reason: String,
}

impl InitError {
    /// Creates a new initialization error.
    #[must_use]
    pub fn new(collaborator: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            collaborator: collaborator.into(),
            reason: reason.into(),
        }
    }

    /// An environment variable the collaborator needs is not set.
    #[must_use]
    pub fn missing_env(collaborator: impl Into<String>, variable: &str) -> Self {
        Self::new(collaborator, format!("environment variable {variable} is not set"))
    }

    /// No implementation was supplied to the engine builder.
    #[must_use]
    pub fn not_provided(collaborator: impl Into<String>) -> Self {
        Self::new(collaborator, "no implementation provided")
    }
}

/// Errors raised by a stage executor during one attempt.
#[derive(Debug, Error)]
pub enum StageError {
    /// The collaborator call failed.
    #[error("{capability} call failed: {source}")]
    Capability {
        /// Name of the capability that failed.
        capability: &'static str,
        /// The underlying failure reported by the collaborator.
        #[source]
        source: anyhow::Error,
    },

    /// Upstream output did not contain what this stage needs.
    #[error("{stage} input missing: {key}")]
    MissingInput {
        /// The stage that needed the input.
        stage: StageId,
        /// The missing key or pointer.
        key: String,
    },

    /// The attempt exceeded the per-stage timeout.
    #[error("attempt timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// The run was cancelled.
    #[error("cancelled: {0}")]
    Cancelled(String),

    /// An internal invariant was violated.
    #[error("internal error: {0}")]
    Internal(String),
}

impl StageError {
    /// Wraps a collaborator failure.
    pub fn capability(capability: &'static str, source: impl Into<anyhow::Error>) -> Self {
        Self::Capability {
            capability,
            source: source.into(),
        }
    }

    /// Creates a missing-input error.
    #[must_use]
    pub fn missing_input(stage: StageId, key: impl Into<String>) -> Self {
        Self::MissingInput {
            stage,
            key: key.into(),
        }
    }

    /// Returns true if another attempt may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        !matches!(self, Self::Cancelled(_))
    }
}

/// Errors raised by storage and report sinks.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The sink is missing required settings.
    #[error("sink not configured: {0}")]
    NotConfigured(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Transport-level HTTP failure.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The remote service answered with a non-success status.
    #[error("{sink} rejected the request with status {status}: {body}")]
    Rejected {
        /// Name of the sink.
        sink: &'static str,
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnosis.
        body: String,
    },
}

#[cfg(feature = "remote-sinks")]
impl From<reqwest::Error> for SinkError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.to_string())
    }
}

/// Errors raised when validating a [`crate::config::WorkflowConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The topic keyword is empty or whitespace.
    #[error("workflow topic must not be empty")]
    EmptyTopic,

    /// The output location is empty.
    #[error("workflow output directory must not be empty")]
    EmptyOutputDir,
}

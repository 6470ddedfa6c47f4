//! Stage executors and the stage registry.
//!
//! A stage executor is a hand-off function: it sees the workflow config and
//! the output of the stage immediately before it, and nothing else.

mod executors;
mod registry;
mod result;

pub use executors::{
    DeploymentConfigStage, DesignSystemStage, PrototypeBuildStage, ReportingStage,
    TrendCollectionStage, UxAnalysisStage,
};
pub use registry::{RegisteredStage, StageRegistry};
pub use result::StageResult;

use crate::cancellation::CancellationToken;
use crate::config::WorkflowConfig;
use crate::core::{StageData, StageId};
use crate::errors::StageError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt::Debug;
use std::time::Duration;

/// Everything an executor may read during one attempt.
#[derive(Debug, Clone, Copy)]
pub struct StageInput<'a> {
    /// The stage being executed.
    pub stage: StageId,
    /// Identifier of the run.
    pub run_id: &'a str,
    /// The run's immutable config.
    pub config: &'a WorkflowConfig,
    /// Output of the immediately preceding stage. `None` for the first stage.
    pub previous: Option<&'a StageData>,
    /// Wall-clock start of the run.
    pub run_started_at: DateTime<Utc>,
    /// Time elapsed in the run when this stage was reached.
    pub elapsed: Duration,
    /// Cancellation signal for the run.
    pub cancel: &'a CancellationToken,
}

impl<'a> StageInput<'a> {
    /// Returns the previous stage's output or a missing-input error.
    pub fn require_previous(&self) -> Result<&'a StageData, StageError> {
        self.previous.ok_or_else(|| {
            let upstream = self
                .stage
                .previous()
                .map_or("workflow config", |stage| stage.as_str());
            StageError::missing_input(self.stage, format!("{upstream} output"))
        })
    }
}

/// Trait for pipeline stage executors.
#[async_trait]
pub trait StageExecutor: Send + Sync + Debug {
    /// Runs one attempt of the stage.
    async fn execute(&self, input: &StageInput<'_>) -> Result<StageData, StageError>;
}

/// A simple function-based executor.
pub struct FnExecutor<F>
where
    F: Fn(&StageInput<'_>) -> Result<StageData, StageError> + Send + Sync,
{
    name: String,
    func: F,
}

impl<F> FnExecutor<F>
where
    F: Fn(&StageInput<'_>) -> Result<StageData, StageError> + Send + Sync,
{
    /// Creates a new function-based executor.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Debug for FnExecutor<F>
where
    F: Fn(&StageInput<'_>) -> Result<StageData, StageError> + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnExecutor").field("name", &self.name).finish()
    }
}

#[async_trait]
impl<F> StageExecutor for FnExecutor<F>
where
    F: Fn(&StageInput<'_>) -> Result<StageData, StageError> + Send + Sync,
{
    async fn execute(&self, input: &StageInput<'_>) -> Result<StageData, StageError> {
        (self.func)(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_fn_executor() {
        let executor = FnExecutor::new("echo", |input: &StageInput<'_>| {
            Ok(StageData::new().with("topic", json!(input.config.topic)))
        });
        let config = WorkflowConfig::new("focus");
        let cancel = CancellationToken::new();
        let input = StageInput {
            stage: StageId::TrendCollection,
            run_id: "run",
            config: &config,
            previous: None,
            run_started_at: Utc::now(),
            elapsed: Duration::ZERO,
            cancel: &cancel,
        };

        let output = executor.execute(&input).await.unwrap();
        assert_eq!(output.get("topic"), Some(&json!("focus")));
    }

    #[test]
    fn test_require_previous_names_upstream() {
        let config = WorkflowConfig::new("focus");
        let cancel = CancellationToken::new();
        let input = StageInput {
            stage: StageId::DesignSystem,
            run_id: "run",
            config: &config,
            previous: None,
            run_started_at: Utc::now(),
            elapsed: Duration::ZERO,
            cancel: &cancel,
        };

        let err = input.require_previous().unwrap_err();
        assert_eq!(
            err.to_string(),
            "design_system input missing: ux_analysis output"
        );
    }
}

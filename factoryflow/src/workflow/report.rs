//! The finalized, serializable report of a run.

use crate::capabilities::{CollaboratorKind, CollaboratorMode};
use crate::config::ConfigSummary;
use crate::core::{OverallStatus, StageData, StageId, StageStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Outcome of one stage as it appears in the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageReport {
    /// The stage.
    pub stage: StageId,
    /// Terminal status.
    pub status: StageStatus,
    /// When the first attempt was scheduled.
    pub started_at: DateTime<Utc>,
    /// When the stage reached its terminal state.
    pub ended_at: Option<DateTime<Utc>>,
    /// Across all attempts and retry delays.
    pub duration_secs: f64,
    /// Retries performed.
    pub retry_count: u32,
    /// Final error message, if the stage failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// One human-readable line derived from the stage output.
    pub summary: String,
}

/// Timing and success figures for a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Wall time of the whole run.
    pub total_duration_secs: f64,
    /// Total duration divided by the number of declared stages.
    pub average_stage_duration_secs: f64,
    /// Completed stages divided by declared stages.
    pub success_rate: f64,
    /// Stages that completed.
    pub completed_stages: usize,
    /// Stages in the workflow.
    pub declared_stages: usize,
    /// e.g. `"12.34 seconds"`
    pub total_time: String,
    /// Formatted average stage duration.
    pub average_stage_time: String,
    /// e.g. `"83.3%"`
    pub success_rate_display: String,
}

/// The report returned by every `execute` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowReport {
    /// Run identifier.
    pub run_id: String,
    /// The config the run used.
    pub config: ConfigSummary,
    /// Degree of success.
    pub status: OverallStatus,
    /// Wall-clock start.
    pub started_at: DateTime<Utc>,
    /// Wall-clock end.
    pub ended_at: DateTime<Utc>,
    /// `"k/n"` completed over declared.
    pub successful_stages: String,
    /// Stages that were reached, in execution order.
    pub stages: Vec<StageReport>,
    /// Output of every completed stage.
    pub generated_outputs: BTreeMap<StageId, StageData>,
    /// Timing and success figures.
    pub metrics: PerformanceMetrics,
    /// Suggested follow-up actions.
    pub next_steps: Vec<String>,
    /// Whether each collaborator ran for real or as a mock.
    pub collaborators: BTreeMap<CollaboratorKind, CollaboratorMode>,
    /// Why the run stopped before its last stage, e.g. `cancelled: shutdown`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub halted: Option<String>,
}

impl WorkflowReport {
    /// Looks up the report line for a stage.
    #[must_use]
    pub fn stage(&self, id: StageId) -> Option<&StageReport> {
        self.stages.iter().find(|stage| stage.stage == id)
    }

    /// Output of a completed stage.
    #[must_use]
    pub fn output(&self, id: StageId) -> Option<&StageData> {
        self.generated_outputs.get(&id)
    }

    /// Completed stages divided by declared stages.
    #[must_use]
    pub const fn success_rate(&self) -> f64 {
        self.metrics.success_rate
    }

    /// Returns true if every declared stage completed.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == OverallStatus::Completed
    }

    /// Whether any collaborator ran as a mock.
    #[must_use]
    pub fn used_mocks(&self) -> bool {
        self.collaborators
            .values()
            .any(|mode| *mode == CollaboratorMode::Mock)
    }

    /// Stage name and status pairs, in execution order.
    #[must_use]
    pub fn stage_statuses(&self) -> Vec<(StageId, StageStatus)> {
        self.stages
            .iter()
            .map(|stage| (stage.stage, stage.status))
            .collect()
    }
}
